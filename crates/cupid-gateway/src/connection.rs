use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{Sink, SinkExt, StreamExt};
use jsonwebtoken::{DecodingKey, Validation, decode};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use cupid_types::api::Claims;
use cupid_types::events::{GatewayCommand, GatewayEvent};

use crate::dispatcher::Dispatcher;

/// Heartbeat interval: server sends a Ping every 15 seconds.
/// If 2 consecutive Pongs are missed (~30s), the connection is dropped.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);

/// Time a fresh socket gets to send `Identify`.
const IDENTIFY_TIMEOUT: Duration = Duration::from_secs(10);

/// Handle a single WebSocket connection: Identify handshake, Ready, then
/// relay events addressed to the account until either side goes away.
pub async fn handle_connection(socket: WebSocket, dispatcher: Dispatcher, jwt_secret: String) {
    let (mut sender, mut receiver) = socket.split();

    let account_id = match wait_for_identify(&mut receiver, &jwt_secret).await {
        Some(id) => id,
        None => {
            warn!("WebSocket client failed to identify, closing");
            return;
        }
    };

    info!("{} connected to gateway", account_id);

    let Some((conn_id, mut account_rx)) = start_session(&mut sender, &dispatcher, account_id).await
    else {
        return;
    };

    let pong_received = Arc::new(AtomicBool::new(true));
    let pong_flag_send = pong_received.clone();
    let pong_flag_recv = pong_received.clone();

    // Forward targeted events -> client, with heartbeat
    let mut send_task = tokio::spawn(async move {
        let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
        heartbeat.tick().await;
        let mut missed_heartbeats: u8 = 0;

        loop {
            tokio::select! {
                event = account_rx.recv() => {
                    let Some(event) = event else { break };
                    if send_event(&mut sender, &event).await.is_err() {
                        break;
                    }
                }
                _ = heartbeat.tick() => {
                    if pong_flag_send.swap(false, Ordering::Acquire) {
                        missed_heartbeats = 0;
                    } else {
                        missed_heartbeats += 1;
                        if missed_heartbeats >= 2 {
                            warn!("Heartbeat timeout (missed {} pongs), dropping connection", missed_heartbeats);
                            break;
                        }
                    }
                    if sender.send(Message::Ping(Vec::new().into())).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    // The client only talks to us for pongs and close frames after Identify
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Pong(_) => {
                    pong_flag_recv.store(true, Ordering::Release);
                }
                Message::Text(text) => {
                    warn!(
                        "{} sent unexpected text frame ({} bytes)",
                        account_id,
                        text.len()
                    );
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    dispatcher.unregister(account_id, conn_id).await;
    info!("{} disconnected from gateway", account_id);
}

/// Register the account with the dispatcher, then announce `Ready`.
/// Registration comes first so no event published after the client sees
/// `Ready` is lost. Returns `None`, unregistered again, if `Ready` cannot be
/// sent.
async fn start_session<S>(
    sender: &mut S,
    dispatcher: &Dispatcher,
    account_id: Uuid,
) -> Option<(Uuid, mpsc::UnboundedReceiver<GatewayEvent>)>
where
    S: Sink<Message> + Unpin,
{
    let (conn_id, account_rx) = dispatcher.register(account_id).await;

    if send_event(sender, &GatewayEvent::Ready { account_id }).await.is_err() {
        dispatcher.unregister(account_id, conn_id).await;
        return None;
    }
    Some((conn_id, account_rx))
}

async fn send_event<S>(sender: &mut S, event: &GatewayEvent) -> Result<(), ()>
where
    S: Sink<Message> + Unpin,
{
    let text = match serde_json::to_string(event) {
        Ok(text) => text,
        Err(e) => {
            warn!("Failed to encode gateway event: {}", e);
            return Ok(());
        }
    };
    sender.send(Message::Text(text.into())).await.map_err(|_| ())
}

async fn wait_for_identify(
    receiver: &mut futures_util::stream::SplitStream<WebSocket>,
    jwt_secret: &str,
) -> Option<Uuid> {
    let identify = async {
        while let Some(Ok(msg)) = receiver.next().await {
            if let Message::Text(text) = msg {
                if let Ok(GatewayCommand::Identify { token }) =
                    serde_json::from_str::<GatewayCommand>(&text)
                {
                    return account_from_token(&token, jwt_secret);
                }
            }
        }
        None
    };

    tokio::time::timeout(IDENTIFY_TIMEOUT, identify)
        .await
        .ok()
        .flatten()
}

/// Validate a session token and return the account it was issued for.
pub fn account_from_token(token: &str, jwt_secret: &str) -> Option<Uuid> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .ok()
    .map(|data| data.claims.sub)
}
