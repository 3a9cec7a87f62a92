use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{RwLock, mpsc};
use uuid::Uuid;

use cupid_types::events::GatewayEvent;

/// Routes gateway events to connected accounts. Each account has at most
/// one live connection; a newer connection replaces the older one.
#[derive(Clone, Default)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

#[derive(Default)]
struct DispatcherInner {
    /// Per-account targeted send channels: account_id -> (conn_id, sender)
    account_channels: RwLock<HashMap<Uuid, (Uuid, mpsc::UnboundedSender<GatewayEvent>)>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a per-account channel. Returns (conn_id, receiver).
    pub async fn register(&self, account_id: Uuid) -> (Uuid, mpsc::UnboundedReceiver<GatewayEvent>) {
        let conn_id = Uuid::new_v4();
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner
            .account_channels
            .write()
            .await
            .insert(account_id, (conn_id, tx));
        (conn_id, rx)
    }

    /// Unregister a per-account channel, but only if conn_id matches.
    pub async fn unregister(&self, account_id: Uuid, conn_id: Uuid) {
        let mut channels = self.inner.account_channels.write().await;
        if let Some((stored_conn_id, _)) = channels.get(&account_id) {
            if *stored_conn_id == conn_id {
                channels.remove(&account_id);
            }
        }
    }

    /// Send an event to one account. Returns `false` when the account has no
    /// live connection; the event is then dropped.
    pub async fn send_to_account(&self, account_id: Uuid, event: GatewayEvent) -> bool {
        let channels = self.inner.account_channels.read().await;
        match channels.get(&account_id) {
            Some((_, tx)) => tx.send(event).is_ok(),
            None => false,
        }
    }

    pub async fn is_online(&self, account_id: Uuid) -> bool {
        self.inner
            .account_channels
            .read()
            .await
            .contains_key(&account_id)
    }
}
