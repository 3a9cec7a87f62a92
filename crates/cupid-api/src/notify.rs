//! Real-time notification collaborator. The core only publishes; the
//! gateway owns subscriber lifecycles.

use async_trait::async_trait;
use tracing::{debug, warn};
use uuid::Uuid;

use cupid_gateway::dispatcher::Dispatcher;
use cupid_types::events::GatewayEvent;

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver an event to one account's live connections, if any.
    async fn publish(&self, account_id: Uuid, event: GatewayEvent) -> anyhow::Result<()>;
}

#[async_trait]
impl Notifier for Dispatcher {
    async fn publish(&self, account_id: Uuid, event: GatewayEvent) -> anyhow::Result<()> {
        if !self.send_to_account(account_id, event).await {
            // Offline accounts catch up through history / list_matches
            debug!("{} offline, event not delivered live", account_id);
        }
        Ok(())
    }
}

/// Publish after a committed write. Failures are logged, not returned: the
/// stored row is the source of truth and clients re-read it.
pub(crate) async fn publish_logged(notifier: &dyn Notifier, account_id: Uuid, event: GatewayEvent) {
    if let Err(e) = notifier.publish(account_id, event).await {
        warn!("Notification to {} failed: {:#}", account_id, e);
    }
}
