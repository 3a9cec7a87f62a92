pub mod accounts;
pub mod candidates;
pub mod chat;
pub mod otp;
pub mod profiles;
pub mod swipes;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use anyhow::anyhow;
use tracing::error;

use cupid_db::Database;

use crate::error::CoreError;

/// Run a blocking DB closure off the async runtime.
pub(crate) async fn blocking<F, T>(db: &Arc<Database>, f: F) -> Result<T, CoreError>
where
    F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let db = db.clone();
    tokio::task::spawn_blocking(move || f(&db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            CoreError::Internal(anyhow!("blocking task failed: {e}"))
        })?
        .map_err(CoreError::Internal)
}
