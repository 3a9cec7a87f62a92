use std::sync::Arc;

use uuid::Uuid;

use cupid_db::Database;
use cupid_types::models::Profile;

use crate::error::CoreError;
use crate::services::blocking;

pub const DEFAULT_CANDIDATE_LIMIT: u32 = 10;
pub const MAX_CANDIDATE_LIMIT: u32 = 50;

/// Builds the swipe feed. Read-only; a short feed is not an error.
pub struct CandidateSelector {
    db: Arc<Database>,
}

impl CandidateSelector {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Verified, complete profiles other than the viewer's that the viewer
    /// has not swiped on, in a stable order. `limit` is capped at
    /// `MAX_CANDIDATE_LIMIT`. The viewer must be active itself.
    pub async fn get_candidates(&self, viewer: Uuid, limit: u32) -> Result<Vec<Profile>, CoreError> {
        match blocking(&self.db, move |db| db.is_active(viewer)).await? {
            None => return Err(CoreError::AccountNotFound),
            Some(false) => return Err(CoreError::NotActivated),
            Some(true) => {}
        }

        let limit = limit.min(MAX_CANDIDATE_LIMIT);
        if limit == 0 {
            return Ok(Vec::new());
        }
        blocking(&self.db, move |db| db.candidates(viewer, limit)).await
    }
}
