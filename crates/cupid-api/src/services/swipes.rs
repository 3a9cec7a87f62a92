use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use cupid_db::{Database, SwipeOutcome};
use cupid_types::api::{MatchPartner, MatchSummary};
use cupid_types::events::GatewayEvent;
use cupid_types::models::{Match, SwipeDecision};

use crate::error::CoreError;
use crate::notify::{Notifier, publish_logged};
use crate::services::blocking;

#[derive(Debug)]
pub struct SwipeResult {
    pub matched: bool,
    pub new_match: Option<Match>,
}

/// Records swipes and detects mutual likes.
pub struct SwipeRecorder {
    db: Arc<Database>,
    notifier: Arc<dyn Notifier>,
}

impl SwipeRecorder {
    pub fn new(db: Arc<Database>, notifier: Arc<dyn Notifier>) -> Self {
        Self { db, notifier }
    }

    pub async fn record_swipe(
        &self,
        swiper: Uuid,
        swiped: Uuid,
        decision: SwipeDecision,
    ) -> Result<SwipeResult, CoreError> {
        if swiper == swiped {
            return Err(CoreError::SelfSwipe);
        }

        let outcome = blocking(&self.db, move |db| {
            db.record_swipe(swiper, swiped, decision, Utc::now())
        })
        .await?;

        let new_match = match outcome {
            SwipeOutcome::Inactive => return Err(CoreError::NotActivated),
            SwipeOutcome::UnknownTarget => return Err(CoreError::AccountNotFound),
            SwipeOutcome::Duplicate => return Err(CoreError::DuplicateSwipe),
            SwipeOutcome::Recorded { new_match } => new_match.map(Match::from),
        };

        if let Some(m) = &new_match {
            info!("{} and {} matched ({})", swiper, swiped, m.id);
            for account in m.participants() {
                let Some(partner_id) = m.other(account) else {
                    continue;
                };
                let event = GatewayEvent::MatchCreate {
                    match_id: m.id,
                    partner_id,
                    created_at: m.created_at,
                };
                publish_logged(self.notifier.as_ref(), account, event).await;
            }
        }

        Ok(SwipeResult {
            matched: new_match.is_some(),
            new_match,
        })
    }

    /// The account's matches, newest first, each with the partner's card.
    pub async fn list_matches(&self, account_id: Uuid) -> Result<Vec<MatchSummary>, CoreError> {
        blocking(&self.db, move |db| {
            let mut summaries = Vec::new();
            for row in db.matches_for(account_id)? {
                let m = Match::from(row);
                let Some(partner_id) = m.other(account_id) else {
                    continue;
                };
                let Some(profile) = db.get_profile(partner_id)? else {
                    continue;
                };
                summaries.push(MatchSummary {
                    id: m.id,
                    partner: MatchPartner {
                        id: partner_id,
                        name: profile.full_name.clone(),
                        age: profile.age,
                        course: profile.course.clone(),
                        primary_photo: profile.primary_photo().map(|p| p.url.clone()),
                    },
                    created_at: m.created_at,
                });
            }
            Ok(summaries)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{RecordingNotifier, account, db, eligible_account, set_flags};

    fn recorder(db: &Arc<Database>) -> (SwipeRecorder, Arc<RecordingNotifier>) {
        let notifier = Arc::new(RecordingNotifier::default());
        (SwipeRecorder::new(db.clone(), notifier.clone()), notifier)
    }

    #[tokio::test]
    async fn mutual_like_creates_one_match_and_notifies_both() {
        let db = db();
        let a = eligible_account(&db, "a@uni.edu");
        let b = eligible_account(&db, "b@uni.edu");
        let (rec, notifier) = recorder(&db);

        let first = rec.record_swipe(a, b, SwipeDecision::Like).await.unwrap();
        assert!(!first.matched);
        assert!(first.new_match.is_none());

        let second = rec.record_swipe(b, a, SwipeDecision::Like).await.unwrap();
        assert!(second.matched);
        let m = second.new_match.unwrap();
        assert!(m.involves(a) && m.involves(b));
        assert!(m.account_a_id < m.account_b_id);
        assert_eq!(db.match_count(a, b).unwrap(), 1);

        let to_a = notifier.events_for(a);
        let to_b = notifier.events_for(b);
        assert_eq!(to_a.len(), 1);
        assert_eq!(to_b.len(), 1);
        assert!(matches!(
            &to_a[0],
            GatewayEvent::MatchCreate { partner_id, .. } if *partner_id == b
        ));
        assert_eq!(to_b[0].match_id(), Some(m.id));
    }

    #[tokio::test]
    async fn pass_never_matches() {
        let db = db();
        let a = eligible_account(&db, "a@uni.edu");
        let b = eligible_account(&db, "b@uni.edu");
        let (rec, notifier) = recorder(&db);

        rec.record_swipe(a, b, SwipeDecision::Like).await.unwrap();
        let out = rec.record_swipe(b, a, SwipeDecision::Pass).await.unwrap();
        assert!(!out.matched);
        assert_eq!(db.match_count(a, b).unwrap(), 0);
        assert!(notifier.events.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejects_self_unknown_and_duplicate() {
        let db = db();
        let a = eligible_account(&db, "a@uni.edu");
        let b = eligible_account(&db, "b@uni.edu");
        let (rec, _) = recorder(&db);

        let err = rec.record_swipe(a, a, SwipeDecision::Like).await.unwrap_err();
        assert!(matches!(err, CoreError::SelfSwipe));

        let err = rec
            .record_swipe(a, Uuid::new_v4(), SwipeDecision::Like)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::AccountNotFound));

        rec.record_swipe(a, b, SwipeDecision::Pass).await.unwrap();
        let err = rec.record_swipe(a, b, SwipeDecision::Like).await.unwrap_err();
        assert!(matches!(err, CoreError::DuplicateSwipe));

        // First decision stands
        let stored = db.get_swipe(a, b).unwrap().unwrap();
        assert_eq!(stored.decision, SwipeDecision::Pass);
        assert_eq!(db.swipe_count(a, b).unwrap(), 1);
    }

    #[tokio::test]
    async fn list_matches_shows_partner_card() {
        let db = db();
        let a = eligible_account(&db, "a@uni.edu");
        let b = eligible_account(&db, "b@uni.edu");
        let c = eligible_account(&db, "c@uni.edu");
        let (rec, _) = recorder(&db);

        rec.record_swipe(a, b, SwipeDecision::Like).await.unwrap();
        rec.record_swipe(b, a, SwipeDecision::Like).await.unwrap();
        rec.record_swipe(c, a, SwipeDecision::Like).await.unwrap();

        let for_a = rec.list_matches(a).await.unwrap();
        assert_eq!(for_a.len(), 1);
        assert_eq!(for_a[0].partner.id, b);
        assert_eq!(for_a[0].partner.name, "Test User");

        assert!(rec.list_matches(c).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unverified_account_cannot_swipe_or_match() {
        let db = db();
        let ghost = account(&db, "ghost@uni.edu");
        let b = eligible_account(&db, "b@uni.edu");
        let (rec, notifier) = recorder(&db);

        let err = rec.record_swipe(ghost, b, SwipeDecision::Like).await.unwrap_err();
        assert!(matches!(err, CoreError::NotActivated));

        // Verified but still setting up the profile
        set_flags(&db, ghost, true, false);
        let err = rec.record_swipe(ghost, b, SwipeDecision::Like).await.unwrap_err();
        assert!(matches!(err, CoreError::NotActivated));

        let err = rec.record_swipe(b, ghost, SwipeDecision::Like).await.unwrap_err();
        assert!(matches!(err, CoreError::AccountNotFound));

        assert_eq!(db.swipe_count(ghost, b).unwrap(), 0);
        assert_eq!(db.swipe_count(b, ghost).unwrap(), 0);
        assert_eq!(db.match_count(ghost, b).unwrap(), 0);
        assert!(notifier.events.lock().unwrap().is_empty());
    }
}
