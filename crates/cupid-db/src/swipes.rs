use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{TransactionBehavior, params};
use tracing::{debug, info};
use uuid::Uuid;

use cupid_types::models::{MatchPair, SwipeDecision};

use crate::Database;
use crate::models::{MatchRow, SwipeRow, encode_ts, get_decision, get_ts, get_uuid, match_from_row};
use crate::queries::OptionalExt;

/// Result of one swipe insert + match check.
#[derive(Debug)]
pub enum SwipeOutcome {
    /// The swiper is not verified with a complete profile; nothing was written.
    Inactive,
    /// The swiped account does not exist or is not in anyone's feed; nothing
    /// was written.
    UnknownTarget,
    /// A swipe for this (swiper, swiped) pair already exists; nothing was written.
    Duplicate,
    /// The swipe was stored. `new_match` is set when it completed a mutual like.
    Recorded { new_match: Option<MatchRow> },
}

impl Database {
    /// Insert a swipe and, for a like, create the pair's match if the other
    /// side already liked back. Runs as one IMMEDIATE transaction: the swipe
    /// insert, reciprocal lookup and match insert commit or roll back
    /// together. The match insert is keyed on the canonical pair, so two
    /// racing reciprocal likes end with exactly one match row.
    pub fn record_swipe(
        &self,
        swiper: Uuid,
        swiped: Uuid,
        decision: SwipeDecision,
        now: DateTime<Utc>,
    ) -> Result<SwipeOutcome> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let swiper_key = swiper.to_string();
            let swiped_key = swiped.to_string();
            let now = encode_ts(now);

            let swiper_active: Option<bool> = tx
                .query_row(
                    "SELECT verified = 1 AND profile_complete = 1 FROM accounts WHERE id = ?1",
                    [&swiper_key],
                    |row| row.get(0),
                )
                .optional()?;
            if swiper_active != Some(true) {
                debug!("Swipe from inactive account {}", swiper);
                return Ok(SwipeOutcome::Inactive);
            }

            // Same eligibility the candidate feed applies
            let target_eligible: bool = tx.query_row(
                "SELECT EXISTS(
                    SELECT 1 FROM accounts
                    WHERE id = ?1 AND verified = 1 AND profile_complete = 1
                 )",
                [&swiped_key],
                |row| row.get(0),
            )?;
            if !target_eligible {
                return Ok(SwipeOutcome::UnknownTarget);
            }

            let inserted = tx.execute(
                "INSERT INTO swipes (swiper_id, swiped_id, decision, created_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(swiper_id, swiped_id) DO NOTHING",
                params![swiper_key, swiped_key, decision.as_str(), now],
            )?;
            if inserted == 0 {
                debug!("Duplicate swipe {} -> {}", swiper, swiped);
                return Ok(SwipeOutcome::Duplicate);
            }

            if decision == SwipeDecision::Pass {
                tx.commit()?;
                return Ok(SwipeOutcome::Recorded { new_match: None });
            }

            let liked_back: bool = tx.query_row(
                "SELECT EXISTS(
                    SELECT 1 FROM swipes
                    WHERE swiper_id = ?1 AND swiped_id = ?2 AND decision = 'like'
                 )",
                params![swiped_key, swiper_key],
                |row| row.get(0),
            )?;
            if !liked_back {
                tx.commit()?;
                return Ok(SwipeOutcome::Recorded { new_match: None });
            }

            let pair = MatchPair::canonical(swiper, swiped);
            let (a, b) = (pair.a.to_string(), pair.b.to_string());
            tx.execute(
                "INSERT INTO matches (id, account_a_id, account_b_id, created_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(account_a_id, account_b_id) DO NOTHING",
                params![Uuid::new_v4().to_string(), a, b, now],
            )?;

            // Read back whichever row owns the pair key
            let row = tx.query_row(
                "SELECT id, account_a_id, account_b_id, created_at FROM matches
                 WHERE account_a_id = ?1 AND account_b_id = ?2",
                params![a, b],
                match_from_row,
            )?;
            tx.commit()?;

            info!("Match {} created for {} <-> {}", row.id, pair.a, pair.b);
            Ok(SwipeOutcome::Recorded {
                new_match: Some(row),
            })
        })
    }

    pub fn get_swipe(&self, swiper: Uuid, swiped: Uuid) -> Result<Option<SwipeRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT swiper_id, swiped_id, decision, created_at FROM swipes
                     WHERE swiper_id = ?1 AND swiped_id = ?2",
                    params![swiper.to_string(), swiped.to_string()],
                    |row| {
                        Ok(SwipeRow {
                            swiper_id: get_uuid(row, 0)?,
                            swiped_id: get_uuid(row, 1)?,
                            decision: get_decision(row, 2)?,
                            created_at: get_ts(row, 3)?,
                        })
                    },
                )
                .optional()?;
            Ok(row)
        })
    }

    /// Number of swipe rows stored for an ordered (swiper, swiped) pair.
    pub fn swipe_count(&self, swiper: Uuid, swiped: Uuid) -> Result<u32> {
        self.with_conn(|conn| {
            let n = conn.query_row(
                "SELECT COUNT(*) FROM swipes WHERE swiper_id = ?1 AND swiped_id = ?2",
                params![swiper.to_string(), swiped.to_string()],
                |row| row.get(0),
            )?;
            Ok(n)
        })
    }

    /// Number of match rows for an unordered pair.
    pub fn match_count(&self, x: Uuid, y: Uuid) -> Result<u32> {
        let pair = MatchPair::canonical(x, y);
        self.with_conn(|conn| {
            let n = conn.query_row(
                "SELECT COUNT(*) FROM matches WHERE account_a_id = ?1 AND account_b_id = ?2",
                params![pair.a.to_string(), pair.b.to_string()],
                |row| row.get(0),
            )?;
            Ok(n)
        })
    }
}
