use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{TransactionBehavior, params};
use uuid::Uuid;

use crate::Database;
use crate::models::{PendingVerificationRow, encode_ts, get_ts, get_uuid};
use crate::queries::OptionalExt;

/// Result of checking a submitted code against an account's pending slot.
#[derive(Debug, PartialEq, Eq)]
pub enum VerifyOutcome {
    /// No code is stored for the account (never issued, or already consumed).
    NoPending,
    /// The stored code is past `expires_at`; the slot was cleared.
    Expired,
    /// Wrong code. `attempts` is the failure count after this attempt.
    Mismatch { attempts: u32 },
    /// Wrong code and the failure limit was reached; the slot was cleared.
    Exhausted,
    /// Code accepted: the slot was cleared and the account marked verified.
    Verified,
}

impl Database {
    /// Store a code for the account, replacing any earlier one. A single
    /// upsert, so concurrent requests never leave a code paired with another
    /// request's expiry.
    pub fn upsert_pending_verification(
        &self,
        account_id: Uuid,
        otp_code: &str,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO pending_verifications (account_id, otp_code, attempts, issued_at, expires_at)
                 VALUES (?1, ?2, 0, ?3, ?4)
                 ON CONFLICT(account_id) DO UPDATE SET
                    otp_code = excluded.otp_code,
                    attempts = 0,
                    issued_at = excluded.issued_at,
                    expires_at = excluded.expires_at",
                params![
                    account_id.to_string(),
                    otp_code,
                    encode_ts(issued_at),
                    encode_ts(expires_at)
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_pending_verification(
        &self,
        account_id: Uuid,
    ) -> Result<Option<PendingVerificationRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT account_id, otp_code, attempts, issued_at, expires_at
                     FROM pending_verifications WHERE account_id = ?1",
                    [account_id.to_string()],
                    |row| {
                        Ok(PendingVerificationRow {
                            account_id: get_uuid(row, 0)?,
                            otp_code: row.get(1)?,
                            attempts: row.get(2)?,
                            issued_at: get_ts(row, 3)?,
                            expires_at: get_ts(row, 4)?,
                        })
                    },
                )
                .optional()?;
            Ok(row)
        })
    }

    /// Check and consume the pending code in one transaction. `code_matches`
    /// receives the stored code and decides equality, so the comparison
    /// policy stays with the caller. A code is accepted at most once.
    pub fn verify_pending_code<F>(
        &self,
        account_id: Uuid,
        now: DateTime<Utc>,
        max_attempts: u32,
        code_matches: F,
    ) -> Result<VerifyOutcome>
    where
        F: FnOnce(&str) -> bool,
    {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let key = account_id.to_string();

            let pending = tx
                .query_row(
                    "SELECT otp_code, attempts, expires_at FROM pending_verifications
                     WHERE account_id = ?1",
                    [&key],
                    |row| Ok((row.get::<_, String>(0)?, row.get::<_, u32>(1)?, get_ts(row, 2)?)),
                )
                .optional()?;

            let Some((stored, attempts, expires_at)) = pending else {
                return Ok(VerifyOutcome::NoPending);
            };

            if now > expires_at {
                tx.execute("DELETE FROM pending_verifications WHERE account_id = ?1", [&key])?;
                tx.commit()?;
                return Ok(VerifyOutcome::Expired);
            }

            if !code_matches(&stored) {
                let attempts = attempts + 1;
                let outcome = if attempts >= max_attempts {
                    tx.execute("DELETE FROM pending_verifications WHERE account_id = ?1", [&key])?;
                    VerifyOutcome::Exhausted
                } else {
                    tx.execute(
                        "UPDATE pending_verifications SET attempts = ?2 WHERE account_id = ?1",
                        params![key, attempts],
                    )?;
                    VerifyOutcome::Mismatch { attempts }
                };
                tx.commit()?;
                return Ok(outcome);
            }

            tx.execute("DELETE FROM pending_verifications WHERE account_id = ?1", [&key])?;
            tx.execute("UPDATE accounts SET verified = 1 WHERE id = ?1", [&key])?;
            tx.commit()?;
            Ok(VerifyOutcome::Verified)
        })
    }
}
