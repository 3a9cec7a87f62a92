//! One-time-code email verification.
//!
//! Each account owns one pending slot. `request_code` always generates a
//! fresh code and overwrites the slot, including after a failed delivery.
//! `verify_code` consumes the slot on success, on expiry, and after
//! `MAX_OTP_ATTEMPTS` mismatches.

use std::sync::Arc;

use chrono::{Duration, Utc};
use rand::Rng;
use subtle::ConstantTimeEq;
use tracing::{info, warn};
use uuid::Uuid;

use cupid_db::{Database, VerifyOutcome};

use crate::config::{EmailDomain, MAX_OTP_ATTEMPTS, OTP_LENGTH, normalize_email};
use crate::email::{Mailer, verification_email};
use crate::error::CoreError;
use crate::services::blocking;

pub struct OtpVerifier {
    db: Arc<Database>,
    mailer: Arc<dyn Mailer>,
    domain: EmailDomain,
    ttl: Duration,
}

impl OtpVerifier {
    pub fn new(db: Arc<Database>, mailer: Arc<dyn Mailer>, domain: EmailDomain, ttl: Duration) -> Self {
        Self {
            db,
            mailer,
            domain,
            ttl,
        }
    }

    pub async fn request_code(&self, email: &str) -> Result<(), CoreError> {
        let email = normalize_email(email);
        if !self.domain.admits(&email) {
            return Err(CoreError::InvalidDomain);
        }

        let account = blocking(&self.db, move |db| db.get_account_by_email(&email))
            .await?
            .ok_or(CoreError::AccountNotFound)?;

        let code = generate_code();
        let issued_at = Utc::now();
        let expires_at = issued_at + self.ttl;
        let account_id = account.id;
        let stored = code.clone();
        blocking(&self.db, move |db| {
            db.upsert_pending_verification(account_id, &stored, issued_at, expires_at)
        })
        .await?;

        let (subject, body) = verification_email(&code, self.ttl.num_minutes());
        self.mailer
            .send(&account.email, &subject, &body)
            .await
            .map_err(|e| {
                warn!("Verification email to {} failed: {}", account.id, e);
                CoreError::DeliveryFailed(e.to_string())
            })?;

        info!("Verification code issued for {}", account.id);
        Ok(())
    }

    pub async fn verify_code(&self, account_id: Uuid, code: &str) -> Result<(), CoreError> {
        let submitted = code.trim().to_string();
        let outcome = blocking(&self.db, move |db| {
            db.verify_pending_code(account_id, Utc::now(), MAX_OTP_ATTEMPTS, |stored| {
                codes_match(stored, &submitted)
            })
        })
        .await?;

        match outcome {
            VerifyOutcome::Verified => {
                info!("Account {} verified", account_id);
                Ok(())
            }
            VerifyOutcome::NoPending => Err(CoreError::NoPendingCode),
            VerifyOutcome::Expired => Err(CoreError::Expired),
            VerifyOutcome::Mismatch { attempts } => Err(CoreError::Mismatch {
                attempts_left: MAX_OTP_ATTEMPTS.saturating_sub(attempts),
            }),
            VerifyOutcome::Exhausted => {
                warn!("Verification code for {} discarded after repeated mismatches", account_id);
                Err(CoreError::TooManyAttempts)
            }
        }
    }
}

/// Uniformly random `OTP_LENGTH`-digit code; leading zeros allowed.
pub fn generate_code() -> String {
    let upper = 10u32.pow(OTP_LENGTH as u32);
    let n: u32 = rand::rng().random_range(0..upper);
    format!("{:0width$}", n, width = OTP_LENGTH)
}

fn codes_match(stored: &str, submitted: &str) -> bool {
    stored.len() == submitted.len() && bool::from(stored.as_bytes().ct_eq(submitted.as_bytes()))
}
