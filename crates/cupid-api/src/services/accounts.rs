use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::info;
use uuid::Uuid;

use cupid_db::Database;
use cupid_types::api::{Claims, LoginResponse, SignupResponse};

use crate::config::{EmailDomain, normalize_email};
use crate::error::CoreError;
use crate::services::blocking;

pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_NAME_CHARS: usize = 64;
pub const TOKEN_LIFETIME_DAYS: i64 = 30;

/// Signup and login. Sessions are stateless JWTs.
pub struct Accounts {
    db: Arc<Database>,
    domain: EmailDomain,
    jwt_secret: String,
}

impl Accounts {
    pub fn new(db: Arc<Database>, domain: EmailDomain, jwt_secret: String) -> Self {
        Self {
            db,
            domain,
            jwt_secret,
        }
    }

    pub async fn signup(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> Result<SignupResponse, CoreError> {
        let email = normalize_email(email);
        if !self.domain.admits(&email) {
            return Err(CoreError::InvalidDomain);
        }
        if password.len() < MIN_PASSWORD_LEN {
            return Err(CoreError::InvalidRequest(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        let full_name = full_name.trim().to_string();
        if full_name.is_empty() || full_name.chars().count() > MAX_NAME_CHARS {
            return Err(CoreError::InvalidRequest(format!(
                "name must be 1-{MAX_NAME_CHARS} characters"
            )));
        }

        let account_id = Uuid::new_v4();
        let password = password.to_string();
        let stored_email = email.clone();
        let created = blocking(&self.db, move |db| {
            // Hash with Argon2id
            let salt = SaltString::generate(&mut OsRng);
            let password_hash = Argon2::default()
                .hash_password(password.as_bytes(), &salt)
                .map_err(|e| anyhow::anyhow!("password hashing failed: {e}"))?
                .to_string();
            db.create_account(account_id, &stored_email, &password_hash, &full_name, Utc::now())
        })
        .await?;
        if !created {
            return Err(CoreError::EmailTaken);
        }

        info!("Account {} signed up", account_id);
        let token = self.create_token(account_id, &email)?;
        Ok(SignupResponse { account_id, token })
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, CoreError> {
        let email = normalize_email(email);
        let password = password.to_string();

        let account = blocking(&self.db, move |db| {
            let Some(account) = db.get_account_by_email(&email)? else {
                return Ok(None);
            };
            let parsed = PasswordHash::new(&account.password)
                .map_err(|e| anyhow::anyhow!("stored password hash is malformed: {e}"))?;
            let ok = Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok();
            Ok(ok.then_some(account))
        })
        .await?
        .ok_or(CoreError::InvalidCredentials)?;

        let token = self.create_token(account.id, &account.email)?;
        Ok(LoginResponse {
            account_id: account.id,
            email: account.email,
            verified: account.verified,
            profile_complete: account.profile_complete,
            token,
        })
    }

    pub fn create_token(&self, account_id: Uuid, email: &str) -> Result<String, CoreError> {
        let claims = Claims {
            sub: account_id,
            email: email.to_string(),
            exp: (Utc::now() + chrono::Duration::days(TOKEN_LIFETIME_DAYS)).timestamp() as usize,
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| CoreError::Internal(e.into()))?;

        Ok(token)
    }

    pub fn decode_token(&self, token: &str) -> Result<Claims, CoreError> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|_| CoreError::Unauthorized)
    }
}
