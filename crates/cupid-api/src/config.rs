use chrono::Duration;

/// Number of digits in a verification code.
pub const OTP_LENGTH: usize = 6;

/// Default validity window of a verification code, in minutes.
pub const DEFAULT_OTP_TTL_MINUTES: i64 = 10;

/// Failed submissions a single code tolerates before it is discarded.
pub const MAX_OTP_ATTEMPTS: u32 = 5;

/// Institutional email suffix accounts must belong to, e.g. `@srmist.edu.in`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailDomain(String);

impl EmailDomain {
    /// Accepts `srmist.edu.in` or `@srmist.edu.in`; stored lower-cased with
    /// the leading `@`. Returns `None` for an empty suffix.
    pub fn new(suffix: &str) -> Option<Self> {
        let bare = suffix.trim().trim_start_matches('@').to_lowercase();
        if bare.is_empty() || bare.contains('@') || bare.contains(char::is_whitespace) {
            return None;
        }
        Some(Self(format!("@{bare}")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `email` must already be normalized with [`normalize_email`].
    pub fn admits(&self, email: &str) -> bool {
        email.len() > self.0.len() && email.ends_with(&self.0)
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[derive(Debug, Clone)]
pub struct CoreConfig {
    pub email_domain: EmailDomain,
    pub otp_ttl: Duration,
    pub jwt_secret: String,
}

impl CoreConfig {
    pub fn new(email_domain: EmailDomain, jwt_secret: impl Into<String>) -> Self {
        Self {
            email_domain,
            otp_ttl: Duration::minutes(DEFAULT_OTP_TTL_MINUTES),
            jwt_secret: jwt_secret.into(),
        }
    }

    pub fn with_otp_ttl(mut self, ttl: Duration) -> Self {
        self.otp_ttl = ttl;
        self
    }
}
