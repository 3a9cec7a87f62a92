use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use cupid_types::api::ErrorBody;

/// Failure classes. Validation errors are the caller's input; state errors
/// depend on what is already stored; dependency errors come from a
/// collaborator (database, mail, notification).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    State,
    Dependency,
    Auth,
    NotFound,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::State => "state",
            Self::Dependency => "dependency",
            Self::Auth => "auth",
            Self::NotFound => "not_found",
        }
    }
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("email is outside the institutional domain")]
    InvalidDomain,

    #[error("account not found")]
    AccountNotFound,

    #[error("email already registered")]
    EmailTaken,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("missing or invalid session token")]
    Unauthorized,

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("email delivery failed: {0}")]
    DeliveryFailed(String),

    #[error("no pending verification code")]
    NoPendingCode,

    #[error("verification code expired")]
    Expired,

    #[error("verification code mismatch")]
    Mismatch { attempts_left: u32 },

    #[error("too many failed verification attempts")]
    TooManyAttempts,

    #[error("account is not verified or its profile is incomplete")]
    NotActivated,

    #[error("cannot swipe on yourself")]
    SelfSwipe,

    #[error("target already swiped")]
    DuplicateSwipe,

    #[error("match not found")]
    MatchNotFound,

    #[error("sender is not a participant of this match")]
    NotAParticipant,

    #[error("message content is empty")]
    EmptyContent,

    #[error("message content exceeds {max} characters")]
    TooLong { max: usize },

    #[error("invalid profile: {0}")]
    InvalidProfile(String),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidDomain
            | Self::InvalidRequest(_)
            | Self::SelfSwipe
            | Self::EmptyContent
            | Self::TooLong { .. }
            | Self::InvalidProfile(_) => ErrorKind::Validation,

            Self::EmailTaken
            | Self::NoPendingCode
            | Self::Expired
            | Self::Mismatch { .. }
            | Self::TooManyAttempts
            | Self::DuplicateSwipe
            | Self::NotActivated
            | Self::NotAParticipant => ErrorKind::State,

            Self::DeliveryFailed(_) | Self::Internal(_) => ErrorKind::Dependency,

            Self::InvalidCredentials | Self::Unauthorized => ErrorKind::Auth,

            Self::AccountNotFound | Self::MatchNotFound => ErrorKind::NotFound,
        }
    }

    /// Stable machine-readable code for the variant.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidDomain => "invalid_domain",
            Self::AccountNotFound => "account_not_found",
            Self::EmailTaken => "email_taken",
            Self::InvalidCredentials => "invalid_credentials",
            Self::Unauthorized => "unauthorized",
            Self::InvalidRequest(_) => "invalid_request",
            Self::DeliveryFailed(_) => "delivery_failed",
            Self::NoPendingCode => "no_pending_code",
            Self::Expired => "expired",
            Self::Mismatch { .. } => "mismatch",
            Self::TooManyAttempts => "too_many_attempts",
            Self::NotActivated => "not_activated",
            Self::SelfSwipe => "self_swipe",
            Self::DuplicateSwipe => "duplicate_swipe",
            Self::MatchNotFound => "match_not_found",
            Self::NotAParticipant => "not_a_participant",
            Self::EmptyContent => "empty_content",
            Self::TooLong { .. } => "too_long",
            Self::InvalidProfile(_) => "invalid_profile",
            Self::Internal(_) => "internal",
        }
    }

    /// Optional detail for the caller. Internal causes are never exposed.
    pub fn detail(&self) -> Option<String> {
        match self {
            Self::InvalidRequest(d) | Self::DeliveryFailed(d) | Self::InvalidProfile(d) => {
                Some(d.clone())
            }
            Self::Mismatch { attempts_left } => Some(format!("attempts_left={attempts_left}")),
            Self::TooLong { max } => Some(format!("max={max}")),
            _ => None,
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::InvalidDomain | Self::InvalidRequest(_) | Self::SelfSwipe | Self::EmptyContent => {
                StatusCode::BAD_REQUEST
            }
            Self::TooLong { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::InvalidProfile(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::InvalidCredentials | Self::Unauthorized | Self::Mismatch { .. } => {
                StatusCode::UNAUTHORIZED
            }
            Self::NotAParticipant | Self::NotActivated => StatusCode::FORBIDDEN,
            Self::AccountNotFound | Self::MatchNotFound => StatusCode::NOT_FOUND,
            Self::EmailTaken | Self::NoPendingCode | Self::DuplicateSwipe => StatusCode::CONFLICT,
            Self::Expired => StatusCode::GONE,
            Self::TooManyAttempts => StatusCode::TOO_MANY_REQUESTS,
            Self::DeliveryFailed(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// Extractor failures surface as `invalid_request` with axum's message as detail
impl From<JsonRejection> for CoreError {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidRequest(rejection.body_text())
    }
}

impl From<PathRejection> for CoreError {
    fn from(rejection: PathRejection) -> Self {
        Self::InvalidRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for CoreError {
    fn from(rejection: QueryRejection) -> Self {
        Self::InvalidRequest(rejection.body_text())
    }
}

impl IntoResponse for CoreError {
    fn into_response(self) -> Response {
        if let Self::Internal(e) = &self {
            error!("Internal error: {:#}", e);
        }

        let body = ErrorBody {
            kind: self.kind().as_str().to_string(),
            error: self.code().to_string(),
            detail: self.detail(),
        };
        (self.status(), Json(body)).into_response()
    }
}
