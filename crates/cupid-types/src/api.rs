use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Match, Photo, Prompt, SwipeDecision};

// -- JWT Claims --

/// JWT claims shared by cupid-api (REST middleware) and cupid-gateway
/// (WebSocket Identify).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
}

#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub account_id: Uuid,
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub account_id: Uuid,
    pub email: String,
    pub verified: bool,
    pub profile_complete: bool,
    pub token: String,
}

// -- Verification --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RequestCodeRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VerifyCodeRequest {
    pub account_id: Uuid,
    pub code: String,
}

// -- Profile --

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateProfileRequest {
    pub age: Option<u8>,
    pub course: Option<String>,
    pub academic_year: Option<String>,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub prompts: Vec<Prompt>,
    #[serde(default)]
    pub photos: Vec<Photo>,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub profile: crate::models::Profile,
    pub verified: bool,
    pub profile_complete: bool,
    /// Required field groups still missing, in setup order.
    pub missing: Vec<String>,
}

// -- Feed / swipes --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SwipeRequest {
    pub target_id: Uuid,
    pub decision: SwipeDecision,
}

#[derive(Debug, Serialize)]
pub struct SwipeResponse {
    pub matched: bool,
    #[serde(rename = "match", skip_serializing_if = "Option::is_none")]
    pub matched_with: Option<Match>,
}

// -- Matches --

/// The other participant of a match, trimmed down for a match list.
#[derive(Debug, Clone, Serialize)]
pub struct MatchPartner {
    pub id: Uuid,
    pub name: String,
    pub age: Option<u8>,
    pub course: Option<String>,
    pub primary_photo: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchSummary {
    pub id: Uuid,
    pub partner: MatchPartner,
    pub created_at: DateTime<Utc>,
}

// -- Messages --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendMessageRequest {
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct MarkReadResponse {
    pub updated: usize,
}

// -- Errors --

/// Body of every non-2xx response: a machine-readable kind and code, never
/// a display string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub kind: String,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}
