//! Database row types. These map directly to SQLite rows and are kept
//! distinct from the cupid-types API models.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Row;
use rusqlite::types::Type;
use uuid::Uuid;

use cupid_types::models::{ChatMessage, Match, Photo, Prompt, SwipeDecision};

pub struct AccountRow {
    pub id: Uuid,
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub verified: bool,
    pub profile_complete: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct PendingVerificationRow {
    pub account_id: Uuid,
    pub otp_code: String,
    pub attempts: u32,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Scalar profile columns joined with the owner's name.
pub struct ProfileRow {
    pub account_id: Uuid,
    pub full_name: String,
    pub age: Option<u8>,
    pub course: Option<String>,
    pub academic_year: Option<String>,
    pub bio: String,
}

/// Child rows of a profile, loaded in one batch per table.
#[derive(Default)]
pub struct ProfileDetails {
    pub interests: Vec<String>,
    pub prompts: Vec<Prompt>,
    pub photos: Vec<Photo>,
}

#[derive(Debug)]
pub struct SwipeRow {
    pub swiper_id: Uuid,
    pub swiped_id: Uuid,
    pub decision: SwipeDecision,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct MatchRow {
    pub id: Uuid,
    pub account_a_id: Uuid,
    pub account_b_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<MatchRow> for Match {
    fn from(row: MatchRow) -> Self {
        Match {
            id: row.id,
            account_a_id: row.account_a_id,
            account_b_id: row.account_b_id,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug)]
pub struct MessageRow {
    pub id: Uuid,
    pub match_id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub is_read: bool,
}

impl From<MessageRow> for ChatMessage {
    fn from(row: MessageRow) -> Self {
        ChatMessage {
            id: row.id,
            match_id: row.match_id,
            sender_id: row.sender_id,
            content: row.content,
            created_at: row.created_at,
            is_read: row.is_read,
        }
    }
}

// -- Column codecs --

/// Timestamps are stored as fixed-width RFC 3339 text (microseconds, `Z`),
/// so lexical order equals chronological order.
pub fn encode_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn get_ts(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(crate) fn get_uuid(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(crate) fn get_decision(row: &Row<'_>, idx: usize) -> rusqlite::Result<SwipeDecision> {
    let raw: String = row.get(idx)?;
    raw.parse().map_err(|e: String| {
        rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, e.into())
    })
}

pub(crate) fn match_from_row(row: &Row<'_>) -> rusqlite::Result<MatchRow> {
    Ok(MatchRow {
        id: get_uuid(row, 0)?,
        account_a_id: get_uuid(row, 1)?,
        account_b_id: get_uuid(row, 2)?,
        created_at: get_ts(row, 3)?,
    })
}
