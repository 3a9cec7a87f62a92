use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Photo {
    pub url: String,
    pub is_primary: bool,
}

/// A profile as shown in the swipe feed and returned to its owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub account_id: Uuid,
    pub full_name: String,
    pub age: Option<u8>,
    pub course: Option<String>,
    pub academic_year: Option<String>,
    pub bio: String,
    pub interests: Vec<String>,
    pub prompts: Vec<Prompt>,
    pub photos: Vec<Photo>,
}

impl Profile {
    pub fn primary_photo(&self) -> Option<&Photo> {
        self.photos.iter().find(|p| p.is_primary)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwipeDecision {
    Like,
    Pass,
}

impl SwipeDecision {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Like => "like",
            Self::Pass => "pass",
        }
    }
}

impl fmt::Display for SwipeDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SwipeDecision {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "like" => Ok(Self::Like),
            "pass" => Ok(Self::Pass),
            other => Err(format!("unknown swipe decision: {other}")),
        }
    }
}

/// Unordered account pair stored with the smaller id first, so `(a, b)` and
/// `(b, a)` share one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MatchPair {
    pub a: Uuid,
    pub b: Uuid,
}

impl MatchPair {
    pub fn canonical(x: Uuid, y: Uuid) -> Self {
        if x <= y { Self { a: x, b: y } } else { Self { a: y, b: x } }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub id: Uuid,
    pub account_a_id: Uuid,
    pub account_b_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Match {
    pub fn involves(&self, account_id: Uuid) -> bool {
        self.account_a_id == account_id || self.account_b_id == account_id
    }

    /// The other participant, or `None` if `account_id` is not in the match.
    pub fn other(&self, account_id: Uuid) -> Option<Uuid> {
        if self.account_a_id == account_id {
            Some(self.account_b_id)
        } else if self.account_b_id == account_id {
            Some(self.account_a_id)
        } else {
            None
        }
    }

    pub fn participants(&self) -> [Uuid; 2] {
        [self.account_a_id, self.account_b_id]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub match_id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub is_read: bool,
}
