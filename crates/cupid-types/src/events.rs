use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Events sent over the WebSocket gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum GatewayEvent {
    /// Server confirms successful authentication
    Ready { account_id: Uuid },

    /// Two accounts liked each other
    MatchCreate {
        match_id: Uuid,
        partner_id: Uuid,
        created_at: DateTime<Utc>,
    },

    /// A new chat message was appended to a match
    MessageCreate {
        id: Uuid,
        match_id: Uuid,
        sender_id: Uuid,
        content: String,
        timestamp: DateTime<Utc>,
    },
}

impl GatewayEvent {
    /// Returns the match_id if this event is scoped to a match.
    pub fn match_id(&self) -> Option<Uuid> {
        match self {
            Self::MatchCreate { match_id, .. } => Some(*match_id),
            Self::MessageCreate { match_id, .. } => Some(*match_id),
            Self::Ready { .. } => None,
        }
    }
}

/// Commands sent FROM client TO server over WebSocket.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum GatewayCommand {
    /// Authenticate the WebSocket connection
    Identify { token: String },
}
