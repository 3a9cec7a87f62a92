//! Per-match message thread. Messages are append-only and delivered live
//! through the notifier; `history` stays the source of truth.

use std::sync::Arc;

use chrono::{SubsecRound, Utc};
use tracing::debug;
use uuid::Uuid;

use cupid_db::Database;
use cupid_db::models::MessageRow;
use cupid_types::events::GatewayEvent;
use cupid_types::models::{ChatMessage, Match};

use crate::error::CoreError;
use crate::notify::{Notifier, publish_logged};
use crate::services::blocking;

/// Maximum message length in characters, after trimming.
pub const MAX_MESSAGE_CHARS: usize = 500;

pub struct ChatChannel {
    db: Arc<Database>,
    notifier: Arc<dyn Notifier>,
}

impl ChatChannel {
    pub fn new(db: Arc<Database>, notifier: Arc<dyn Notifier>) -> Self {
        Self { db, notifier }
    }

    pub async fn send(
        &self,
        match_id: Uuid,
        sender_id: Uuid,
        content: &str,
    ) -> Result<ChatMessage, CoreError> {
        let m = self.load_match(match_id).await?;
        if !m.involves(sender_id) {
            return Err(CoreError::NotAParticipant);
        }
        let content = validate_content(content)?;

        let row = MessageRow {
            id: Uuid::new_v4(),
            match_id,
            sender_id,
            content,
            // Stored at microsecond precision
            created_at: Utc::now().trunc_subsecs(6),
            is_read: false,
        };
        let message = blocking(&self.db, move |db| {
            db.insert_message(&row)?;
            Ok(ChatMessage::from(row))
        })
        .await?;
        debug!("Message {} appended to match {}", message.id, match_id);

        // Both sides get the event so a sender's other devices stay in sync
        for account in m.participants() {
            let event = GatewayEvent::MessageCreate {
                id: message.id,
                match_id,
                sender_id,
                content: message.content.clone(),
                timestamp: message.created_at,
            };
            publish_logged(self.notifier.as_ref(), account, event).await;
        }

        Ok(message)
    }

    /// All messages of a match, oldest first.
    pub async fn history(&self, match_id: Uuid) -> Result<Vec<ChatMessage>, CoreError> {
        self.load_match(match_id).await?;
        let rows = blocking(&self.db, move |db| db.messages_for(match_id)).await?;
        Ok(rows.into_iter().map(ChatMessage::from).collect())
    }

    /// `history`, restricted to the match's participants.
    pub async fn history_for(
        &self,
        viewer: Uuid,
        match_id: Uuid,
    ) -> Result<Vec<ChatMessage>, CoreError> {
        let m = self.load_match(match_id).await?;
        if !m.involves(viewer) {
            return Err(CoreError::NotAParticipant);
        }
        self.history(match_id).await
    }

    /// Mark everything the other participant sent as read.
    pub async fn mark_read(&self, match_id: Uuid, reader: Uuid) -> Result<usize, CoreError> {
        let m = self.load_match(match_id).await?;
        if !m.involves(reader) {
            return Err(CoreError::NotAParticipant);
        }
        blocking(&self.db, move |db| db.mark_read(match_id, reader)).await
    }

    async fn load_match(&self, match_id: Uuid) -> Result<Match, CoreError> {
        blocking(&self.db, move |db| db.get_match(match_id))
            .await?
            .map(Match::from)
            .ok_or(CoreError::MatchNotFound)
    }
}

/// Trimmed content, or the validation failure.
fn validate_content(content: &str) -> Result<String, CoreError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(CoreError::EmptyContent);
    }
    if trimmed.chars().count() > MAX_MESSAGE_CHARS {
        return Err(CoreError::TooLong {
            max: MAX_MESSAGE_CHARS,
        });
    }
    Ok(trimmed.to_string())
}
