//! In-test doubles for the external collaborators.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use cupid_db::Database;
use cupid_types::events::GatewayEvent;

use crate::email::{MailError, Mailer};
use crate::notify::Notifier;

#[derive(Default)]
pub(crate) struct RecordingMailer {
    pub sent: Mutex<Vec<(String, String)>>,
    pub fail: bool,
}

impl RecordingMailer {
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    /// The six-digit code in the most recent message body.
    pub fn last_code(&self) -> Option<String> {
        let sent = self.sent.lock().unwrap();
        let (_, body) = sent.last()?;
        body.split(|c: char| !c.is_ascii_digit())
            .find(|w| w.len() == crate::config::OTP_LENGTH)
            .map(str::to_string)
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, to: &str, _subject: &str, body: &str) -> Result<(), MailError> {
        self.sent.lock().unwrap().push((to.to_string(), body.to_string()));
        if self.fail {
            return Err(MailError::SendFailed("connection refused".into()));
        }
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct RecordingNotifier {
    pub events: Mutex<Vec<(Uuid, GatewayEvent)>>,
}

impl RecordingNotifier {
    pub fn events_for(&self, account_id: Uuid) -> Vec<GatewayEvent> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _)| *id == account_id)
            .map(|(_, e)| e.clone())
            .collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn publish(&self, account_id: Uuid, event: GatewayEvent) -> anyhow::Result<()> {
        self.events.lock().unwrap().push((account_id, event));
        Ok(())
    }
}

pub(crate) fn db() -> Arc<Database> {
    Arc::new(Database::open_in_memory().unwrap())
}

pub(crate) fn account(db: &Database, email: &str) -> Uuid {
    let id = Uuid::new_v4();
    assert!(db.create_account(id, email, "hash", "Test User", Utc::now()).unwrap());
    id
}

/// Account that shows up in other people's feeds and may swipe.
pub(crate) fn eligible_account(db: &Database, email: &str) -> Uuid {
    let id = account(db, email);
    set_flags(db, id, true, true);
    id
}

pub(crate) fn set_flags(db: &Database, id: Uuid, verified: bool, complete: bool) {
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE accounts SET verified = ?2, profile_complete = ?3 WHERE id = ?1",
            (id.to_string(), verified, complete),
        )?;
        Ok(())
    })
    .unwrap();
}
