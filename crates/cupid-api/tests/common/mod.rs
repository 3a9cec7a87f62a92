#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use serde_json::Value;
use tower::ServiceExt;

use cupid_api::config::{CoreConfig, EmailDomain};
use cupid_api::email::{MailError, Mailer};
use cupid_api::{AppState, AppStateInner};
use cupid_db::Database;
use cupid_gateway::dispatcher::Dispatcher;

pub const SECRET: &str = "integration-test-secret";

#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<(String, String)>>,
}

impl RecordingMailer {
    /// Code from the latest message sent to `to`.
    pub fn code_for(&self, to: &str) -> Option<String> {
        let sent = self.sent.lock().unwrap();
        let (_, body) = sent.iter().rev().find(|(addr, _)| addr == to)?;
        body.split(|c: char| !c.is_ascii_digit())
            .find(|w| w.len() == 6)
            .map(str::to_string)
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, to: &str, _subject: &str, body: &str) -> Result<(), MailError> {
        self.sent.lock().unwrap().push((to.to_string(), body.to_string()));
        Ok(())
    }
}

pub struct TestApp {
    pub state: AppState,
    pub router: Router,
    pub mailer: Arc<RecordingMailer>,
}

impl TestApp {
    pub fn new() -> Self {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let mailer = Arc::new(RecordingMailer::default());
        let config = CoreConfig::new(EmailDomain::new("@uni.edu").unwrap(), SECRET);
        let state: AppState = Arc::new(AppStateInner::new(
            db,
            config,
            mailer.clone(),
            Dispatcher::new(),
        ));
        let router = cupid_api::routes::router(state.clone());
        Self {
            state,
            router,
            mailer,
        }
    }

    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&json).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }
}
