use std::sync::Arc;

use cupid_db::Database;
use cupid_gateway::dispatcher::Dispatcher;

use crate::config::CoreConfig;
use crate::email::Mailer;
use crate::notify::Notifier;
use crate::services::{
    accounts::Accounts, candidates::CandidateSelector, chat::ChatChannel, otp::OtpVerifier,
    profiles::ProfileEditor, swipes::SwipeRecorder,
};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Arc<Database>,
    pub jwt_secret: String,
    pub dispatcher: Dispatcher,
    pub accounts: Accounts,
    pub otp: OtpVerifier,
    pub candidates: CandidateSelector,
    pub swipes: SwipeRecorder,
    pub chat: ChatChannel,
    pub profiles: ProfileEditor,
}

impl AppStateInner {
    /// Wire the core services to the gateway dispatcher.
    pub fn new(
        db: Arc<Database>,
        config: CoreConfig,
        mailer: Arc<dyn Mailer>,
        dispatcher: Dispatcher,
    ) -> Self {
        let notifier: Arc<dyn Notifier> = Arc::new(dispatcher.clone());
        Self::with_notifier(db, config, mailer, dispatcher, notifier)
    }

    /// Like [`AppStateInner::new`], with a custom notification collaborator.
    pub fn with_notifier(
        db: Arc<Database>,
        config: CoreConfig,
        mailer: Arc<dyn Mailer>,
        dispatcher: Dispatcher,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            accounts: Accounts::new(
                db.clone(),
                config.email_domain.clone(),
                config.jwt_secret.clone(),
            ),
            otp: OtpVerifier::new(db.clone(), mailer, config.email_domain, config.otp_ttl),
            candidates: CandidateSelector::new(db.clone()),
            swipes: SwipeRecorder::new(db.clone(), notifier.clone()),
            chat: ChatChannel::new(db.clone(), notifier),
            profiles: ProfileEditor::new(db.clone()),
            jwt_secret: config.jwt_secret,
            dispatcher,
            db,
        }
    }
}
