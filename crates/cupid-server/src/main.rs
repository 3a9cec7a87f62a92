use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use cupid_api::config::{CoreConfig, DEFAULT_OTP_TTL_MINUTES, EmailDomain};
use cupid_api::email::{LogMailer, Mailer, SendGridMailer};
use cupid_api::routes;
use cupid_api::{AppState, AppStateInner};
use cupid_db::Database;
use cupid_gateway::dispatcher::Dispatcher;

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", "dev-secret-change-me"];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cupid=debug,cupid_api=debug,cupid_db=info,cupid_gateway=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let jwt_secret = std::env::var("CUPID_JWT_SECRET").unwrap_or_default();
    if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
        eprintln!("FATAL: CUPID_JWT_SECRET is unset or still a placeholder.");
        eprintln!("       Set it in your .env file and restart.");
        std::process::exit(1);
    }

    let domain_raw = std::env::var("CUPID_EMAIL_DOMAIN").unwrap_or_default();
    let Some(email_domain) = EmailDomain::new(&domain_raw) else {
        eprintln!("FATAL: CUPID_EMAIL_DOMAIN is unset or invalid (e.g. @srmist.edu.in).");
        std::process::exit(1);
    };

    let db_path = std::env::var("CUPID_DB_PATH").unwrap_or_else(|_| "cupid.db".into());
    let host = std::env::var("CUPID_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("CUPID_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;
    let otp_ttl_minutes: i64 = std::env::var("CUPID_OTP_TTL_MINUTES")
        .ok()
        .and_then(|v| v.parse().ok())
        .filter(|m| *m > 0)
        .unwrap_or(DEFAULT_OTP_TTL_MINUTES);
    let mail_from =
        std::env::var("CUPID_MAIL_FROM").unwrap_or_else(|_| "no-reply@campuscupid.app".into());

    let mailer: Arc<dyn Mailer> = match std::env::var("CUPID_SENDGRID_API_KEY") {
        Ok(key) if !key.is_empty() => Arc::new(SendGridMailer::new(key, mail_from)),
        _ => {
            warn!("CUPID_SENDGRID_API_KEY not set, verification codes will only be logged");
            Arc::new(LogMailer)
        }
    };

    // Init database
    let db = Arc::new(Database::open(&PathBuf::from(&db_path))?);

    // Shared state
    let config = CoreConfig::new(email_domain, jwt_secret)
        .with_otp_ttl(chrono::Duration::minutes(otp_ttl_minutes));
    let state: AppState = Arc::new(AppStateInner::new(db, config, mailer, Dispatcher::new()));

    let app = routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Cupid server listening on {} (domain {})", addr, domain_raw.trim());

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
