pub mod auth;
pub mod config;
pub mod email;
pub mod error;
pub mod feed;
pub mod matches;
pub mod messages;
pub mod middleware;
pub mod notify;
pub mod profiles;
pub mod routes;
pub mod services;
pub mod state;
pub mod verification;

pub use error::{CoreError, ErrorKind};
pub use state::{AppState, AppStateInner};
