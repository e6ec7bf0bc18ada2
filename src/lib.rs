mod config;
mod context;
mod types;

pub mod api;
pub mod auth;
pub mod roster;
pub mod server;

pub use config::{
    ACTIVITIES_FILE, AppConfig, TEACHERS_FILE, builtin_activities, load_activities,
    load_credentials, resolve_config_path,
};
pub use context::AppContext;
pub use types::{ActivityName, Email, SessionToken, Username};

pub use auth::{AuthError, AuthGuard, CredentialStore, SessionRegistry};
pub use roster::{Activity, ActivityCatalog, ActivityList, RosterError, RosterService, SignupPolicy};

use anyhow::Result;
use std::sync::Arc;

/// Build the application context from `config` and serve it on `bind`.
pub async fn run(config: AppConfig, bind: &str) -> Result<()> {
    let ctx = Arc::new(AppContext::from_config(&config)?);
    server::start_http(ctx, bind).await
}
