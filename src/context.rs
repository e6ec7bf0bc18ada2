//! Process-scoped application state.

use std::sync::Arc;

use tracing::info;

use crate::auth::{AuthGuard, CredentialStore, SessionRegistry};
use crate::config::{AppConfig, load_activities, load_credentials};
use crate::roster::{ActivityCatalog, ActivityList, RosterService, SignupPolicy};

/// Owns the shared resources for the life of the process.
///
/// Each test can build its own context, so no state leaks between them.
#[derive(Clone)]
pub struct AppContext {
    credentials: Arc<CredentialStore>,
    sessions: Arc<SessionRegistry>,
    catalog: Arc<ActivityCatalog>,
    guard: AuthGuard,
    roster: RosterService,
}

impl AppContext {
    pub fn new(
        credentials: CredentialStore,
        activities: ActivityList,
        signup_policy: SignupPolicy,
    ) -> anyhow::Result<Self> {
        let credentials = Arc::new(credentials);
        let sessions = Arc::new(SessionRegistry::new());
        let catalog = Arc::new(ActivityCatalog::new(activities)?);

        let guard = AuthGuard::new(credentials.clone(), sessions.clone());
        let roster = RosterService::new(catalog.clone(), guard.clone(), signup_policy);

        Ok(Self {
            credentials,
            sessions,
            catalog,
            guard,
            roster,
        })
    }

    /// Load seed data and credentials as described by `config`.
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let credentials = load_credentials(config.teachers_path.as_deref())?;
        let activities = load_activities(config.activities_path.as_deref())?;
        let ctx = Self::new(credentials, activities, config.signup_policy)?;
        info!(
            teachers = ctx.credentials.len(),
            signup_policy = %config.signup_policy,
            "Application context ready"
        );
        Ok(ctx)
    }

    pub fn credentials(&self) -> &Arc<CredentialStore> {
        &self.credentials
    }

    pub fn sessions(&self) -> &Arc<SessionRegistry> {
        &self.sessions
    }

    pub fn catalog(&self) -> &Arc<ActivityCatalog> {
        &self.catalog
    }

    pub fn guard(&self) -> &AuthGuard {
        &self.guard
    }

    pub fn roster(&self) -> &RosterService {
        &self.roster
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Credential;
    use crate::config::builtin_activities;

    #[tokio::test]
    async fn test_components_share_resources() {
        let credentials =
            CredentialStore::from_credentials([Credential::new("mr.chen", "s3cret")]).unwrap();
        let ctx =
            AppContext::new(credentials, builtin_activities().unwrap(), SignupPolicy::Open).unwrap();

        let token = ctx.guard().login("mr.chen", "s3cret").await.unwrap();
        assert_eq!(ctx.sessions().len().await, 1);
        assert!(ctx.sessions().resolve(token.as_str()).await.is_some());
        assert_eq!(ctx.catalog().len().await, 9);
        assert_eq!(ctx.roster().policy(), SignupPolicy::Open);
    }

    #[tokio::test]
    async fn test_contexts_are_isolated() {
        let a = AppContext::new(
            CredentialStore::default(),
            builtin_activities().unwrap(),
            SignupPolicy::Open,
        )
        .unwrap();
        let b = AppContext::new(
            CredentialStore::default(),
            builtin_activities().unwrap(),
            SignupPolicy::Open,
        )
        .unwrap();

        a.roster()
            .signup(None, &"Chess Club".into(), "new@x.com".into())
            .await
            .unwrap();
        assert!(a.catalog().get("Chess Club").await.unwrap().is_registered("new@x.com"));
        assert!(!b.catalog().get("Chess Club").await.unwrap().is_registered("new@x.com"));
    }
}
