//! Signup and unregister operations over the shared catalog.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use http::StatusCode;
use tracing::{debug, info};

use crate::auth::{AuthError, AuthGuard};
use crate::roster::catalog::ActivityCatalog;
use crate::types::{ActivityName, Email};

/// Roster errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RosterError {
    /// No activity with the requested name
    ActivityNotFound,
    /// Email is already on the roster
    AlreadySignedUp,
    /// Roster is at capacity
    CapacityExceeded,
    /// Email is not on the roster
    NotRegistered,
    /// Caller is not an authenticated teacher
    Unauthorized(AuthError),
}

impl RosterError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::ActivityNotFound | Self::NotRegistered => StatusCode::NOT_FOUND,
            Self::AlreadySignedUp | Self::CapacityExceeded => StatusCode::BAD_REQUEST,
            Self::Unauthorized(e) => e.status_code(),
        }
    }
}

impl fmt::Display for RosterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ActivityNotFound => write!(f, "Activity not found"),
            Self::AlreadySignedUp => write!(f, "Student is already signed up"),
            Self::CapacityExceeded => write!(f, "Activity is full"),
            Self::NotRegistered => write!(f, "Student is not signed up for this activity"),
            Self::Unauthorized(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for RosterError {}

impl From<AuthError> for RosterError {
    fn from(err: AuthError) -> Self {
        Self::Unauthorized(err)
    }
}

/// Who may sign students up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SignupPolicy {
    /// Anyone may sign up; no token required.
    #[default]
    Open,
    /// Signup requires a teacher session, like unregister.
    TeacherOnly,
}

impl FromStr for SignupPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(Self::Open),
            "teacher" | "teacher_only" | "teacher-only" => Ok(Self::TeacherOnly),
            other => Err(anyhow::anyhow!(
                "Unknown signup policy `{}` (expected `open` or `teacher`)",
                other
            )),
        }
    }
}

impl fmt::Display for SignupPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::TeacherOnly => write!(f, "teacher"),
        }
    }
}

/// Applies roster changes to the catalog, gated by the auth guard.
#[derive(Clone)]
pub struct RosterService {
    catalog: Arc<ActivityCatalog>,
    guard: AuthGuard,
    policy: SignupPolicy,
}

impl RosterService {
    pub fn new(catalog: Arc<ActivityCatalog>, guard: AuthGuard, policy: SignupPolicy) -> Self {
        Self {
            catalog,
            guard,
            policy,
        }
    }

    pub fn catalog(&self) -> &Arc<ActivityCatalog> {
        &self.catalog
    }

    pub fn policy(&self) -> SignupPolicy {
        self.policy
    }

    /// Add `email` to an activity's roster.
    ///
    /// Under [`SignupPolicy::TeacherOnly`] the caller must present a live
    /// teacher session before the activity is even looked up.
    pub async fn signup(
        &self,
        authorization: Option<&str>,
        activity: &ActivityName,
        email: Email,
    ) -> Result<(), RosterError> {
        if self.policy == SignupPolicy::TeacherOnly {
            let teacher = self.guard.require_teacher(authorization).await?;
            debug!(teacher = %teacher, activity = %activity, "Signup authorized");
        }

        let email_for_log = email.clone();
        self.catalog
            .update(activity.as_str(), move |a| a.add_participant(email))
            .await?;

        info!(activity = %activity, email = %email_for_log, "Participant signed up");
        Ok(())
    }

    /// Remove `email` from an activity's roster. Always requires a teacher
    /// session, checked before anything about the roster is revealed.
    pub async fn unregister(
        &self,
        authorization: Option<&str>,
        activity: &ActivityName,
        email: &Email,
    ) -> Result<(), RosterError> {
        // The teacher name is only used for the log line for now.
        let teacher = self.guard.require_teacher(authorization).await?;

        self.catalog
            .update(activity.as_str(), |a| a.remove_participant(email.as_str()))
            .await?;

        info!(
            teacher = %teacher,
            activity = %activity,
            email = %email,
            "Participant unregistered"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Credential, CredentialStore, SessionRegistry};
    use crate::roster::{Activity, ActivityList};

    struct Fixture {
        service: RosterService,
        guard: AuthGuard,
    }

    fn fixture(policy: SignupPolicy, capacity: usize) -> Fixture {
        let credentials =
            CredentialStore::from_credentials([Credential::new("mr.chen", "s3cret")]).unwrap();
        let guard = AuthGuard::new(Arc::new(credentials), Arc::new(SessionRegistry::new()));
        let catalog = ActivityCatalog::new(ActivityList(vec![(
            ActivityName::new("Chess Club"),
            Activity::new("Chess", "Fridays", capacity),
        )]))
        .unwrap();
        Fixture {
            service: RosterService::new(Arc::new(catalog), guard.clone(), policy),
            guard,
        }
    }

    async fn roster(service: &RosterService) -> Vec<String> {
        service
            .catalog()
            .get("Chess Club")
            .await
            .unwrap()
            .participants
            .into_iter()
            .map(Email::into_inner)
            .collect()
    }

    fn chess() -> ActivityName {
        ActivityName::new("Chess Club")
    }

    #[test]
    fn test_signup_policy_parse() {
        assert_eq!("open".parse::<SignupPolicy>().unwrap(), SignupPolicy::Open);
        assert_eq!(
            "Teacher".parse::<SignupPolicy>().unwrap(),
            SignupPolicy::TeacherOnly
        );
        assert_eq!(
            "teacher-only".parse::<SignupPolicy>().unwrap(),
            SignupPolicy::TeacherOnly
        );
        assert!("anyone".parse::<SignupPolicy>().is_err());
        assert_eq!(SignupPolicy::default(), SignupPolicy::Open);
        assert_eq!(SignupPolicy::TeacherOnly.to_string(), "teacher");
    }

    #[test]
    fn test_error_status_codes() {
        assert_eq!(
            RosterError::ActivityNotFound.status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(RosterError::NotRegistered.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            RosterError::AlreadySignedUp.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            RosterError::CapacityExceeded.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            RosterError::Unauthorized(AuthError::Unauthenticated).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_ne!(
            RosterError::AlreadySignedUp.to_string(),
            RosterError::CapacityExceeded.to_string()
        );
    }

    #[tokio::test]
    async fn test_chess_club_capacity_scenario() {
        let f = fixture(SignupPolicy::Open, 2);

        f.service.signup(None, &chess(), Email::new("a@x.com")).await.unwrap();
        assert_eq!(roster(&f.service).await, vec!["a@x.com"]);

        f.service.signup(None, &chess(), Email::new("b@x.com")).await.unwrap();
        assert_eq!(roster(&f.service).await, vec!["a@x.com", "b@x.com"]);

        let err = f
            .service
            .signup(None, &chess(), Email::new("c@x.com"))
            .await
            .unwrap_err();
        assert_eq!(err, RosterError::CapacityExceeded);
        assert_eq!(roster(&f.service).await, vec!["a@x.com", "b@x.com"]);
    }

    #[tokio::test]
    async fn test_duplicate_signup_leaves_roster_unchanged() {
        let f = fixture(SignupPolicy::Open, 5);
        f.service.signup(None, &chess(), Email::new("a@x.com")).await.unwrap();

        let err = f
            .service
            .signup(None, &chess(), Email::new("a@x.com"))
            .await
            .unwrap_err();
        assert_eq!(err, RosterError::AlreadySignedUp);
        assert_eq!(roster(&f.service).await, vec!["a@x.com"]);
    }

    #[tokio::test]
    async fn test_signup_unknown_activity() {
        let f = fixture(SignupPolicy::Open, 5);
        let err = f
            .service
            .signup(None, &ActivityName::new("Robotics"), Email::new("a@x.com"))
            .await
            .unwrap_err();
        assert_eq!(err, RosterError::ActivityNotFound);
    }

    #[tokio::test]
    async fn test_teacher_only_signup_requires_session() {
        let f = fixture(SignupPolicy::TeacherOnly, 5);

        let err = f
            .service
            .signup(None, &chess(), Email::new("a@x.com"))
            .await
            .unwrap_err();
        assert_eq!(err, RosterError::Unauthorized(AuthError::Unauthenticated));

        // Auth is checked before the activity lookup
        let err = f
            .service
            .signup(None, &ActivityName::new("Robotics"), Email::new("a@x.com"))
            .await
            .unwrap_err();
        assert_eq!(err, RosterError::Unauthorized(AuthError::Unauthenticated));
        assert!(roster(&f.service).await.is_empty());

        let token = f.guard.login("mr.chen", "s3cret").await.unwrap();
        let header = format!("Bearer {}", token);
        f.service
            .signup(Some(&header), &chess(), Email::new("a@x.com"))
            .await
            .unwrap();
        assert_eq!(roster(&f.service).await, vec!["a@x.com"]);
    }

    #[tokio::test]
    async fn test_unregister_scenario() {
        let f = fixture(SignupPolicy::Open, 2);
        f.service.signup(None, &chess(), Email::new("a@x.com")).await.unwrap();
        f.service.signup(None, &chess(), Email::new("b@x.com")).await.unwrap();

        let token = f.guard.login("mr.chen", "s3cret").await.unwrap();
        let header = format!("Bearer {}", token);

        f.service
            .unregister(Some(&header), &chess(), &Email::new("a@x.com"))
            .await
            .unwrap();
        assert_eq!(roster(&f.service).await, vec!["b@x.com"]);

        let err = f
            .service
            .unregister(Some(&header), &chess(), &Email::new("a@x.com"))
            .await
            .unwrap_err();
        assert_eq!(err, RosterError::NotRegistered);

        let err = f
            .service
            .unregister(Some(&header), &ActivityName::new("Robotics"), &Email::new("b@x.com"))
            .await
            .unwrap_err();
        assert_eq!(err, RosterError::ActivityNotFound);
    }

    #[tokio::test]
    async fn test_unregister_without_session_never_leaks() {
        let f = fixture(SignupPolicy::Open, 2);
        f.service.signup(None, &chess(), Email::new("a@x.com")).await.unwrap();

        let cases = [
            (None, "a@x.com"),
            (None, "ghost@x.com"),
            (Some("Bearer not-a-token"), "a@x.com"),
            (Some("Bearer not-a-token"), "ghost@x.com"),
            (Some("Token abc"), "a@x.com"),
        ];
        for (header, email) in cases {
            let err = f
                .service
                .unregister(header, &chess(), &Email::new(email))
                .await
                .unwrap_err();
            assert_eq!(err, RosterError::Unauthorized(AuthError::Unauthenticated));
        }
        assert_eq!(roster(&f.service).await, vec!["a@x.com"]);
    }

    #[tokio::test]
    async fn test_unregister_after_logout_rejected() {
        let f = fixture(SignupPolicy::Open, 2);
        f.service.signup(None, &chess(), Email::new("a@x.com")).await.unwrap();

        let token = f.guard.login("mr.chen", "s3cret").await.unwrap();
        let header = format!("Bearer {}", token);
        f.guard.logout(Some(&header)).await;

        let err = f
            .service
            .unregister(Some(&header), &chess(), &Email::new("a@x.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, RosterError::Unauthorized(_)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_signups_respect_capacity() {
        const N: usize = 50;
        const K: usize = 7;
        let f = fixture(SignupPolicy::Open, K);

        let handles: Vec<_> = (0..N)
            .map(|i| {
                let service = f.service.clone();
                tokio::spawn(async move {
                    service
                        .signup(None, &chess(), Email::new(format!("s{}@x.com", i)))
                        .await
                })
            })
            .collect();

        let mut ok = 0;
        let mut full = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(()) => ok += 1,
                Err(RosterError::CapacityExceeded) => full += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(ok, K);
        assert_eq!(full, N - K);
        assert_eq!(roster(&f.service).await.len(), K);
    }

    #[tokio::test]
    async fn test_email_may_join_several_activities() {
        let credentials = CredentialStore::default();
        let guard = AuthGuard::new(Arc::new(credentials), Arc::new(SessionRegistry::new()));
        let catalog = ActivityCatalog::new(ActivityList(vec![
            (ActivityName::new("Chess Club"), Activity::new("c", "Fri", 2)),
            (ActivityName::new("Art Club"), Activity::new("a", "Thu", 2)),
        ]))
        .unwrap();
        let service = RosterService::new(Arc::new(catalog), guard, SignupPolicy::Open);

        service.signup(None, &chess(), Email::new("a@x.com")).await.unwrap();
        service
            .signup(None, &ActivityName::new("Art Club"), Email::new("a@x.com"))
            .await
            .unwrap();
        let art = service.catalog().get("Art Club").await.unwrap();
        assert!(art.is_registered("a@x.com"));
    }
}
