//! Session-cached authentication.
//!
//! The session holds the signed-in user's email and a cached copy of their
//! record. On each request the cached record is shown immediately and then
//! confirmed against the backend. A failed confirmation never logs anyone
//! out: the cached record is kept and the failure is only logged.
//!
//! ```text
//!              login                 remote confirms
//! LoggedOut ─────────► Verified ◄──────────────────── Cached
//!     ▲                   │  next request                ▲
//!     │ logout            └──────────────────────────────┘
//!     └──────────────────────────── (any state)
//! ```

use std::future::Future;
use std::time::Duration;

use dompee_core::User;
use tower_sessions::Session;
use tower_sessions::session::Error as SessionError;

use crate::backend::{BackendClient, BackendError};
use crate::models::session_keys;

/// Where the signed-in user comes from on this request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    /// No user in the session.
    LoggedOut,
    /// A user from the session cache that the backend has not confirmed on
    /// this request.
    Cached(User),
    /// A user the backend has just confirmed (or confirmed within the
    /// re-verification window).
    Verified(User),
}

impl AuthState {
    #[must_use]
    pub const fn user(&self) -> Option<&User> {
        match self {
            Self::LoggedOut => None,
            Self::Cached(user) | Self::Verified(user) => Some(user),
        }
    }

    #[must_use]
    pub fn into_user(self) -> Option<User> {
        match self {
            Self::LoggedOut => None,
            Self::Cached(user) | Self::Verified(user) => Some(user),
        }
    }

    #[must_use]
    pub const fn is_logged_in(&self) -> bool {
        !matches!(self, Self::LoggedOut)
    }
}

/// Remote confirmation of a user record.
pub trait UserLookup: Send + Sync {
    /// `Ok(None)` means the backend does not know the email.
    fn lookup_user(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<Option<User>, BackendError>> + Send;
}

impl UserLookup for BackendClient {
    fn lookup_user(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<Option<User>, BackendError>> + Send {
        self.get_user(email)
    }
}

/// The auth cache kept in a visitor's session.
pub struct SessionCache<'a> {
    session: &'a Session,
    reverify: Duration,
}

impl<'a> SessionCache<'a> {
    /// `reverify` is how long a remote confirmation stays fresh; zero
    /// confirms on every call to [`resolve`](Self::resolve).
    #[must_use]
    pub const fn new(session: &'a Session, reverify: Duration) -> Self {
        Self { session, reverify }
    }

    /// Resolve the auth state for this request, confirming the cached user
    /// with `lookup` unless the last confirmation is still fresh.
    pub async fn resolve<L: UserLookup>(&self, lookup: &L) -> AuthState {
        let Some(email) = self.read::<String>(session_keys::USER_EMAIL).await else {
            return AuthState::LoggedOut;
        };
        let cached = self.read::<User>(session_keys::USER_DATA).await;

        if let Some(user) = &cached
            && self.is_fresh().await
        {
            return AuthState::Verified(user.clone());
        }

        match lookup.lookup_user(&email).await {
            Ok(Some(user)) => {
                if let Err(e) = self.store(&user).await {
                    tracing::warn!(error = %e, "Failed to refresh cached user");
                }
                AuthState::Verified(user)
            }
            Ok(None) => {
                tracing::warn!(%email, "Backend does not know the signed-in user, keeping cache");
                cached.map_or(AuthState::LoggedOut, AuthState::Cached)
            }
            Err(e) => {
                tracing::warn!(%email, error = %e, "User verification failed, keeping cache");
                cached.map_or(AuthState::LoggedOut, AuthState::Cached)
            }
        }
    }

    /// Sign `user` in on this session.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be modified.
    pub async fn login(&self, user: User) -> Result<AuthState, SessionError> {
        self.session.cycle_id().await?;
        self.session
            .insert(session_keys::USER_EMAIL, &user.email)
            .await?;
        self.store(&user).await?;
        Ok(AuthState::Verified(user))
    }

    /// Replace the cached record without contacting the backend, so the
    /// page reflects an edit before the backend has caught up.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be modified.
    pub async fn update_cached_user(&self, user: &User) -> Result<(), SessionError> {
        self.session.insert(session_keys::USER_DATA, user).await
    }

    /// Sign out and drop the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be modified.
    pub async fn logout(&self) -> Result<(), SessionError> {
        self.session
            .remove::<String>(session_keys::USER_EMAIL)
            .await?;
        self.session.remove::<User>(session_keys::USER_DATA).await?;
        self.session.remove::<i64>(session_keys::VERIFIED_AT).await?;
        self.session.flush().await
    }

    async fn store(&self, user: &User) -> Result<(), SessionError> {
        self.session.insert(session_keys::USER_DATA, user).await?;
        self.session
            .insert(session_keys::VERIFIED_AT, chrono::Utc::now().timestamp())
            .await
    }

    async fn is_fresh(&self) -> bool {
        if self.reverify.is_zero() {
            return false;
        }
        let Some(verified_at) = self.read::<i64>(session_keys::VERIFIED_AT).await else {
            return false;
        };
        let age = chrono::Utc::now().timestamp().saturating_sub(verified_at);
        u64::try_from(age).is_ok_and(|age| age < self.reverify.as_secs())
    }

    /// Read a key, treating store errors and undecodable values as absent.
    async fn read<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.session.get::<T>(key).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key, error = %e, "Failed to read session key");
                None
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use dompee_core::Role;
    use tower_sessions::MemoryStore;

    use super::*;

    enum Reply {
        Found(User),
        Unknown,
        Down,
    }

    struct FakeLookup {
        reply: Reply,
        calls: AtomicUsize,
    }

    impl FakeLookup {
        fn new(reply: Reply) -> Self {
            Self {
                reply,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl UserLookup for FakeLookup {
        fn lookup_user(
            &self,
            _email: &str,
        ) -> impl Future<Output = Result<Option<User>, BackendError>> + Send {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let result = match &self.reply {
                Reply::Found(user) => Ok(Some(user.clone())),
                Reply::Unknown => Ok(None),
                Reply::Down => Err(BackendError::Status { status: 503 }),
            };
            std::future::ready(result)
        }
    }

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    fn user(first_name: &str) -> User {
        User {
            userid: "2".to_string(),
            first_name: first_name.to_string(),
            last_name: "Doe".to_string(),
            email: "john@example.com".to_string(),
            phone: String::new(),
            address: String::new(),
            role: Role::User,
        }
    }

    #[tokio::test]
    async fn test_empty_session_is_logged_out() {
        let session = session();
        let lookup = FakeLookup::new(Reply::Found(user("John")));
        let state = SessionCache::new(&session, Duration::ZERO)
            .resolve(&lookup)
            .await;
        assert_eq!(state, AuthState::LoggedOut);
        assert_eq!(lookup.calls(), 0);
    }

    #[tokio::test]
    async fn test_login_stores_keys_and_verifies() {
        let session = session();
        let cache = SessionCache::new(&session, Duration::ZERO);
        let state = cache.login(user("John")).await.unwrap();
        assert_eq!(state, AuthState::Verified(user("John")));

        let email: Option<String> = session.get(session_keys::USER_EMAIL).await.unwrap();
        assert_eq!(email.as_deref(), Some("john@example.com"));
        let cached: Option<User> = session.get(session_keys::USER_DATA).await.unwrap();
        assert_eq!(cached, Some(user("John")));
    }

    #[tokio::test]
    async fn test_resolve_refreshes_cache_from_backend() {
        let session = session();
        let cache = SessionCache::new(&session, Duration::ZERO);
        cache.login(user("John")).await.unwrap();

        let lookup = FakeLookup::new(Reply::Found(user("Johnny")));
        let state = cache.resolve(&lookup).await;
        assert_eq!(state, AuthState::Verified(user("Johnny")));

        let cached: Option<User> = session.get(session_keys::USER_DATA).await.unwrap();
        assert_eq!(cached.unwrap().first_name, "Johnny");
    }

    #[tokio::test]
    async fn test_failed_verification_keeps_cached_user() {
        let session = session();
        let cache = SessionCache::new(&session, Duration::ZERO);
        cache.login(user("John")).await.unwrap();

        let down = FakeLookup::new(Reply::Down);
        assert_eq!(cache.resolve(&down).await, AuthState::Cached(user("John")));

        let unknown = FakeLookup::new(Reply::Unknown);
        assert_eq!(
            cache.resolve(&unknown).await,
            AuthState::Cached(user("John"))
        );

        let email: Option<String> = session.get(session_keys::USER_EMAIL).await.unwrap();
        assert!(email.is_some());
    }

    #[tokio::test]
    async fn test_email_without_cache_needs_backend() {
        let session = session();
        session
            .insert(session_keys::USER_EMAIL, "john@example.com")
            .await
            .unwrap();
        let cache = SessionCache::new(&session, Duration::ZERO);

        let down = FakeLookup::new(Reply::Down);
        assert_eq!(cache.resolve(&down).await, AuthState::LoggedOut);

        let up = FakeLookup::new(Reply::Found(user("John")));
        assert_eq!(cache.resolve(&up).await, AuthState::Verified(user("John")));
    }

    #[tokio::test]
    async fn test_zero_window_verifies_every_time() {
        let session = session();
        let cache = SessionCache::new(&session, Duration::ZERO);
        cache.login(user("John")).await.unwrap();

        let lookup = FakeLookup::new(Reply::Found(user("John")));
        cache.resolve(&lookup).await;
        cache.resolve(&lookup).await;
        assert_eq!(lookup.calls(), 2);
    }

    #[tokio::test]
    async fn test_fresh_confirmation_skips_backend() {
        let session = session();
        let cache = SessionCache::new(&session, Duration::from_secs(300));
        cache.login(user("John")).await.unwrap();

        let lookup = FakeLookup::new(Reply::Down);
        assert_eq!(cache.resolve(&lookup).await, AuthState::Verified(user("John")));
        assert_eq!(lookup.calls(), 0);
    }

    #[tokio::test]
    async fn test_update_cached_user() {
        let session = session();
        let cache = SessionCache::new(&session, Duration::ZERO);
        cache.login(user("John")).await.unwrap();
        cache.update_cached_user(&user("Jon")).await.unwrap();

        let down = FakeLookup::new(Reply::Down);
        assert_eq!(cache.resolve(&down).await, AuthState::Cached(user("Jon")));
    }

    #[tokio::test]
    async fn test_logout_clears_keys() {
        let session = session();
        let cache = SessionCache::new(&session, Duration::ZERO);
        cache.login(user("John")).await.unwrap();
        cache.logout().await.unwrap();

        let email: Option<String> = session.get(session_keys::USER_EMAIL).await.unwrap();
        let cached: Option<User> = session.get(session_keys::USER_DATA).await.unwrap();
        assert!(email.is_none());
        assert!(cached.is_none());

        let lookup = FakeLookup::new(Reply::Found(user("John")));
        assert_eq!(cache.resolve(&lookup).await, AuthState::LoggedOut);
    }

    #[test]
    fn test_auth_state_accessors() {
        assert!(!AuthState::LoggedOut.is_logged_in());
        assert_eq!(AuthState::LoggedOut.user(), None);
        let state = AuthState::Cached(user("John"));
        assert!(state.is_logged_in());
        assert_eq!(state.into_user(), Some(user("John")));
    }
}
