use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::TokenStore;
use crate::models::User;

/// Client-side record of the current identity and its credential.
///
/// `user` is only ever set while `token` is set, and `is_loading` is only true
/// between setting a token and hearing back from the profile lookup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub token: Option<String>,
    pub user: Option<User>,
    pub is_loading: bool,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    fn is_empty(&self) -> bool {
        self.token.is_none() && self.user.is_none() && !self.is_loading
    }
}

/// Resolves a bearer token to the profile it belongs to ("who am I")
#[async_trait]
pub trait ProfileSource: Send + Sync {
    async fn fetch_profile(&self, token: &str) -> Result<User>;
}

/// Owner of the session. All mutation goes through `login` and `logout`;
/// everything else observes through `subscribe` or the snapshot getters.
pub struct SessionStore {
    tokens: Arc<dyn TokenStore>,
    profiles: Arc<dyn ProfileSource>,
    state: watch::Sender<Session>,
}

impl SessionStore {
    pub fn new(tokens: Arc<dyn TokenStore>, profiles: Arc<dyn ProfileSource>) -> Self {
        let (state, _) = watch::channel(Session::default());
        Self {
            tokens,
            profiles,
            state,
        }
    }

    // =========================================================================
    // Mutators
    // =========================================================================

    /// Adopt a new bearer token: persist it, publish it, then resolve the profile.
    ///
    /// If the profile cannot be resolved the session is logged out again,
    /// including the persisted copy.
    pub async fn login(&self, token: impl Into<String>) {
        let token = token.into();
        if let Err(e) = self.tokens.save(&token) {
            warn!(error = %e, "Failed to persist token");
        }
        self.state.send_replace(Session {
            token: Some(token.clone()),
            user: None,
            is_loading: true,
        });
        info!("Session token set, resolving profile");
        self.resolve_profile(token).await;
    }

    /// Clear the token and profile, in memory and in storage.
    /// Subscribers are only notified if something actually changed.
    pub fn logout(&self) {
        if let Err(e) = self.tokens.clear() {
            warn!(error = %e, "Failed to clear persisted token");
        }
        let changed = self.state.send_if_modified(|session| {
            if session.is_empty() {
                return false;
            }
            *session = Session::default();
            true
        });
        if changed {
            info!("Logged out");
        }
    }

    /// Load a previously persisted token and publish it in the loading state.
    /// Returns the token so the caller can resolve it with `resolve_profile`.
    pub fn restore_persisted(&self) -> Option<String> {
        let token = match self.tokens.load() {
            Ok(Some(token)) => token,
            Ok(None) => {
                debug!("No persisted token");
                return None;
            }
            Err(e) => {
                warn!(error = %e, "Failed to read persisted token");
                return None;
            }
        };
        self.state.send_replace(Session {
            token: Some(token.clone()),
            user: None,
            is_loading: true,
        });
        Some(token)
    }

    /// Restore the persisted session, if any, and resolve its profile.
    /// Returns whether a usable session came out of it.
    pub async fn restore(&self) -> bool {
        match self.restore_persisted() {
            Some(token) => {
                self.resolve_profile(token).await;
                self.is_authenticated()
            }
            None => false,
        }
    }

    /// Look up the profile for `token` and apply the outcome.
    ///
    /// The outcome is dropped if the session moved on to another token (or was
    /// logged out) while the request was in flight.
    pub async fn resolve_profile(&self, token: String) {
        let result = self.profiles.fetch_profile(&token).await;

        match result {
            Ok(user) => {
                let applied = self.state.send_if_modified(|session| {
                    if session.token.as_deref() != Some(token.as_str()) {
                        return false;
                    }
                    session.user = Some(user);
                    session.is_loading = false;
                    true
                });
                if applied {
                    info!("Profile resolved");
                } else {
                    debug!("Discarding profile for a superseded token");
                }
            }
            Err(e) => {
                let cleared = self.state.send_if_modified(|session| {
                    if session.token.as_deref() != Some(token.as_str()) {
                        return false;
                    }
                    if let Err(e) = self.tokens.clear() {
                        warn!(error = %e, "Failed to clear persisted token");
                    }
                    *session = Session::default();
                    true
                });
                if cleared {
                    warn!(error = %e, "Profile resolution failed, session cleared");
                } else {
                    debug!(error = %e, "Ignoring failed lookup for a superseded token");
                }
            }
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> Session {
        self.state.borrow().clone()
    }

    pub fn token(&self) -> Option<String> {
        self.state.borrow().token.clone()
    }

    pub fn user(&self) -> Option<User> {
        self.state.borrow().user.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use crate::auth::{FileTokenStore, MemoryTokenStore};
    use tokio::sync::Notify;

    fn user(email: &str) -> User {
        User {
            id: 1,
            email: email.to_string(),
            name: None,
            plan: None,
            profile_photo_url: None,
        }
    }

    /// Accepts exactly one token
    struct FixedProfiles {
        valid: String,
    }

    #[async_trait]
    impl ProfileSource for FixedProfiles {
        async fn fetch_profile(&self, token: &str) -> Result<User> {
            if token == self.valid {
                Ok(user("ada@example.com"))
            } else {
                Err(ApiError::Unauthorized.into())
            }
        }
    }

    /// Blocks every lookup until released
    struct GatedProfiles {
        gate: Notify,
        succeed: bool,
    }

    #[async_trait]
    impl ProfileSource for GatedProfiles {
        async fn fetch_profile(&self, _token: &str) -> Result<User> {
            self.gate.notified().await;
            if self.succeed {
                Ok(user("ada@example.com"))
            } else {
                Err(ApiError::Unauthorized.into())
            }
        }
    }

    /// Storage that is always unavailable
    struct FailingTokenStore;

    impl TokenStore for FailingTokenStore {
        fn load(&self) -> Result<Option<String>> {
            anyhow::bail!("storage unavailable")
        }

        fn save(&self, _token: &str) -> Result<()> {
            anyhow::bail!("storage unavailable")
        }

        fn clear(&self) -> Result<()> {
            anyhow::bail!("storage unavailable")
        }
    }

    /// Records the published token each time storage is touched
    #[derive(Default)]
    struct PeekingTokenStore {
        session: std::sync::OnceLock<watch::Receiver<Session>>,
        seen: std::sync::Mutex<Vec<Option<String>>>,
    }

    impl PeekingTokenStore {
        fn peek(&self) {
            if let Some(rx) = self.session.get() {
                let token = rx.borrow().token.clone();
                self.seen.lock().unwrap().push(token);
            }
        }
    }

    impl TokenStore for PeekingTokenStore {
        fn load(&self) -> Result<Option<String>> {
            Ok(None)
        }

        fn save(&self, _token: &str) -> Result<()> {
            self.peek();
            Ok(())
        }

        fn clear(&self) -> Result<()> {
            self.peek();
            Ok(())
        }
    }

    fn store_with(tokens: Arc<dyn TokenStore>, valid: &str) -> SessionStore {
        SessionStore::new(
            tokens,
            Arc::new(FixedProfiles {
                valid: valid.to_string(),
            }),
        )
    }

    // -------------------------------------------------------------------------
    // Login / logout
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_login_resolves_profile() {
        let tokens = Arc::new(MemoryTokenStore::new());
        let store = store_with(tokens.clone(), "good");

        store.login("good").await;

        let session = store.snapshot();
        assert_eq!(session.token.as_deref(), Some("good"));
        assert_eq!(session.user.map(|u| u.email).as_deref(), Some("ada@example.com"));
        assert!(!session.is_loading);
        assert_eq!(tokens.load().unwrap().as_deref(), Some("good"));
    }

    #[tokio::test]
    async fn test_login_with_rejected_token_logs_out() {
        let tokens = Arc::new(MemoryTokenStore::new());
        let store = store_with(tokens.clone(), "good");

        store.login("abc").await;

        assert_eq!(store.snapshot(), Session::default());
        assert_eq!(tokens.load().unwrap(), None);
    }

    #[tokio::test]
    async fn test_rejected_token_clears_only_that_token_for_many_inputs() {
        for token in ["", "x", "abc", "eyJhbGciOi.payload.sig", "🔑"] {
            let tokens = Arc::new(MemoryTokenStore::new());
            let store = store_with(tokens.clone(), "the-only-valid-token");
            store.login(token).await;
            assert_eq!(store.snapshot(), Session::default(), "token {:?}", token);
            assert_eq!(tokens.load().unwrap(), None);
        }
    }

    #[tokio::test]
    async fn test_logout_is_idempotent() {
        let tokens = Arc::new(MemoryTokenStore::new());
        let store = store_with(tokens.clone(), "good");
        store.login("good").await;

        store.logout();
        let once = store.snapshot();
        store.logout();
        let twice = store.snapshot();

        assert_eq!(once, Session::default());
        assert_eq!(once, twice);
        assert_eq!(tokens.load().unwrap(), None);
    }

    #[tokio::test]
    async fn test_storage_failure_does_not_block_login_or_logout() {
        let store = store_with(Arc::new(FailingTokenStore), "good");

        store.login("good").await;
        let session = store.snapshot();
        assert_eq!(session.token.as_deref(), Some("good"));
        assert_eq!(session.user.map(|u| u.email).as_deref(), Some("ada@example.com"));
        assert!(!session.is_loading);

        store.logout();
        assert_eq!(store.snapshot(), Session::default());
        assert!(!store.restore().await);
    }

    #[tokio::test]
    async fn test_storage_is_written_outside_the_session_lock() {
        let tokens = Arc::new(PeekingTokenStore::default());
        let store = store_with(tokens.clone(), "good");
        assert!(tokens.session.set(store.subscribe()).is_ok());

        store.login("good").await;
        store.logout();

        let seen = tokens.seen.lock().unwrap().clone();
        assert_eq!(seen, vec![None, Some("good".to_string())]);
    }

    #[tokio::test]
    async fn test_logout_when_logged_out_does_not_notify() {
        let store = store_with(Arc::new(MemoryTokenStore::new()), "good");
        let rx = store.subscribe();
        store.logout();
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn test_subscribers_see_loading_then_resolved() {
        let profiles = Arc::new(GatedProfiles {
            gate: Notify::new(),
            succeed: true,
        });
        let store = Arc::new(SessionStore::new(
            Arc::new(MemoryTokenStore::new()),
            profiles.clone(),
        ));
        let mut rx = store.subscribe();

        let task = tokio::spawn({
            let store = Arc::clone(&store);
            async move { store.login("good").await }
        });

        rx.changed().await.unwrap();
        {
            let loading = rx.borrow_and_update();
            assert_eq!(loading.token.as_deref(), Some("good"));
            assert!(loading.user.is_none());
            assert!(loading.is_loading);
        }

        profiles.gate.notify_one();
        task.await.unwrap();

        let done = rx.borrow_and_update().clone();
        assert!(done.user.is_some());
        assert!(!done.is_loading);
    }

    #[tokio::test]
    async fn test_logout_during_resolution_wins() {
        let profiles = Arc::new(GatedProfiles {
            gate: Notify::new(),
            succeed: true,
        });
        let tokens = Arc::new(MemoryTokenStore::new());
        let store = Arc::new(SessionStore::new(tokens.clone(), profiles.clone()));
        let mut rx = store.subscribe();

        let task = tokio::spawn({
            let store = Arc::clone(&store);
            async move { store.login("good").await }
        });
        rx.changed().await.unwrap();

        store.logout();
        profiles.gate.notify_one();
        task.await.unwrap();

        assert_eq!(store.snapshot(), Session::default());
        assert_eq!(tokens.load().unwrap(), None);
    }

    #[tokio::test]
    async fn test_stale_failure_does_not_clear_newer_token() {
        let profiles = Arc::new(GatedProfiles {
            gate: Notify::new(),
            succeed: false,
        });
        let tokens = Arc::new(MemoryTokenStore::new());
        let store = Arc::new(SessionStore::new(tokens.clone(), profiles.clone()));
        let mut rx = store.subscribe();

        let task = tokio::spawn({
            let store = Arc::clone(&store);
            async move { store.login("old").await }
        });
        rx.changed().await.unwrap();

        // A second token arrives before the first lookup fails
        store.state.send_modify(|s| s.token = Some("new".to_string()));
        tokens.save("new").unwrap();

        profiles.gate.notify_one();
        task.await.unwrap();

        assert_eq!(store.token().as_deref(), Some("new"));
        assert_eq!(tokens.load().unwrap().as_deref(), Some("new"));
    }

    // -------------------------------------------------------------------------
    // Persistence
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_token_survives_restart() {
        let dir = tempfile::tempdir().unwrap();

        let first = store_with(Arc::new(FileTokenStore::new(dir.path().to_path_buf())), "T");
        first.login("T").await;
        drop(first);

        let second = store_with(Arc::new(FileTokenStore::new(dir.path().to_path_buf())), "T");
        assert!(!second.is_authenticated());
        assert!(second.restore().await);
        assert_eq!(second.token().as_deref(), Some("T"));
        assert!(second.user().is_some());

        second.logout();
        let third = store_with(Arc::new(FileTokenStore::new(dir.path().to_path_buf())), "T");
        assert!(!third.restore().await);
        assert_eq!(third.token(), None);
    }

    #[tokio::test]
    async fn test_restore_with_expired_token_purges_storage() {
        let tokens = Arc::new(MemoryTokenStore::with_token("expired"));
        let store = store_with(tokens.clone(), "good");

        assert!(!store.restore().await);
        assert_eq!(store.snapshot(), Session::default());
        assert_eq!(tokens.load().unwrap(), None);
    }

    #[tokio::test]
    async fn test_restore_persisted_publishes_loading() {
        let store = store_with(Arc::new(MemoryTokenStore::with_token("good")), "good");
        let token = store.restore_persisted();
        assert_eq!(token.as_deref(), Some("good"));
        assert!(store.is_loading());
        assert!(store.is_authenticated());
        assert!(store.user().is_none());
    }
}
