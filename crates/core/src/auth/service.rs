//! Auth service - anonymous ⇄ authenticated session state
//!
//! State is swapped under a short write lock; listeners run after the lock
//! is released and receive an owned snapshot.

use std::sync::Arc;

use homedash_domain::{AuthState, Credentials, HomedashError, Result, UserRecord};
use parking_lot::RwLock;
use tracing::{info, warn};

use super::ports::{AuthGateway, SessionStore};
use crate::events::{Listener, ListenerHandle, ListenerRegistry};

pub struct AuthService {
    gateway: Arc<dyn AuthGateway>,
    sessions: Arc<dyn SessionStore>,
    state: RwLock<AuthState>,
    listeners: ListenerRegistry<AuthState>,
}

impl AuthService {
    pub fn new(gateway: Arc<dyn AuthGateway>, sessions: Arc<dyn SessionStore>) -> Self {
        Self {
            gateway,
            sessions,
            state: RwLock::new(AuthState::anonymous()),
            listeners: ListenerRegistry::new(),
        }
    }

    /// Restore a persisted session, if any. Failures are logged and leave
    /// the service anonymous.
    pub async fn initialize(&self) {
        let token = match self.sessions.load().await {
            Ok(Some(token)) => token,
            Ok(None) => return,
            Err(err) => {
                warn!(error = %err, "Failed to read persisted session");
                return;
            }
        };

        if let Err(err) = self.login_with_session_token(&token).await {
            warn!(error = %err, "Failed to restore persisted session");
        }
    }

    /// On success the session token is persisted. On failure the state is
    /// left unchanged.
    pub async fn login(&self, username: &str, password: &str) -> Result<UserRecord> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(HomedashError::InvalidInput("username and password are required".into()));
        }

        let user = self.gateway.authenticate(&Credentials::password(username, password)).await?;
        self.transition(AuthState::authenticated(user.clone()));
        self.persist(&user.session_token).await;

        info!(user_id = %user.id, "User logged in");
        Ok(user)
    }

    /// On failure the persisted token is cleared and the service becomes
    /// anonymous before the error is returned.
    pub async fn login_with_session_token(&self, session_token: &str) -> Result<UserRecord> {
        match self.gateway.authenticate(&Credentials::session_token(session_token)).await {
            Ok(user) => {
                self.transition(AuthState::authenticated(user.clone()));
                info!(user_id = %user.id, "Session restored");
                Ok(user)
            }
            Err(err) => {
                self.clear_persisted().await;
                self.transition(AuthState::anonymous());
                Err(err)
            }
        }
    }

    /// Always ends anonymous with no persisted token; remote invalidation is
    /// best-effort.
    pub async fn logout(&self) {
        if let Some(token) = self.session_token() {
            if let Err(err) = self.gateway.invalidate_session(&token).await {
                warn!(error = %err, "Remote session invalidation failed");
            }
        }

        self.transition(AuthState::anonymous());
        self.clear_persisted().await;
        info!("User logged out");
    }

    /// Re-validate the current token. Any failure leaves the service
    /// anonymous with no persisted token and yields `None`.
    pub async fn refresh_session(&self) -> Option<UserRecord> {
        let token = self.session_token()?;

        match self.login_with_session_token(&token).await {
            Ok(user) => Some(user),
            Err(err) => {
                // login_with_session_token already cleared and notified
                warn!(error = %err, "Session refresh failed");
                None
            }
        }
    }

    /// React to an error from a backend call. Returns whether the caller
    /// may retry the failed operation.
    pub async fn handle_auth_error(&self, err: &HomedashError) -> bool {
        if err.is_invalid_session() {
            return self.refresh_session().await.is_some();
        }
        if err.is_unauthorized() {
            self.logout().await;
        }
        false
    }

    pub fn subscribe(&self, listener: Listener<AuthState>) -> ListenerHandle {
        self.listeners.subscribe(listener)
    }

    pub fn state(&self) -> AuthState {
        self.state.read().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.read().is_authenticated
    }

    pub fn current_user(&self) -> Option<UserRecord> {
        self.state.read().user.clone()
    }

    pub fn session_token(&self) -> Option<String> {
        self.state.read().session_token.clone()
    }

    fn transition(&self, next: AuthState) {
        {
            let mut state = self.state.write();
            *state = next.clone();
        }
        self.listeners.emit(&next);
    }

    async fn persist(&self, session_token: &str) {
        if let Err(err) = self.sessions.save(session_token).await {
            warn!(error = %err, "Failed to persist session token");
        }
    }

    async fn clear_persisted(&self) {
        if let Err(err) = self.sessions.clear().await {
            warn!(error = %err, "Failed to clear persisted session token");
        }
    }
}
