//! Fake credential exchange and session persistence.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use homedash_core::{AuthGateway, Listener, SessionStore};
use homedash_domain::{AuthState, Credentials, HomedashError, Result, UserRecord};
use parking_lot::Mutex;

pub const GOOD_USER: &str = "good";
pub const GOOD_PASSWORD: &str = "good";
pub const GOOD_TOKEN: &str = "r:good-session";

pub fn user(token: &str) -> UserRecord {
    UserRecord {
        id: "user-1".into(),
        username: GOOD_USER.into(),
        email: Some("good@example.com".into()),
        session_token: token.into(),
        created_at: None,
        updated_at: None,
    }
}

/// Accepts `good`/`good` and any token in its valid set.
pub struct FakeAuthGateway {
    valid_tokens: Mutex<Vec<String>>,
    invalidated: Mutex<Vec<String>>,
    fail_invalidation: AtomicBool,
    authenticate_calls: AtomicUsize,
}

impl Default for FakeAuthGateway {
    fn default() -> Self {
        Self {
            valid_tokens: Mutex::new(vec![GOOD_TOKEN.to_string()]),
            invalidated: Mutex::new(Vec::new()),
            fail_invalidation: AtomicBool::new(false),
            authenticate_calls: AtomicUsize::new(0),
        }
    }
}

impl FakeAuthGateway {
    pub fn revoke_all(&self) {
        self.valid_tokens.lock().clear();
    }

    pub fn fail_invalidation(&self) {
        self.fail_invalidation.store(true, Ordering::SeqCst);
    }

    pub fn invalidated(&self) -> Vec<String> {
        self.invalidated.lock().clone()
    }

    pub fn authenticate_calls(&self) -> usize {
        self.authenticate_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuthGateway for FakeAuthGateway {
    async fn authenticate(&self, credentials: &Credentials) -> Result<UserRecord> {
        self.authenticate_calls.fetch_add(1, Ordering::SeqCst);
        match credentials {
            Credentials::Password { username, password } if username == GOOD_USER && password == GOOD_PASSWORD => {
                Ok(user(GOOD_TOKEN))
            }
            Credentials::Password { .. } => Err(HomedashError::Auth("Invalid username/password.".into())),
            Credentials::SessionToken { session_token } => {
                if self.valid_tokens.lock().iter().any(|t| t == session_token) {
                    Ok(user(session_token))
                } else {
                    Err(HomedashError::Auth("Invalid session token".into()))
                }
            }
        }
    }

    async fn invalidate_session(&self, session_token: &str) -> Result<()> {
        self.invalidated.lock().push(session_token.to_string());
        if self.fail_invalidation.load(Ordering::SeqCst) {
            return Err(HomedashError::Network("connection reset".into()));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemorySessions {
    token: Mutex<Option<String>>,
    fail_reads: AtomicBool,
}

impl MemorySessions {
    pub fn with_token(token: &str) -> Self {
        Self { token: Mutex::new(Some(token.to_string())), fail_reads: AtomicBool::new(false) }
    }

    pub fn failing_reads() -> Self {
        Self { token: Mutex::new(None), fail_reads: AtomicBool::new(true) }
    }

    pub fn current(&self) -> Option<String> {
        self.token.lock().clone()
    }
}

#[async_trait]
impl SessionStore for MemorySessions {
    async fn load(&self) -> Result<Option<String>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(HomedashError::Internal("session file unreadable".into()));
        }
        Ok(self.token.lock().clone())
    }

    async fn save(&self, session_token: &str) -> Result<()> {
        *self.token.lock() = Some(session_token.to_string());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        *self.token.lock() = None;
        Ok(())
    }
}

/// Listener that records every state it receives.
pub fn recording_listener() -> (Arc<Mutex<Vec<AuthState>>>, Listener<AuthState>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    (seen, Arc::new(move |state: &AuthState| sink.lock().push(state.clone())))
}
