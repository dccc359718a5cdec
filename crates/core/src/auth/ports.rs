//! Port interfaces for session management

use async_trait::async_trait;
use homedash_domain::{Credentials, Result, UserRecord};

/// Credential exchange with the backend.
#[async_trait]
pub trait AuthGateway: Send + Sync {
    /// Exchange a password or an existing session token for a user.
    /// Rejections surface as `HomedashError::Auth`.
    async fn authenticate(&self, credentials: &Credentials) -> Result<UserRecord>;

    /// Revoke `session_token` on the backend.
    async fn invalidate_session(&self, session_token: &str) -> Result<()>;
}

/// Persistence for the current session token across restarts.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self) -> Result<Option<String>>;

    async fn save(&self, session_token: &str) -> Result<()>;

    async fn clear(&self) -> Result<()>;
}
