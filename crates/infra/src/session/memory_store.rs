use async_trait::async_trait;
use homedash_core::SessionStore;
use homedash_domain::Result;
use parking_lot::Mutex;

/// Keeps the session token for the lifetime of the process only.
#[derive(Default)]
pub struct MemorySessionStore {
    token: Mutex<Option<String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self) -> Result<Option<String>> {
        Ok(self.token.lock().clone())
    }

    async fn save(&self, session_token: &str) -> Result<()> {
        *self.token.lock() = Some(session_token.to_string());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.token.lock().take();
        Ok(())
    }
}
