use chrono::{Duration, Utc};
use sqlx::SqlitePool;

use crate::error::Result;

pub mod session;

pub use session::{Session, SessionStore};

/// Issues and validates opaque session tokens. Passwords and login flows
/// belong to the identity system; this only maps a token to a user.
pub struct AuthService {
    session_store: SessionStore,
}

impl AuthService {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            session_store: SessionStore::new(pool),
        }
    }

    /// Returns the raw token. Only its hash is stored.
    pub async fn create_session(&self, user_id: i64, duration_hours: i64) -> Result<String> {
        let token = generate_token();
        let expires_at = Utc::now() + Duration::hours(duration_hours);

        self.session_store.create(user_id, &token, expires_at).await?;

        Ok(token)
    }

    pub async fn validate_session(&self, token: &str) -> Result<Option<Session>> {
        self.session_store.find_by_token(token).await
    }

    pub async fn cleanup_expired_sessions(&self) -> Result<u64> {
        self.session_store.cleanup_expired().await
    }
}

fn generate_token() -> String {
    use rand::RngCore;
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}
