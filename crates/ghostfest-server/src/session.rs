//! In-memory admin sessions keyed by bearer token.
//!
//! Tokens are random UUIDs handed out at login. They expire after a fixed
//! lifetime and are forgotten on restart.

use ghostfest_core::AdminSession;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

struct SessionEntry {
    session: AdminSession,
    expires_at: Instant,
}

/// Token to session map shared by all handlers.
pub struct SessionStore {
    sessions: RwLock<HashMap<String, SessionEntry>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Issue a new token for an authenticated user.
    pub async fn create(&self, session: AdminSession) -> String {
        let token = uuid::Uuid::new_v4().to_string();
        let mut sessions = self.sessions.write().await;
        let now = Instant::now();
        sessions.retain(|_, entry| entry.expires_at > now);
        sessions.insert(
            token.clone(),
            SessionEntry {
                session,
                expires_at: now + self.ttl,
            },
        );
        token
    }

    /// Look up a live session.
    pub async fn get(&self, token: &str) -> Option<AdminSession> {
        let sessions = self.sessions.read().await;
        sessions
            .get(token)
            .filter(|entry| entry.expires_at > Instant::now())
            .map(|entry| entry.session.clone())
    }

    /// End a session. Returns the session if the token was live.
    pub async fn remove(&self, token: &str) -> Option<AdminSession> {
        let mut sessions = self.sessions.write().await;
        sessions
            .remove(token)
            .filter(|entry| entry.expires_at > Instant::now())
            .map(|entry| entry.session)
    }
}
