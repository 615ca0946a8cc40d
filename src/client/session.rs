use std::sync::{Arc, RwLock};

/// Mutable session state owned by one client instance.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub connected: bool,
    pub username: String,
    pub token: String,
}

/// Shared handle to the session state
///
/// Read by foreground calls (to pull the token into the signed fields) and
/// by the heartbeat task (to observe disconnection). The lock is only held
/// for short copies; never across I/O.
#[derive(Debug, Clone, Default)]
pub struct Session {
    inner: Arc<RwLock<SessionState>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Populate the session atomically on a successful login.
    pub fn establish(&self, username: String, token: String) {
        let mut state = self.inner.write().unwrap_or_else(|e| e.into_inner());
        state.connected = true;
        state.username = username;
        state.token = token;
    }

    /// Clear the session, marking it disconnected.
    pub fn clear(&self) {
        let mut state = self.inner.write().unwrap_or_else(|e| e.into_inner());
        *state = SessionState::default();
    }

    pub fn is_connected(&self) -> bool {
        self.inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .connected
    }

    pub fn username(&self) -> String {
        self.inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .username
            .clone()
    }

    /// Current session token; empty until login succeeds.
    pub fn token(&self) -> String {
        self.inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .token
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn establish_sets_all_fields_together() {
        let session = Session::new();
        assert!(!session.is_connected());
        assert_eq!(session.token(), "");

        session.establish("alice".to_string(), "tok123".to_string());
        assert!(session.is_connected());
        assert_eq!(session.username(), "alice");
        assert_eq!(session.token(), "tok123");
    }

    #[test]
    fn clear_resets_to_empty() {
        let session = Session::new();
        session.establish("alice".to_string(), "tok123".to_string());
        session.clear();
        assert!(!session.is_connected());
        assert_eq!(session.username(), "");
        assert_eq!(session.token(), "");
    }
}
