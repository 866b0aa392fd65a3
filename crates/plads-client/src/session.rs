use crate::storage::{SessionStore, StoredSession};
use chrono::{DateTime, Duration, Utc};
use std::sync::{Arc, Mutex, Weak};
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Default session lifetime when the caller does not supply an
/// expiration horizon: 1 hour, matching the server token TTL.
const DEFAULT_TTL_SECS: i64 = 3600;

struct ActiveSession {
    user_id: Uuid,
    token: String,
    expiration: DateTime<Utc>,
    /// The single scheduled logout. Replaced, never duplicated.
    timer: JoinHandle<()>,
}

struct SessionState {
    active: Option<ActiveSession>,
    /// Bumped on every transition so a timer that lost the abort race
    /// cannot log out a newer session.
    epoch: u64,
}

struct Inner {
    store: SessionStore,
    state: Mutex<SessionState>,
}

/// Client-side session state machine: LoggedOut (no token) or LoggedIn
/// (token with a future horizon). Owns its logout timer and the durable
/// storage entry. Must be used inside a tokio runtime.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<Inner>,
}

impl SessionManager {
    pub fn new(store: SessionStore) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                state: Mutex::new(SessionState {
                    active: None,
                    epoch: 0,
                }),
            }),
        }
    }

    /// Transition to LoggedIn. Without an explicit horizon the session
    /// expires in one hour. Persists the entry and re-arms the logout
    /// timer; any previously scheduled logout is cancelled first.
    pub fn login(&self, user_id: Uuid, token: &str, expiration: Option<DateTime<Utc>>) {
        let expiration =
            expiration.unwrap_or_else(|| Utc::now() + Duration::seconds(DEFAULT_TTL_SECS));

        if let Err(e) = self.inner.store.save(&StoredSession {
            user_id,
            token: token.to_string(),
            expiration,
        }) {
            tracing::warn!("Failed to persist session: {:#}", e);
        }

        let mut state = self.inner.state.lock().unwrap();
        if let Some(old) = state.active.take() {
            old.timer.abort();
        }
        state.epoch += 1;

        let remaining = (expiration - Utc::now())
            .to_std()
            .unwrap_or(std::time::Duration::ZERO);
        let timer = self.spawn_logout_timer(remaining, state.epoch);

        state.active = Some(ActiveSession {
            user_id,
            token: token.to_string(),
            expiration,
            timer,
        });
    }

    /// Transition to LoggedOut: clears state, storage, and the pending
    /// timer.
    pub fn logout(&self) {
        self.logout_if_epoch(None);
    }

    /// Clear the session, optionally only when still at the expected
    /// epoch. A timer that lost the abort race carries its own epoch
    /// and must not log out a newer session.
    fn logout_if_epoch(&self, expected_epoch: Option<u64>) {
        let mut state = self.inner.state.lock().unwrap();
        if let Some(expected) = expected_epoch {
            if state.epoch != expected {
                return;
            }
        }
        if let Some(old) = state.active.take() {
            old.timer.abort();
        }
        state.epoch += 1;
        drop(state);

        if let Err(e) = self.inner.store.clear() {
            tracing::warn!("Failed to clear stored session: {:#}", e);
        }
    }

    /// Rehydrate from durable storage. Call once at process start: logs
    /// in with the stored values iff the stored horizon is still in the
    /// future. Returns whether a session was restored.
    pub fn restore(&self) -> bool {
        match self.inner.store.load() {
            Some(stored) if stored.expiration > Utc::now() => {
                self.login(stored.user_id, &stored.token, Some(stored.expiration));
                true
            }
            _ => false,
        }
    }

    pub fn is_logged_in(&self) -> bool {
        self.inner.state.lock().unwrap().active.is_some()
    }

    pub fn token(&self) -> Option<String> {
        let state = self.inner.state.lock().unwrap();
        state.active.as_ref().map(|s| s.token.clone())
    }

    pub fn user_id(&self) -> Option<Uuid> {
        let state = self.inner.state.lock().unwrap();
        state.active.as_ref().map(|s| s.user_id)
    }

    pub fn expiration(&self) -> Option<DateTime<Utc>> {
        let state = self.inner.state.lock().unwrap();
        state.active.as_ref().map(|s| s.expiration)
    }

    fn spawn_logout_timer(&self, remaining: std::time::Duration, epoch: u64) -> JoinHandle<()> {
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        tokio::spawn(async move {
            tokio::time::sleep(remaining).await;
            if let Some(inner) = weak.upgrade() {
                tracing::info!("Session expired, logging out");
                SessionManager { inner }.logout_if_epoch(Some(epoch));
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration as StdDuration;
    use tempfile::TempDir;

    fn manager_in(dir: &TempDir) -> SessionManager {
        SessionManager::new(SessionStore::new(dir.path().join("session.json")))
    }

    #[tokio::test]
    async fn test_login_and_logout_transitions() {
        let dir = TempDir::new().unwrap();
        let manager = manager_in(&dir);
        assert!(!manager.is_logged_in());

        let user_id = Uuid::new_v4();
        manager.login(user_id, "jwt-token", None);
        assert!(manager.is_logged_in());
        assert_eq!(manager.user_id(), Some(user_id));
        assert_eq!(manager.token().as_deref(), Some("jwt-token"));

        manager.logout();
        assert!(!manager.is_logged_in());
        assert_eq!(manager.token(), None);
        assert_eq!(manager.user_id(), None);
        assert_eq!(manager.expiration(), None);
    }

    #[tokio::test]
    async fn test_login_defaults_horizon_to_one_hour() {
        let dir = TempDir::new().unwrap();
        let manager = manager_in(&dir);

        manager.login(Uuid::new_v4(), "jwt-token", None);
        let expiration = manager.expiration().unwrap();
        let ttl = expiration - Utc::now();
        assert!(ttl > Duration::minutes(59));
        assert!(ttl <= Duration::minutes(60));
    }

    #[tokio::test]
    async fn test_login_persists_and_logout_clears_entry() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));
        let manager = SessionManager::new(store.clone());

        let user_id = Uuid::new_v4();
        manager.login(user_id, "jwt-token", None);
        let stored = store.load().expect("entry should be persisted");
        assert_eq!(stored.user_id, user_id);
        assert_eq!(stored.token, "jwt-token");

        manager.logout();
        assert!(store.load().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_fires_logout_at_horizon() {
        let dir = TempDir::new().unwrap();
        let manager = manager_in(&dir);

        manager.login(
            Uuid::new_v4(),
            "jwt-token",
            Some(Utc::now() + Duration::minutes(10)),
        );

        tokio::time::sleep(StdDuration::from_secs(9 * 60)).await;
        assert!(manager.is_logged_in());

        tokio::time::sleep(StdDuration::from_secs(2 * 60)).await;
        assert!(!manager.is_logged_in());
    }

    #[tokio::test(start_paused = true)]
    async fn test_relogin_rearms_a_single_timer() {
        let dir = TempDir::new().unwrap();
        let manager = manager_in(&dir);

        manager.login(
            Uuid::new_v4(),
            "first",
            Some(Utc::now() + Duration::minutes(10)),
        );
        manager.login(
            Uuid::new_v4(),
            "second",
            Some(Utc::now() + Duration::minutes(30)),
        );

        // If the first timer were still armed it would fire at 10min
        tokio::time::sleep(StdDuration::from_secs(15 * 60)).await;
        assert!(manager.is_logged_in());
        assert_eq!(manager.token().as_deref(), Some("second"));

        tokio::time::sleep(StdDuration::from_secs(20 * 60)).await;
        assert!(!manager.is_logged_in());
    }

    #[tokio::test(start_paused = true)]
    async fn test_logout_cancels_pending_timer() {
        let dir = TempDir::new().unwrap();
        let manager = manager_in(&dir);

        manager.login(
            Uuid::new_v4(),
            "jwt-token",
            Some(Utc::now() + Duration::minutes(10)),
        );
        manager.logout();

        manager.login(
            Uuid::new_v4(),
            "fresh",
            Some(Utc::now() + Duration::minutes(30)),
        );

        // The cancelled timer must not log out the fresh session
        tokio::time::sleep(StdDuration::from_secs(15 * 60)).await;
        assert!(manager.is_logged_in());
    }

    #[tokio::test]
    async fn test_restore_with_future_expiration_logs_in() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));
        let user_id = Uuid::new_v4();
        store
            .save(&StoredSession {
                user_id,
                token: "stored-token".to_string(),
                expiration: Utc::now() + Duration::minutes(10),
            })
            .unwrap();

        let manager = SessionManager::new(store);
        assert!(manager.restore());
        assert!(manager.is_logged_in());
        assert_eq!(manager.user_id(), Some(user_id));
        assert_eq!(manager.token().as_deref(), Some("stored-token"));
    }

    #[tokio::test]
    async fn test_restore_with_past_expiration_stays_logged_out() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));
        store
            .save(&StoredSession {
                user_id: Uuid::new_v4(),
                token: "stale-token".to_string(),
                expiration: Utc::now() - Duration::minutes(10),
            })
            .unwrap();

        let manager = SessionManager::new(store);
        assert!(!manager.restore());
        assert!(!manager.is_logged_in());
    }

    #[tokio::test]
    async fn test_restore_with_missing_or_corrupt_entry_does_not_panic() {
        let dir = TempDir::new().unwrap();
        let manager = manager_in(&dir);
        assert!(!manager.restore());

        std::fs::write(dir.path().join("session.json"), "garbage").unwrap();
        assert!(!manager.restore());
        assert!(!manager.is_logged_in());
    }
}
