//! Per-session customer context.
//!
//! A successful login opens a session identified by an opaque bearer token.
//! The session middleware resolves the token back to a [`SessionContext`] and
//! hands it to handlers as a request extension; handlers never consult any
//! global "current user".
//!
//! Sessions expire after a period without requests (the idle TTL). A stale
//! token is evicted when it is presented, and every login prunes the rest.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Duration, Utc};

use crate::models::customer::CustomerIdentity;

/// Idle lifetime used when none is configured.
pub const DEFAULT_SESSION_TTL_SECS: u64 = 1800;

/// Who is behind an authenticated request.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub token: String,
    pub customer: CustomerIdentity,
}

#[derive(Debug, Clone)]
struct SessionEntry {
    customer: CustomerIdentity,
    last_seen: DateTime<Utc>,
}

/// Open sessions, shared by all handlers.
#[derive(Debug, Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, SessionEntry>>>,
    ttl: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_ttl(ttl_from_secs(DEFAULT_SESSION_TTL_SECS))
    }
}

/// Convert a configured number of seconds, saturating on absurd values.
pub fn ttl_from_secs(secs: u64) -> Duration {
    i64::try_from(secs)
        .ok()
        .and_then(Duration::try_seconds)
        .unwrap_or(Duration::MAX)
}

/// Generate an unguessable session token.
///
/// # Output
///
/// 64 hex characters (32 random bytes)
fn generate_token() -> String {
    let bytes: [u8; 32] = rand::random();
    hex::encode(bytes)
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose sessions expire after `ttl` without use.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            sessions: Arc::default(),
            ttl,
        }
    }

    fn is_stale(&self, entry: &SessionEntry, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(entry.last_seen) >= self.ttl
    }

    /// Start a session for `customer` and return its token.
    pub fn open(&self, customer: CustomerIdentity) -> String {
        self.open_at(customer, Utc::now())
    }

    fn open_at(&self, customer: CustomerIdentity, now: DateTime<Utc>) -> String {
        let token = generate_token();
        let mut sessions = self
            .sessions
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let before = sessions.len();
        sessions.retain(|_, entry| !self.is_stale(entry, now));
        if sessions.len() < before {
            tracing::debug!(evicted = before - sessions.len(), "Pruned expired sessions");
        }

        sessions.insert(
            token.clone(),
            SessionEntry {
                customer,
                last_seen: now,
            },
        );
        token
    }

    /// The session behind `token`, if it is open and not expired.
    ///
    /// A successful lookup counts as activity and restarts the idle timer.
    pub fn resolve(&self, token: &str) -> Option<SessionContext> {
        self.resolve_at(token, Utc::now())
    }

    fn resolve_at(&self, token: &str, now: DateTime<Utc>) -> Option<SessionContext> {
        let mut sessions = self
            .sessions
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let entry = sessions.get_mut(token)?;
        if self.is_stale(entry, now) {
            sessions.remove(token);
            return None;
        }
        entry.last_seen = now;

        Some(SessionContext {
            token: token.to_string(),
            customer: entry.customer.clone(),
        })
    }

    /// End a session. Returns false if it was not open.
    pub fn close(&self, token: &str) -> bool {
        self.sessions
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(token)
            .is_some()
    }

    /// Number of stored sessions, expired ones not yet pruned included.
    pub fn len(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn identity() -> CustomerIdentity {
        CustomerIdentity {
            customer_id: Uuid::new_v4(),
            full_name: "María Quispe".to_string(),
            email: "maria@example.com".to_string(),
        }
    }

    #[test]
    fn opened_session_resolves_to_customer() {
        let sessions = SessionStore::new();
        let customer = identity();

        let token = sessions.open(customer.clone());
        let context = sessions.resolve(&token).unwrap();

        assert_eq!(token.len(), 64);
        assert_eq!(context.customer, customer);
        assert_eq!(context.token, token);
    }

    #[test]
    fn each_login_gets_a_distinct_token() {
        let sessions = SessionStore::new();
        let customer = identity();

        let first = sessions.open(customer.clone());
        let second = sessions.open(customer);

        assert_ne!(first, second);
        assert_eq!(sessions.len(), 2);
    }

    #[test]
    fn closed_session_no_longer_resolves() {
        let sessions = SessionStore::new();
        let token = sessions.open(identity());

        assert!(sessions.close(&token));
        assert!(sessions.resolve(&token).is_none());
        assert!(!sessions.close(&token));
        assert!(sessions.is_empty());
    }

    #[test]
    fn clones_share_sessions() {
        let sessions = SessionStore::new();
        let shared = sessions.clone();

        let token = sessions.open(identity());

        assert!(shared.resolve(&token).is_some());
    }

    #[test]
    fn idle_session_expires_and_is_evicted() {
        let sessions = SessionStore::with_ttl(Duration::minutes(30));
        let start = Utc::now();
        let token = sessions.open_at(identity(), start);

        assert!(sessions.resolve_at(&token, start + Duration::minutes(29)).is_some());
        assert!(sessions.resolve_at(&token, start + Duration::minutes(60)).is_none());
        assert!(sessions.is_empty());
    }

    #[test]
    fn activity_restarts_the_idle_timer() {
        let sessions = SessionStore::with_ttl(Duration::minutes(30));
        let start = Utc::now();
        let token = sessions.open_at(identity(), start);

        assert!(sessions.resolve_at(&token, start + Duration::minutes(20)).is_some());

        assert!(sessions.resolve_at(&token, start + Duration::minutes(40)).is_some());
    }

    #[test]
    fn login_prunes_abandoned_sessions() {
        let sessions = SessionStore::with_ttl(Duration::minutes(30));
        let start = Utc::now();
        let abandoned: Vec<String> = (0..1000)
            .map(|_| sessions.open_at(identity(), start))
            .collect();
        assert_eq!(sessions.len(), 1000);

        let fresh = sessions.open_at(identity(), start + Duration::hours(1));

        assert_eq!(sessions.len(), 1);
        assert!(sessions.resolve_at(&abandoned[0], start + Duration::hours(1)).is_none());
        assert!(sessions.resolve_at(&fresh, start + Duration::hours(1)).is_some());
    }

    #[test]
    fn zero_ttl_expires_immediately() {
        let sessions = SessionStore::with_ttl(Duration::zero());
        let token = sessions.open(identity());

        assert!(sessions.resolve(&token).is_none());
    }

    #[test]
    fn huge_ttl_saturates() {
        assert_eq!(ttl_from_secs(u64::MAX), Duration::MAX);
        assert_eq!(ttl_from_secs(90), Duration::seconds(90));
    }
}
