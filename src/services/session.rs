//! Browser sessions and the signed-in identity observed for each of them.
//!
//! Every browser gets an entry keyed by the opaque id in its session cookie.
//! The entry holds a `watch` channel with the current identity (the single
//! source of truth read by pages, forms and the upload flow), the provider
//! tokens behind it, and the gate that admits one identity-changing attempt
//! at a time.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};

use secrecy::SecretString;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::auth::{AuthProvider, ProviderSession};
use crate::models::{Identity, ProviderTokens, SessionId};

/// A federated attempt whose callback never arrives stops blocking the gate after this long.
pub const ATTEMPT_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Kind of identity-changing attempt holding the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptKind {
    Password,
    Federated,
}

#[derive(Debug, Clone, Copy)]
struct Attempt {
    kind: AttemptKind,
    started: Instant,
}

struct SessionEntry {
    identity: watch::Sender<Option<Identity>>,
    tokens: Mutex<Option<ProviderTokens>>,
    attempt: Mutex<Option<Attempt>>,
    last_seen: Mutex<Instant>,
}

impl SessionEntry {
    fn new() -> Self {
        let (identity, _) = watch::channel(None);
        Self {
            identity,
            tokens: Mutex::new(None),
            attempt: Mutex::new(None),
            last_seen: Mutex::new(Instant::now()),
        }
    }

    fn touch(&self) {
        *lock(&self.last_seen) = Instant::now();
    }

    fn idle_for(&self) -> Duration {
        lock(&self.last_seen).elapsed()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Registry of browser sessions.
#[derive(Default)]
pub struct SessionRegistry {
    entries: RwLock<HashMap<SessionId, Arc<SessionEntry>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve the session named by a verified cookie, or start a new one.
    ///
    /// Returns the id and whether it was newly created (and so needs a cookie).
    /// A verified id unknown to this process (e.g. after a restart) is
    /// re-registered as an anonymous session.
    pub fn resolve(&self, cookie_id: Option<SessionId>) -> (SessionId, bool) {
        match cookie_id {
            Some(id) => {
                self.entry(&id);
                (id, false)
            }
            None => {
                let id = SessionId::generate();
                self.entry(&id);
                debug!(session = %id, "Browser session created");
                (id, true)
            }
        }
    }

    pub fn contains(&self, id: &SessionId) -> bool {
        self.read().contains_key(id)
    }

    /// Number of live browser sessions.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Subscribe to identity changes of one browser session.
    pub fn observe(&self, id: &SessionId) -> SessionObserver {
        SessionObserver {
            rx: self.entry(id).identity.subscribe(),
        }
    }

    /// Current identity of a browser session, or none.
    pub fn current(&self, id: &SessionId) -> Option<Identity> {
        self.read()
            .get(id)
            .and_then(|entry| entry.identity.borrow().clone())
    }

    /// Record a successful sign-in and notify observers.
    pub fn establish(&self, id: &SessionId, session: ProviderSession) {
        let entry = self.entry(id);
        *lock(&entry.tokens) = Some(session.tokens);
        info!(session = %id, uid = %session.identity.uid, "Signed in");
        entry.identity.send_replace(Some(session.identity));
    }

    /// Replace the identity after a profile update (tokens unchanged).
    pub fn update_identity(&self, id: &SessionId, identity: Identity) {
        let entry = self.entry(id);
        entry.identity.send_if_modified(|current| {
            if current.as_ref() == Some(&identity) {
                return false;
            }
            *current = Some(identity);
            true
        });
    }

    /// Sign a browser session out, returning the tokens it held.
    pub fn clear(&self, id: &SessionId) -> Option<ProviderTokens> {
        let entry = self.entry(id);
        let tokens = lock(&entry.tokens).take();
        let was_signed_in = entry.identity.send_if_modified(|current| current.take().is_some());
        if was_signed_in {
            info!(session = %id, "Signed out");
        }
        tokens
    }

    /// Identity and a usable ID token for remote calls made on the user's behalf.
    ///
    /// Expired tokens are refreshed once. When the refresh is refused the
    /// session is cleared and observers see the sign-out. Returns `None`
    /// without contacting the provider when nobody is signed in.
    pub async fn credentials(
        &self,
        id: &SessionId,
        provider: &dyn AuthProvider,
    ) -> Option<(Identity, SecretString)> {
        let entry = self.entry(id);
        let identity = entry.identity.borrow().clone()?;
        let tokens = lock(&entry.tokens).clone()?;

        if !tokens.is_expired() {
            return Some((identity, tokens.id_token));
        }

        match provider.refresh(&tokens).await {
            Ok(fresh) => {
                debug!(session = %id, "Provider tokens refreshed");
                let id_token = fresh.id_token.clone();
                *lock(&entry.tokens) = Some(fresh);
                Some((identity, id_token))
            }
            Err(e) => {
                warn!(session = %id, error = %e, "Token refresh refused, clearing session");
                self.clear(id);
                None
            }
        }
    }

    /// Claim the identity-changing gate of a browser session.
    ///
    /// Returns `None` while another attempt is in flight. The gate reopens
    /// when the guard is dropped, unless it was detached.
    pub fn begin_attempt(&self, id: &SessionId, kind: AttemptKind) -> Option<AttemptGuard> {
        let entry = self.entry(id);
        {
            let mut attempt = lock(&entry.attempt);
            if let Some(current) = *attempt
                && current.started.elapsed() < ATTEMPT_TIMEOUT
            {
                debug!(session = %id, held_by = ?current.kind, "Attempt refused, gate busy");
                return None;
            }
            *attempt = Some(Attempt {
                kind,
                started: Instant::now(),
            });
        }
        Some(AttemptGuard {
            entry,
            armed: true,
        })
    }

    /// Take over the gate for the completion of a detached attempt.
    pub fn adopt_attempt(&self, id: &SessionId, kind: AttemptKind) -> AttemptGuard {
        let entry = self.entry(id);
        *lock(&entry.attempt) = Some(Attempt {
            kind,
            started: Instant::now(),
        });
        AttemptGuard {
            entry,
            armed: true,
        }
    }

    /// Whether an identity-changing attempt is in flight.
    pub fn attempt_in_flight(&self, id: &SessionId) -> bool {
        self.read().get(id).is_some_and(|entry| {
            lock(&entry.attempt).is_some_and(|a| a.started.elapsed() < ATTEMPT_TIMEOUT)
        })
    }

    /// Drop sessions idle for longer than `max_idle`; returns the removed ids.
    pub fn prune_idle(&self, max_idle: Duration) -> Vec<SessionId> {
        let mut entries = self.write();
        let stale: Vec<SessionId> = entries
            .iter()
            .filter(|(_, entry)| entry.idle_for() > max_idle)
            .map(|(id, _)| id.clone())
            .collect();
        for id in &stale {
            entries.remove(id);
        }
        stale
    }

    fn entry(&self, id: &SessionId) -> Arc<SessionEntry> {
        if let Some(entry) = self.read().get(id) {
            entry.touch();
            return entry.clone();
        }
        self.write()
            .entry(id.clone())
            .or_insert_with(|| Arc::new(SessionEntry::new()))
            .clone()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<SessionId, Arc<SessionEntry>>> {
        self.entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<SessionId, Arc<SessionEntry>>> {
        self.entries
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Holds the identity-changing gate of one browser session.
pub struct AttemptGuard {
    entry: Arc<SessionEntry>,
    armed: bool,
}

impl AttemptGuard {
    /// Keep the gate closed after this guard is dropped (redirect-based flows).
    pub fn detach(mut self) {
        self.armed = false;
    }
}

impl Drop for AttemptGuard {
    fn drop(&mut self) {
        if self.armed {
            *lock(&self.entry.attempt) = None;
        }
    }
}

/// The browser session ended while it was being observed.
#[derive(Debug, thiserror::Error)]
#[error("browser session ended")]
pub struct SessionEnded;

/// Read side of one browser session's identity.
#[derive(Clone)]
pub struct SessionObserver {
    rx: watch::Receiver<Option<Identity>>,
}

impl SessionObserver {
    /// Current identity or none.
    pub fn current(&self) -> Option<Identity> {
        self.rx.borrow().clone()
    }

    /// Wait for the next identity change and return the new value.
    pub async fn changed(&mut self) -> Result<Option<Identity>, SessionEnded> {
        self.rx.changed().await.map_err(|_| SessionEnded)?;
        Ok(self.rx.borrow_and_update().clone())
    }
}
