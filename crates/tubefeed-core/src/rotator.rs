//! Credential rotation for quota-limited APIs.
//!
//! A [`CredentialRotator`] owns an ordered list of API keys, the index of
//! the key currently in use, and a client bound to that key. When a caller
//! sees its request rejected for quota reasons it asks the rotator to move
//! on to the next key; the rotator advances the index modulo the number of
//! keys and rebuilds the bound client.
//!
//! All state lives behind one [`Mutex`], so the read-advance-rebind sequence
//! is atomic. [`CredentialRotator::rotate_from`] adds a compare step: a
//! caller passes the index it was using when it failed, and the advance only
//! happens if nobody else has rotated since. Two tasks that fail on the same
//! key therefore move the rotator forward exactly once.
//!
//! # Example
//!
//! ```rust
//! use tubefeed_core::rotator::CredentialRotator;
//!
//! let rotator = CredentialRotator::new(
//!     vec!["k1".to_string(), "k2".to_string()],
//!     |key: &str| format!("client({key})"),
//! )
//! .unwrap();
//!
//! let active = rotator.current();
//! assert_eq!(active.key, "k1");
//! assert!(rotator.rotate_from(active.index));
//! assert_eq!(*rotator.current().client, "client(k2)");
//! ```

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use thiserror::Error;

/// Errors raised when constructing a rotator.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RotatorError {
    #[error("credential list is empty")]
    Empty,
    #[error("credential at position {0} is blank")]
    Blank(usize),
}

type Binder<C> = dyn Fn(&str) -> C + Send + Sync;

/// Snapshot of the active credential and its bound client.
#[derive(Clone)]
pub struct Active<C> {
    /// Position of `key` in the credential list.
    pub index: usize,
    pub key: String,
    pub client: Arc<C>,
}

impl<C> fmt::Debug for Active<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Active")
            .field("index", &self.index)
            .field("key", &mask(&self.key))
            .finish()
    }
}

struct State<C> {
    index: usize,
    client: Arc<C>,
    rotations: u64,
}

/// Round-robin holder of API credentials and the client bound to the active one.
pub struct CredentialRotator<C> {
    keys: Vec<String>,
    bind: Box<Binder<C>>,
    state: Mutex<State<C>>,
}

impl<C> CredentialRotator<C> {
    /// Create a rotator starting at the first key.
    ///
    /// `bind` is called once here and again on every rotation to build the
    /// client for the newly active key. It must not fail; anything fallible
    /// (HTTP client construction, TLS setup) belongs outside the binder.
    pub fn new<F>(keys: Vec<String>, bind: F) -> Result<Self, RotatorError>
    where
        F: Fn(&str) -> C + Send + Sync + 'static,
    {
        if keys.is_empty() {
            return Err(RotatorError::Empty);
        }
        if let Some(pos) = keys.iter().position(|k| k.trim().is_empty()) {
            return Err(RotatorError::Blank(pos));
        }

        let client = Arc::new(bind(&keys[0]));
        Ok(Self {
            keys,
            bind: Box::new(bind),
            state: Mutex::new(State {
                index: 0,
                client,
                rotations: 0,
            }),
        })
    }

    /// Number of credentials in rotation. Never zero: [`new`](Self::new)
    /// rejects an empty set.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// The active credential and its client.
    pub fn current(&self) -> Active<C> {
        let state = self.lock();
        Active {
            index: state.index,
            key: self.keys[state.index].clone(),
            client: state.client.clone(),
        }
    }

    /// Advance to the next credential unconditionally.
    pub fn rotate(&self) -> usize {
        let mut state = self.lock();
        self.advance(&mut state);
        state.index
    }

    /// Advance to the next credential only if `observed` is still active.
    ///
    /// Returns `true` when this call performed the advance, `false` when
    /// another caller had already rotated away from `observed`.
    pub fn rotate_from(&self, observed: usize) -> bool {
        let mut state = self.lock();
        if state.index != observed {
            return false;
        }
        self.advance(&mut state);
        true
    }

    /// Total advances performed since construction.
    pub fn rotations(&self) -> u64 {
        self.lock().rotations
    }

    fn advance(&self, state: &mut State<C>) {
        state.index = (state.index + 1) % self.keys.len();
        state.client = Arc::new((self.bind)(&self.keys[state.index]));
        state.rotations += 1;
    }

    // A panic while holding the lock cannot leave the index out of range,
    // so a poisoned mutex is still safe to use.
    fn lock(&self) -> MutexGuard<'_, State<C>> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<C> fmt::Debug for CredentialRotator<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("CredentialRotator")
            .field("keys", &self.keys.iter().map(|k| mask(k)).collect::<Vec<_>>())
            .field("index", &state.index)
            .field("rotations", &state.rotations)
            .finish()
    }
}

/// Render a credential for logs: only the last four characters survive.
pub fn mask(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("***{}", tail)
}
