//! Replay awareness for stores.
//!
//! When an action log is replayed (time travel, state restore), some stores
//! must suppress side effects such as navigation or network calls. A store
//! opts in by holding a [`ReplayState`] field and implementing
//! [`ReplayAware`].
//!
//! # Examples
//! ```
//! use stowage_support::replay::{ReplayAware, ReplayState};
//!
//! #[derive(Default)]
//! struct NavigationStore {
//!     replay: ReplayState,
//! }
//!
//! impl ReplayAware for NavigationStore {
//!     fn replay_state(&self) -> &ReplayState {
//!         &self.replay
//!     }
//! }
//!
//! let store = NavigationStore::default();
//! store.note_replay_started();
//! assert!(store.is_replaying());
//! store.note_replay_ended();
//! assert!(!store.is_replaying());
//! ```

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::trace;

/// Tracks whether a replay is currently taking place.
///
/// Stores are shared behind `Arc`, so the flag uses interior mutability.
#[derive(Debug, Default)]
pub struct ReplayState {
    replaying: AtomicBool,
}

impl ReplayState {
    /// Creates a state that is not replaying.
    pub const fn new() -> Self {
        Self {
            replaying: AtomicBool::new(false),
        }
    }

    /// Returns `true` between [`mark_replay_started`] and [`mark_replay_ended`].
    #[inline]
    pub fn is_replaying(&self) -> bool {
        self.replaying.load(Ordering::Acquire)
    }
}

/// Flags the state as replaying.
pub fn mark_replay_started(state: &ReplayState) {
    trace!("Replay started");
    state.replaying.store(true, Ordering::Release);
}

/// Clears the replaying flag.
pub fn mark_replay_ended(state: &ReplayState) {
    trace!("Replay ended");
    state.replaying.store(false, Ordering::Release);
}

/// Capability for types that need to know when a replay is happening.
pub trait ReplayAware: Send + Sync {
    /// The state object this type holds as a field.
    fn replay_state(&self) -> &ReplayState;

    /// Inform the object that replay has started.
    fn note_replay_started(&self) {
        mark_replay_started(self.replay_state());
    }

    /// Inform the object that replay has finished.
    fn note_replay_ended(&self) {
        mark_replay_ended(self.replay_state());
    }

    fn is_replaying(&self) -> bool {
        self.replay_state().is_replaying()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_state_is_not_replaying() {
        assert!(!ReplayState::new().is_replaying());
        assert!(!ReplayState::default().is_replaying());
    }

    #[test]
    fn mark_started_and_ended() {
        let state = ReplayState::new();
        mark_replay_started(&state);
        assert!(state.is_replaying());
        mark_replay_started(&state);
        assert!(state.is_replaying());
        mark_replay_ended(&state);
        assert!(!state.is_replaying());
    }

    #[test]
    fn trait_defaults_delegate_to_state() {
        struct Store {
            replay: ReplayState,
        }

        impl ReplayAware for Store {
            fn replay_state(&self) -> &ReplayState {
                &self.replay
            }
        }

        let store = Store { replay: ReplayState::new() };
        store.note_replay_started();
        assert!(store.replay.is_replaying());
        assert!(store.is_replaying());
        store.note_replay_ended();
        assert!(!store.is_replaying());
    }

    #[test]
    fn usable_as_trait_object() {
        use std::sync::Arc;

        #[derive(Default)]
        struct Store {
            replay: ReplayState,
        }

        impl ReplayAware for Store {
            fn replay_state(&self) -> &ReplayState {
                &self.replay
            }
        }

        let listener: Arc<dyn ReplayAware> = Arc::new(Store::default());
        listener.note_replay_started();
        assert!(listener.is_replaying());
    }
}
