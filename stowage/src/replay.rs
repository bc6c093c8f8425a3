//! Broadcasting replay start and end to registered listeners.
//!
//! Stores that must suppress side effects during a replay register
//! themselves as entries of the [`REPLAY_LISTENERS`] collection.

use tracing::debug;

use stowage_container::{Container, Result, ServiceKey};
use stowage_support::ReplayAware;

/// Collection key for everything that needs to know about replays.
pub const REPLAY_LISTENERS: ServiceKey<dyn ReplayAware> = ServiceKey::new("INeedToKnowAboutReplay");

/// Tells every replay listener reachable from `container` that a replay has
/// started. Returns how many listeners were notified.
pub fn notify_replay_started(container: &Container) -> Result<usize> {
    notify(container, "started", |listener| listener.note_replay_started())
}

/// Tells every replay listener that the replay is over.
pub fn notify_replay_ended(container: &Container) -> Result<usize> {
    notify(container, "ended", |listener| listener.note_replay_ended())
}

fn notify(container: &Container, phase: &str, note: impl Fn(&dyn ReplayAware)) -> Result<usize> {
    let Some(listeners) = container.try_resolve_all(&REPLAY_LISTENERS)? else {
        return Ok(0);
    };

    for listener in &listeners {
        note(listener.as_ref());
    }

    debug!(container = %container.id(), listeners = listeners.len(), phase, "Replay broadcast");
    Ok(listeners.len())
}
