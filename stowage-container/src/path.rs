//! Resolution path tracking.
//!
//! Each construction carries the chain of (container, key) pairs that are
//! currently being built above it. Entering a pair that is already on the
//! chain means a creation rule depends on itself, directly or transitively.
//!
//! The path travels with the [`Resolver`](crate::registry::Resolver) handed
//! to creation rules, so concurrent resolutions never see each other's
//! frames.

use tracing::warn;

use crate::container::ContainerId;
use crate::error::{CyclicDependencyError, StowageError};
use crate::key::InstanceKey;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Frame {
    container: ContainerId,
    key: InstanceKey,
}

/// Keys under construction, outermost first.
#[derive(Debug, Clone, Default)]
pub(crate) struct ResolutionPath {
    frames: Vec<Frame>,
}

impl ResolutionPath {
    /// Returns the path extended by `key` in `container`.
    ///
    /// # Errors
    /// [`StowageError::CyclicDependency`] if the pair is already on the path.
    /// The chain runs from its first occurrence to the re-entry.
    pub fn enter(&self, container: ContainerId, key: &InstanceKey) -> Result<Self, StowageError> {
        let frame = Frame {
            container,
            key: key.clone(),
        };

        if let Some(cycle_start) = self.frames.iter().position(|f| *f == frame) {
            let mut chain: Vec<InstanceKey> = self.frames[cycle_start..]
                .iter()
                .map(|f| f.key.clone())
                .collect();
            chain.push(key.clone());

            warn!(cycle = ?chain, "Cyclic dependency detected!");

            return Err(StowageError::CyclicDependency(CyclicDependencyError { chain }));
        }

        let mut frames = Vec::with_capacity(self.frames.len() + 1);
        frames.extend(self.frames.iter().cloned());
        frames.push(frame);
        Ok(Self { frames })
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(name: &'static str) -> InstanceKey {
        InstanceKey::new(name, None)
    }

    #[test]
    fn enter_extends_path() {
        let c = ContainerId::next();
        let path = ResolutionPath::default();
        let path = path.enter(c, &key("A")).unwrap();
        let path = path.enter(c, &key("B")).unwrap();
        assert_eq!(path.depth(), 2);
    }

    #[test]
    fn detect_self_cycle() {
        let c = ContainerId::next();
        let path = ResolutionPath::default().enter(c, &key("A")).unwrap();

        match path.enter(c, &key("A")).unwrap_err() {
            StowageError::CyclicDependency(err) => {
                assert_eq!(err.chain, vec![key("A"), key("A")]);
            }
            other => panic!("Expected CyclicDependency, got: {other:?}"),
        }
    }

    #[test]
    fn cycle_chain_starts_at_first_occurrence() {
        // Root → A → B → C → A
        let c = ContainerId::next();
        let path = ResolutionPath::default()
            .enter(c, &key("Root"))
            .and_then(|p| p.enter(c, &key("A")))
            .and_then(|p| p.enter(c, &key("B")))
            .and_then(|p| p.enter(c, &key("C")))
            .unwrap();

        match path.enter(c, &key("A")).unwrap_err() {
            StowageError::CyclicDependency(err) => {
                assert_eq!(err.chain, vec![key("A"), key("B"), key("C"), key("A")]);
            }
            other => panic!("Expected CyclicDependency, got: {other:?}"),
        }
    }

    #[test]
    fn same_key_in_other_container_is_not_a_cycle() {
        let child = ContainerId::next();
        let parent = ContainerId::next();
        let path = ResolutionPath::default().enter(child, &key("A")).unwrap();
        assert!(path.enter(parent, &key("A")).is_ok());
    }

    #[test]
    fn instance_names_are_distinct_frames() {
        let c = ContainerId::next();
        let path = ResolutionPath::default().enter(c, &key("A")).unwrap();
        assert!(path.enter(c, &InstanceKey::new("A", Some("alt"))).is_ok());
    }

    #[test]
    fn enter_leaves_original_untouched() {
        let c = ContainerId::next();
        let root = ResolutionPath::default();
        let _child = root.enter(c, &key("A")).unwrap();
        assert_eq!(root.depth(), 0);
        assert!(root.enter(c, &key("A")).is_ok());
    }
}
