//! Instance cache scopes.
//!
//! Every registration is a singleton per (key, instance name). The scope
//! decides who owns that singleton:
//! - [`CacheScope::Container`]: the container that resolved it
//! - [`CacheScope::Rule`]: the [`CreationRule`](crate::registry::CreationRule) value itself
use std::fmt;

/// Defines where a created instance is cached.
///
/// # Examples
/// ```
/// use stowage_container::scope::CacheScope;
///
/// assert_eq!(CacheScope::default(), CacheScope::Container);
/// assert!(CacheScope::Rule.is_shared_across_containers());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CacheScope {
    /// One instance per container.
    ///
    /// Two containers built from the same rule never share an instance.
    /// Instances live until the container is dropped.
    #[default]
    Container,

    /// One instance per rule value.
    ///
    /// The singleton slots live with the rule, so every container the same
    /// [`CreationRule`](crate::registry::CreationRule) was registered into
    /// observes the same instance for a given instance name.
    Rule,
}

impl CacheScope {
    /// Returns `true` if containers sharing a rule also share its instances.
    #[inline]
    pub fn is_shared_across_containers(&self) -> bool {
        matches!(self, CacheScope::Rule)
    }
}

impl fmt::Display for CacheScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheScope::Container => write!(f, "Container"),
            CacheScope::Rule => write!(f, "Rule"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_container() {
        assert_eq!(CacheScope::default(), CacheScope::Container);
    }

    #[test]
    fn sharing() {
        assert!(!CacheScope::Container.is_shared_across_containers());
        assert!(CacheScope::Rule.is_shared_across_containers());
    }

    #[test]
    fn scope_display() {
        assert_eq!(format!("{}", CacheScope::Container), "Container");
        assert_eq!(format!("{}", CacheScope::Rule), "Rule");
    }
}
