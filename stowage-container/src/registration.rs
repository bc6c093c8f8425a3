//! Registration handle returned by `register`.
//!
//! The rule is recorded as soon as `register` returns; the handle only
//! adjusts where it lands:
//!
//! ```rust
//! use std::sync::Arc;
//! use stowage_container::prelude::*;
//!
//! struct Connection(&'static str);
//! const CONNECTION: ServiceKey<Connection> = ServiceKey::new("IConnection");
//!
//! let mut builder = Container::builder();
//! builder.register(&CONNECTION, |_| Ok(Arc::new(Connection("primary"))));
//! builder
//!     .register(&CONNECTION, |_| Ok(Arc::new(Connection("replica"))))
//!     .named("replica");
//!
//! let container = builder.build().expect("valid registrations");
//! assert_eq!(container.resolve(&CONNECTION).unwrap().0, "primary");
//! assert_eq!(container.resolve_named(&CONNECTION, "replica").unwrap().0, "replica");
//! ```

use tracing::{trace, warn};

use crate::registry::PendingRule;
use crate::scope::CacheScope;

/// Post-registration configuration for one rule.
pub struct Registration<'a> {
    rule: &'a mut PendingRule,
}

impl<'a> Registration<'a> {
    pub(crate) fn new(rule: &'a mut PendingRule) -> Self {
        Self { rule }
    }

    /// Registers the rule for instance `name` instead of the default instance.
    ///
    /// An empty name keeps the default instance. Renaming to a different
    /// name keeps the last one.
    pub fn named(self, name: impl Into<String>) -> Self {
        let name = name.into();
        let name = (!name.is_empty()).then_some(name);

        match (&self.rule.instance, &name) {
            (Some(previous), Some(next)) if previous != next => {
                warn!(
                    key = %self.rule.key,
                    previous = %previous,
                    next = %next,
                    "Registration renamed, last name wins"
                );
            }
            _ => trace!(key = %self.rule.key, name = ?name, "Registration named"),
        }

        self.rule.instance = name;
        self
    }

    /// Marks the rule as one entry of the key's collection.
    pub fn in_collection(self) -> Self {
        self.rule.collection = true;
        self
    }

    /// Selects who owns the created instances.
    pub fn cache_scope(self, scope: CacheScope) -> Self {
        self.rule.scope = scope;
        self
    }

    /// Returns the string key the rule was registered under.
    pub fn key(&self) -> &str {
        &self.rule.key
    }

    pub fn instance_name(&self) -> Option<&str> {
        self.rule.instance.as_deref()
    }

    pub fn is_collection(&self) -> bool {
        self.rule.collection
    }
}

impl std::fmt::Debug for Registration<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Registration").field(&self.rule).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::registry::{CreationRule, RegistrationMap};

    fn push(map: &mut RegistrationMap) -> Registration<'_> {
        let rule = CreationRule::new(|_| Ok(Arc::new(1u32))).erase();
        Registration::new(map.push("IValue", rule))
    }

    #[test]
    fn defaults() {
        let mut map = RegistrationMap::default();
        let handle = push(&mut map);
        assert_eq!(handle.key(), "IValue");
        assert_eq!(handle.instance_name(), None);
        assert!(!handle.is_collection());
    }

    #[test]
    fn named_is_idempotent() {
        let mut map = RegistrationMap::default();
        let handle = push(&mut map).named("alt").named("alt");
        assert_eq!(handle.instance_name(), Some("alt"));
    }

    #[test]
    fn rename_last_name_wins() {
        let mut map = RegistrationMap::default();
        let handle = push(&mut map).named("first").named("second");
        assert_eq!(handle.instance_name(), Some("second"));
    }

    #[test]
    fn empty_name_is_default() {
        let mut map = RegistrationMap::default();
        let handle = push(&mut map).named("");
        assert_eq!(handle.instance_name(), None);
    }

    #[test]
    fn in_collection_is_idempotent() {
        let mut map = RegistrationMap::default();
        let handle = push(&mut map).in_collection().in_collection();
        assert!(handle.is_collection());
    }

    #[test]
    fn cache_scope_is_recorded() {
        let mut map = RegistrationMap::default();
        push(&mut map).cache_scope(CacheScope::Rule);
        assert!(format!("{map:?}").contains("Rule"));
    }
}
