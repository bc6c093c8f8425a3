//! Error types for Stowage container operations.
//!
//! Every error names the key (and instance name) involved, so wiring
//! mistakes can be diagnosed from the message alone.

use std::fmt;

use stowage_support::rendering::{render_chain, shorten_type_name};

use crate::key::InstanceKey;

/// Main error type for all Stowage operations.
#[derive(Debug, thiserror::Error)]
pub enum StowageError {
    /// Nothing in the container or its parents can resolve the key.
    #[error("{}", .0)]
    NotRegistered(ResolutionError),

    /// A creation rule resolved a key that is already under construction.
    #[error("{}", .0)]
    CyclicDependency(CyclicDependencyError),

    /// Registrations for a key contradict each other.
    #[error("{}", .0)]
    MisconfiguredRegistration(MisconfiguredRegistrationError),

    /// Same key and instance name registered twice while overrides are disabled.
    #[error("{}", .0)]
    AlreadyRegistered(AlreadyRegisteredError),

    /// The key is registered for a different service type.
    #[error("{}", .0)]
    TypeMismatch(TypeMismatchError),

    /// A creation rule returned an error of its own.
    #[error("Failed to construct {key}: {source}")]
    ConstructionFailed {
        key: InstanceKey,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl StowageError {
    /// Wraps an application error raised while constructing `key`.
    ///
    /// ```
    /// use stowage_container::error::StowageError;
    /// use stowage_container::key::InstanceKey;
    ///
    /// let err = StowageError::construction_failed(
    ///     InstanceKey::new("ISettingsStore", None),
    ///     "settings file missing",
    /// );
    /// assert!(err.to_string().contains("ISettingsStore"));
    /// ```
    pub fn construction_failed(
        key: InstanceKey,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        StowageError::ConstructionFailed {
            key,
            source: source.into(),
        }
    }

    /// Returns the key this error is about.
    pub fn key(&self) -> Option<&InstanceKey> {
        match self {
            StowageError::NotRegistered(e) => Some(&e.requested),
            StowageError::CyclicDependency(e) => e.chain.last(),
            StowageError::MisconfiguredRegistration(e) => Some(&e.key),
            StowageError::AlreadyRegistered(e) => Some(&e.key),
            StowageError::TypeMismatch(e) => Some(&e.key),
            StowageError::ConstructionFailed { key, .. } => Some(key),
        }
    }
}

/// Error when a key cannot be resolved anywhere.
///
/// Includes helpful hints about what went wrong.
#[derive(Debug)]
pub struct ResolutionError {
    /// The key (and instance name) that was requested
    pub requested: InstanceKey,
    /// How many parent containers were consulted after the local miss
    pub parents_searched: usize,
    /// Similar keys that ARE registered (for "did you mean?" suggestions)
    pub suggestions: Vec<String>,
    /// Instance names the key is registered under when the default
    /// instance was requested but only named rules exist
    pub named_instances: Vec<String>,
}

impl fmt::Display for ResolutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Dependency not registered: {}", self.requested)?;

        if self.parents_searched > 0 {
            write!(
                f,
                "\n  Searched {} parent container(s)",
                self.parents_searched
            )?;
        }

        if !self.suggestions.is_empty() {
            write!(f, "\n  Did you mean one of:")?;
            for suggestion in &self.suggestions {
                write!(f, "\n    - {suggestion}")?;
            }
        }

        if !self.named_instances.is_empty() {
            write!(
                f,
                "\n  Registered only under instance names: {}",
                self.named_instances.join(", ")
            )?;
            return write!(
                f,
                "\n  Hint: Use resolve_named(), or register a default rule for {:?}",
                self.requested.key()
            );
        }

        write!(
            f,
            "\n  Hint: Did you forget to call .register() for {:?}?",
            self.requested.key()
        )
    }
}

/// Error when a resolution re-enters a key under construction.
///
/// Shows the full chain so you can see WHERE the cycle is.
#[derive(Debug)]
pub struct CyclicDependencyError {
    /// Keys from the first occurrence of the repeated key to its re-entry.
    /// Example: ["A", "B", "A"]
    pub chain: Vec<InstanceKey>,
}

impl fmt::Display for CyclicDependencyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cyclic dependency detected:\n  ")?;

        let chain: Vec<String> = self.chain.iter().map(ToString::to_string).collect();
        write!(f, "{}", render_chain(&chain))?;

        write!(
            f,
            "\n  Hint: Resolve one side lazily or restructure the stores"
        )
    }
}

/// What is contradictory about a key's registrations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Misconfiguration {
    /// The key has both single (default or named) and collection entries.
    MixedSingleAndCollection,
    /// A collection entry was also given an instance name.
    NamedCollectionEntry { name: String },
    /// Two registrations under one key produce different service types.
    ConflictingTypes {
        first: &'static str,
        second: &'static str,
    },
    /// A collection key was resolved as a single instance.
    CollectionResolvedAsSingle,
}

/// Error when registrations for a key are inconsistent.
#[derive(Debug)]
pub struct MisconfiguredRegistrationError {
    pub key: InstanceKey,
    pub problem: Misconfiguration,
}

impl fmt::Display for MisconfiguredRegistrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Misconfigured registration for {}: ", self.key)?;
        match &self.problem {
            Misconfiguration::MixedSingleAndCollection => write!(
                f,
                "single and collection registrations are mixed\n  Hint: Call .in_collection() on every registration of this key, or on none"
            ),
            Misconfiguration::NamedCollectionEntry { name } => write!(
                f,
                "collection entry named {name:?}\n  Hint: Pass the instance name to resolve_all_named() instead"
            ),
            Misconfiguration::ConflictingTypes { first, second } => write!(
                f,
                "registered as both {} and {}",
                shorten_type_name(first),
                shorten_type_name(second),
            ),
            Misconfiguration::CollectionResolvedAsSingle => write!(
                f,
                "key holds a collection\n  Hint: Use resolve_all() for collection registrations"
            ),
        }
    }
}

/// Error when trying to register a key that already exists.
#[derive(Debug)]
pub struct AlreadyRegisteredError {
    pub key: InstanceKey,
}

impl fmt::Display for AlreadyRegisteredError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Dependency already registered: {}", self.key)?;
        write!(
            f,
            "\n  Hint: Give the registration an instance name, or enable allow_override in settings"
        )
    }
}

/// Error when a key is resolved with a different type than it was registered with.
#[derive(Debug)]
pub struct TypeMismatchError {
    pub key: InstanceKey,
    pub expected: &'static str,
    pub registered: &'static str,
}

impl fmt::Display for TypeMismatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Type mismatch for {}: requested {}, registered {}",
            self.key,
            shorten_type_name(self.expected),
            shorten_type_name(self.registered),
        )
    }
}

/// Convenient Result type for Stowage operations.
pub type Result<T> = std::result::Result<T, StowageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_registered_error_display() {
        let err = StowageError::NotRegistered(ResolutionError {
            requested: InstanceKey::new("IFoo", Some("alt")),
            parents_searched: 2,
            suggestions: vec!["IFooStore".into()],
            named_instances: Vec::new(),
        });

        let msg = format!("{err}");
        assert!(msg.contains("not registered"));
        assert!(msg.contains("IFoo"));
        assert!(msg.contains("alt"));
        assert!(msg.contains("2 parent"));
        assert!(msg.contains("IFooStore"));
    }

    #[test]
    fn named_only_error_display() {
        let err = StowageError::NotRegistered(ResolutionError {
            requested: InstanceKey::new("IListener", None),
            parents_searched: 0,
            suggestions: Vec::new(),
            named_instances: vec!["page-1".into(), "page-2".into()],
        });

        let msg = format!("{err}");
        assert!(msg.contains("page-1, page-2"));
        assert!(msg.contains("resolve_named"));
        assert!(!msg.contains("forget to call .register()"));
    }

    #[test]
    fn cyclic_dependency_error_display() {
        let err = StowageError::CyclicDependency(CyclicDependencyError {
            chain: vec![
                InstanceKey::new("A", None),
                InstanceKey::new("B", None),
                InstanceKey::new("A", None),
            ],
        });

        let msg = format!("{err}");
        assert!(msg.contains("Cyclic"));
        assert!(msg.contains("A → B → A"));
    }

    #[test]
    fn misconfigured_error_display() {
        let err = StowageError::MisconfiguredRegistration(MisconfiguredRegistrationError {
            key: InstanceKey::new("IPlugin", None),
            problem: Misconfiguration::ConflictingTypes {
                first: "my_app::PluginA",
                second: "alloc::string::String",
            },
        });

        let msg = format!("{err}");
        assert!(msg.contains("IPlugin"));
        assert!(msg.contains("PluginA"));
        assert!(msg.contains("String"));
        assert!(!msg.contains("my_app::"));
    }

    #[test]
    fn type_mismatch_error_display() {
        let err = StowageError::TypeMismatch(TypeMismatchError {
            key: InstanceKey::new("PageUrl", None),
            expected: "alloc::string::String",
            registered: "url::Url",
        });

        let msg = format!("{err}");
        assert!(msg.contains("PageUrl"));
        assert!(msg.contains("requested String"));
        assert!(msg.contains("registered Url"));
    }

    #[test]
    fn key_accessor() {
        let err = StowageError::construction_failed(InstanceKey::new("IFoo", None), "boom");
        assert_eq!(err.key().map(InstanceKey::key), Some("IFoo"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
