//! Core container implementation for Stowage.
//!
//! A hierarchical, lazily-evaluated dependency container: creation rules are
//! registered under string-named typed keys, compiled by a
//! [`ContainerBuilder`](container::ContainerBuilder), and resolved on demand
//! with parent fallback.

pub mod container;
pub mod error;
pub mod key;
mod path;
pub mod provider;
pub mod registration;
pub mod registry;
pub mod scope;
pub mod settings;

pub use container::{Container, ContainerBuilder, ContainerId, prelude};
pub use error::{Result, StowageError};
pub use key::{InstanceKey, ServiceKey};
pub use provider::Provider;
pub use registration::Registration;
pub use registry::{CreationRule, Resolver};
pub use scope::CacheScope;
pub use settings::ContainerSettings;
