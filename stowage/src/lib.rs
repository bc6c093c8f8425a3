//! # Stowage: lazily-evaluated hierarchical dependency container
//!
//! Register creation rules under typed keys, build containers that create
//! each instance on first use, and chain containers so that page-level
//! containers fall back to the application-wide one.
//!
//! ```rust
//! use std::sync::Arc;
//! use stowage::prelude::*;
//!
//! struct Settings {
//!     theme: &'static str,
//! }
//!
//! const SETTINGS: ServiceKey<Settings> = ServiceKey::new("ISettings");
//!
//! let mut builder = Container::builder();
//! builder.register(&SETTINGS, |_| Ok(Arc::new(Settings { theme: "dark" })));
//! let container = builder.build().unwrap();
//!
//! assert_eq!(container.resolve(&SETTINGS).unwrap().theme, "dark");
//! ```

pub mod replay;

pub use stowage_container::*;
pub use stowage_routing::*;
pub use stowage_support::{ReplayAware, ReplayState, rendering};
