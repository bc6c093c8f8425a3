//! Provider trait: a module of related registrations.
//!
//! Providers group the registrations of one concern so that several
//! builders (one per page, say) can apply the same set.
//!
//! # Examples
//! ```rust
//! use std::sync::Arc;
//! use stowage_container::prelude::*;
//!
//! struct Clock;
//! const CLOCK: ServiceKey<Clock> = ServiceKey::new("IClock");
//!
//! struct TimeProvider;
//!
//! impl Provider for TimeProvider {
//!     fn register(&self, builder: &mut ContainerBuilder) {
//!         builder.register(&CLOCK, |_| Ok(Arc::new(Clock)));
//!     }
//! }
//!
//! let mut builder = Container::builder();
//! builder.add_provider(&TimeProvider);
//! let container = builder.build().unwrap();
//! assert!(container.resolve(&CLOCK).is_ok());
//! ```

use crate::container::ContainerBuilder;

/// A module that registers related creation rules into a builder.
///
/// Each call to [`register`](Provider::register) must create fresh rules, so
/// containers built from different builders keep independent instances.
pub trait Provider: Send + Sync {
    /// Register creation rules into the builder.
    fn register(&self, builder: &mut ContainerBuilder);

    /// Optional: human-readable name for log messages.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::key::ServiceKey;

    const GREETING: ServiceKey<String> = ServiceKey::new("IGreeting");
    const ANSWER: ServiceKey<i32> = ServiceKey::new("IAnswer");

    struct TestProvider;

    impl Provider for TestProvider {
        fn register(&self, builder: &mut ContainerBuilder) {
            builder.register(&GREETING, |_| Ok(Arc::new(String::from("hello"))));
            builder.register(&ANSWER, |_| Ok(Arc::new(42)));
        }
    }

    #[test]
    fn provider_registers_dependencies() {
        let mut builder = ContainerBuilder::new();
        builder.add_provider(&TestProvider);
        assert_eq!(builder.len(), 2);
    }

    #[test]
    fn provider_has_name() {
        let provider = TestProvider;
        assert!(provider.name().contains("TestProvider"));
    }

    #[test]
    fn provider_applied_twice_gives_independent_containers() {
        let mut builder = ContainerBuilder::new();
        builder.add_provider(&TestProvider);
        let first = builder.build().unwrap();
        builder.add_provider(&TestProvider);
        let second = builder.build().unwrap();

        let a = first.resolve(&GREETING).unwrap();
        let b = second.resolve(&GREETING).unwrap();
        assert_eq!(*a, *b);
        assert!(!Arc::ptr_eq(&a, &b));
    }
}
