//! Service identification keys.
//!
//! A [`ServiceKey`] is a typed token for a string key: the string identifies
//! the dependency inside one container, the type parameter fixes what
//! resolving it returns. An [`InstanceKey`] is the erased pair of a key and
//! an optional instance name, used for caching and error reporting.
//!
//! Key names are usually string literals, but keys computed at runtime
//! (one per page, say) are supported through [`ServiceKey::owned`].

use std::any::{TypeId, type_name};
use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::Arc;

/// Typed token identifying a dependency by its string key.
///
/// Tokens are `const`-constructible, so well-known keys are usually declared
/// once as constants and shared by registration and resolution code.
///
/// # Examples
/// ```
/// use stowage_container::key::ServiceKey;
///
/// trait RouterStore: Send + Sync {}
///
/// const ROUTER_STORE: ServiceKey<dyn RouterStore> = ServiceKey::new("IRouterStore");
/// assert_eq!(ROUTER_STORE.name(), "IRouterStore");
///
/// // Equality is by the string key alone
/// let same: ServiceKey<dyn RouterStore> = ServiceKey::owned(String::from("IRouterStore"));
/// assert_eq!(ROUTER_STORE, same);
/// ```
pub struct ServiceKey<T: ?Sized> {
    name: KeyName,
    _service: PhantomData<fn() -> Arc<T>>,
}

/// The string part of a key: borrowed for literals, owned for computed keys.
pub type KeyName = Cow<'static, str>;

impl<T: ?Sized> ServiceKey<T> {
    /// Creates a token for the string key `name`.
    #[inline]
    pub const fn new(name: &'static str) -> Self {
        Self {
            name: Cow::Borrowed(name),
            _service: PhantomData,
        }
    }

    /// Creates a token for a key computed at runtime.
    pub fn owned(name: impl Into<String>) -> Self {
        Self {
            name: Cow::Owned(name.into()),
            _service: PhantomData,
        }
    }

    /// Returns the string key.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn key_name(&self) -> KeyName {
        self.name.clone()
    }
}

impl<T: ?Sized + 'static> ServiceKey<T> {
    /// Returns the [`TypeId`] of the service type.
    #[inline]
    pub fn type_id(&self) -> TypeId {
        TypeId::of::<T>()
    }

    /// Returns the human-readable service type name.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        type_name::<T>()
    }
}

impl<T: ?Sized> Clone for ServiceKey<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            _service: PhantomData,
        }
    }
}

impl<T: ?Sized> PartialEq for ServiceKey<T> {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl<T: ?Sized> Eq for ServiceKey<T> {}

impl<T: ?Sized> Hash for ServiceKey<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl<T: ?Sized> fmt::Debug for ServiceKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ServiceKey({:?})", self.name)
    }
}

impl<T: ?Sized> fmt::Display for ServiceKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A string key qualified by an optional instance name.
///
/// An empty instance name is the same as no name: both address the default
/// instance.
///
/// ```
/// use stowage_container::key::InstanceKey;
///
/// assert_eq!(InstanceKey::new("IFoo", Some("")), InstanceKey::new("IFoo", None));
/// assert_ne!(InstanceKey::new("IFoo", Some("alt")), InstanceKey::new("IFoo", None));
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct InstanceKey {
    key: KeyName,
    instance: Option<String>,
}

impl InstanceKey {
    pub fn new(key: impl Into<KeyName>, instance: Option<&str>) -> Self {
        Self {
            key: key.into(),
            instance: normalize_instance(instance).map(str::to_owned),
        }
    }

    /// Returns the string key.
    #[inline]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the instance name, `None` for the default instance.
    #[inline]
    pub fn instance_name(&self) -> Option<&str> {
        self.instance.as_deref()
    }
}

impl fmt::Debug for InstanceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.instance {
            Some(name) => write!(f, "InstanceKey({}, name={:?})", self.key, name),
            None => write!(f, "InstanceKey({})", self.key),
        }
    }
}

impl fmt::Display for InstanceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.instance {
            Some(name) => write!(f, "{} (name={:?})", self.key, name),
            None => f.write_str(&self.key),
        }
    }
}

/// Maps `Some("")` to `None`.
#[inline]
pub(crate) fn normalize_instance(instance: Option<&str>) -> Option<&str> {
    instance.filter(|name| !name.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Store: Send + Sync {}
    struct Counter;

    #[test]
    fn key_exposes_name_and_type() {
        let key: ServiceKey<Counter> = ServiceKey::new("ICounter");
        assert_eq!(key.name(), "ICounter");
        assert!(key.type_name().contains("Counter"));
        assert_eq!(key.type_id(), TypeId::of::<Counter>());
    }

    #[test]
    fn unsized_service_type() {
        const STORE: ServiceKey<dyn Store> = ServiceKey::new("IStore");
        assert_eq!(STORE.type_id(), TypeId::of::<dyn Store>());
    }

    #[test]
    fn keys_compare_by_name() {
        let a: ServiceKey<Counter> = ServiceKey::new("ICounter");
        let b: ServiceKey<Counter> = ServiceKey::new("ICounter");
        let c: ServiceKey<Counter> = ServiceKey::new("IOther");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn key_is_clone_without_clone_service() {
        let a: ServiceKey<dyn Store> = ServiceKey::new("IStore");
        let b = a.clone();
        assert_eq!(a.name(), b.name());
    }

    #[test]
    fn runtime_key_equals_literal_key() {
        let page = 7;
        let computed: ServiceKey<Counter> = ServiceKey::owned(format!("PageStore/{page}"));
        let literal: ServiceKey<Counter> = ServiceKey::new("PageStore/7");
        assert_eq!(computed, literal);
        assert_eq!(computed.to_string(), "PageStore/7");
    }

    #[test]
    fn instance_key_accepts_owned_names() {
        let owned = InstanceKey::new(String::from("IFoo"), Some("alt"));
        assert_eq!(owned, InstanceKey::new("IFoo", Some("alt")));
        assert_eq!(owned.key(), "IFoo");
    }

    #[test]
    fn instance_key_display() {
        assert_eq!(InstanceKey::new("IFoo", None).to_string(), "IFoo");
        assert_eq!(
            InstanceKey::new("IFoo", Some("alt")).to_string(),
            "IFoo (name=\"alt\")"
        );
    }

    #[test]
    fn empty_instance_name_is_default() {
        let key = InstanceKey::new("IFoo", Some(""));
        assert_eq!(key.instance_name(), None);
    }

    #[test]
    fn instance_key_in_hashmap() {
        use std::collections::HashMap;
        let mut map = HashMap::new();
        map.insert(InstanceKey::new("IFoo", None), 1);
        map.insert(InstanceKey::new("IFoo", Some("alt")), 2);
        assert_eq!(map.get(&InstanceKey::new("IFoo", Some(""))), Some(&1));
        assert_eq!(map.get(&InstanceKey::new("IFoo", Some("alt"))), Some(&2));
        assert_eq!(map.get(&InstanceKey::new("IBar", None)), None);
    }
}
