//! Registration map: creation rules recorded by a builder and the
//! per-key entries a container resolves from.
//!
//! Builders record every `register` call as a [`PendingRule`] in
//! registration order. `build()` compiles that log into one [`Entry`] per
//! key: either a single entry (default rule plus named rules) or an ordered
//! collection.

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::collections::hash_map::Entry as MapEntry;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::error::{
    AlreadyRegisteredError, Misconfiguration, MisconfiguredRegistrationError, Result,
    StowageError, TypeMismatchError,
};
use crate::key::{InstanceKey, KeyName, ServiceKey, normalize_instance};
use crate::scope::CacheScope;

/// A created instance, type-erased.
///
/// The boxed value is always an `Arc<T>` for the registered service type `T`,
/// so trait-object services survive the round trip through `Any`.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Type-erased creation rule.
pub(crate) type FactoryFn = Arc<dyn Fn(&dyn Resolver) -> Result<Instance> + Send + Sync>;

/// Whether a lookup wants one instance or the whole collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    One,
    All,
}

/// An erased resolution request.
#[derive(Debug, Clone)]
pub struct Lookup {
    pub key: InstanceKey,
    pub type_id: TypeId,
    pub type_name: &'static str,
    pub cardinality: Cardinality,
    /// When `true`, a total miss yields `Ok(None)` instead of `NotRegistered`.
    pub optional: bool,
}

impl Lookup {
    pub fn new<T: ?Sized + 'static>(
        key: &ServiceKey<T>,
        instance: Option<&str>,
        cardinality: Cardinality,
    ) -> Self {
        Self {
            key: InstanceKey::new(key.key_name(), instance),
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            cardinality,
            optional: false,
        }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }
}

/// Trait for resolving dependencies.
///
/// This is what creation rules receive to resolve their own dependencies.
/// Separated from Container so the in-flight resolution path travels with it.
pub trait Resolver: Send + Sync {
    /// Resolves an erased request.
    ///
    /// Returns the instances in registration order: exactly one for
    /// [`Cardinality::One`]. `Ok(None)` only for optional lookups that
    /// nothing can satisfy.
    fn resolve_lookup(&self, lookup: &Lookup) -> Result<Option<Vec<Instance>>>;
}

impl dyn Resolver + '_ {
    /// Resolves the default instance of `key`.
    pub fn resolve<T: ?Sized + Send + Sync + 'static>(&self, key: &ServiceKey<T>) -> Result<Arc<T>> {
        self.resolve_one(key, None)
    }

    /// Resolves the instance of `key` named `name`.
    pub fn resolve_named<T: ?Sized + Send + Sync + 'static>(
        &self,
        key: &ServiceKey<T>,
        name: &str,
    ) -> Result<Arc<T>> {
        self.resolve_one(key, Some(name))
    }

    /// Like [`resolve`](Self::resolve), but `Ok(None)` when nothing provides `key`.
    pub fn try_resolve<T: ?Sized + Send + Sync + 'static>(
        &self,
        key: &ServiceKey<T>,
    ) -> Result<Option<Arc<T>>> {
        let lookup = Lookup::new(key, None, Cardinality::One).optional();
        match self.resolve_lookup(&lookup)? {
            Some(instances) => first_instance(&lookup, instances).map(Some),
            None => Ok(None),
        }
    }

    /// Resolves every collection entry of `key` in registration order.
    pub fn resolve_all<T: ?Sized + Send + Sync + 'static>(
        &self,
        key: &ServiceKey<T>,
    ) -> Result<Vec<Arc<T>>> {
        self.resolve_many(key, None)
    }

    /// Like [`resolve_all`](Self::resolve_all), but `Ok(None)` when nothing
    /// provides the default instance of `key`.
    pub fn try_resolve_all<T: ?Sized + Send + Sync + 'static>(
        &self,
        key: &ServiceKey<T>,
    ) -> Result<Option<Vec<Arc<T>>>> {
        let lookup = Lookup::new(key, None, Cardinality::All).optional();
        match self.resolve_lookup(&lookup)? {
            Some(instances) => instances
                .iter()
                .map(|instance| downcast::<T>(&lookup, instance))
                .collect::<Result<Vec<_>>>()
                .map(Some),
            None => Ok(None),
        }
    }

    /// Resolves every collection entry of `key` for instance `name`.
    pub fn resolve_all_named<T: ?Sized + Send + Sync + 'static>(
        &self,
        key: &ServiceKey<T>,
        name: &str,
    ) -> Result<Vec<Arc<T>>> {
        self.resolve_many(key, Some(name))
    }

    fn resolve_one<T: ?Sized + Send + Sync + 'static>(
        &self,
        key: &ServiceKey<T>,
        instance: Option<&str>,
    ) -> Result<Arc<T>> {
        let lookup = Lookup::new(key, instance, Cardinality::One);
        let instances = self
            .resolve_lookup(&lookup)?
            .ok_or_else(|| missing_after_required(&lookup))?;
        first_instance(&lookup, instances)
    }

    fn resolve_many<T: ?Sized + Send + Sync + 'static>(
        &self,
        key: &ServiceKey<T>,
        instance: Option<&str>,
    ) -> Result<Vec<Arc<T>>> {
        let lookup = Lookup::new(key, instance, Cardinality::All);
        self.resolve_lookup(&lookup)?
            .ok_or_else(|| missing_after_required(&lookup))?
            .iter()
            .map(|instance| downcast::<T>(&lookup, instance))
            .collect()
    }
}

fn first_instance<T: ?Sized + Send + Sync + 'static>(
    lookup: &Lookup,
    instances: Vec<Instance>,
) -> Result<Arc<T>> {
    let instance = instances
        .first()
        .ok_or_else(|| missing_after_required(lookup))?;
    downcast::<T>(lookup, instance)
}

/// A resolver that answered a required lookup with nothing.
fn missing_after_required(lookup: &Lookup) -> StowageError {
    StowageError::NotRegistered(crate::error::ResolutionError {
        requested: lookup.key.clone(),
        parents_searched: 0,
        suggestions: Vec::new(),
        named_instances: Vec::new(),
    })
}

pub(crate) fn downcast<T: ?Sized + Send + Sync + 'static>(
    lookup: &Lookup,
    instance: &Instance,
) -> Result<Arc<T>> {
    instance.downcast_ref::<Arc<T>>().cloned().ok_or_else(|| {
        StowageError::TypeMismatch(TypeMismatchError {
            key: lookup.key.clone(),
            expected: lookup.type_name,
            registered: "<unknown>",
        })
    })
}

// ═══════════════════════════════════════════
// Creation rules
// ═══════════════════════════════════════════

/// A reusable factory for service `T`.
///
/// Cloning a rule shares its factory and its rule-scoped singleton slots.
/// Registering one rule into several builders with [`CacheScope::Rule`]
/// therefore shares instances between the resulting containers.
///
/// ```
/// use std::sync::Arc;
/// use stowage_container::registry::CreationRule;
///
/// struct Counter(u32);
///
/// let rule: CreationRule<Counter> = CreationRule::new(|_| Ok(Arc::new(Counter(1))));
/// let _shared = rule.clone();
/// ```
pub struct CreationRule<T: ?Sized> {
    factory: Arc<dyn Fn(&dyn Resolver) -> Result<Arc<T>> + Send + Sync>,
    slots: Arc<RuleSlots>,
}

impl<T: ?Sized + Send + Sync + 'static> CreationRule<T> {
    pub fn new(factory: impl Fn(&dyn Resolver) -> Result<Arc<T>> + Send + Sync + 'static) -> Self {
        Self {
            factory: Arc::new(factory),
            slots: Arc::new(RuleSlots::default()),
        }
    }

    pub(crate) fn erase(&self) -> ErasedRule {
        let factory = Arc::clone(&self.factory);
        ErasedRule {
            factory: erased_factory(move |resolver| {
                factory(resolver).map(|service| Arc::new(service) as Instance)
            }),
            slots: Arc::clone(&self.slots),
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
        }
    }
}

impl<T: ?Sized> Clone for CreationRule<T> {
    fn clone(&self) -> Self {
        Self {
            factory: Arc::clone(&self.factory),
            slots: Arc::clone(&self.slots),
        }
    }
}

impl<T: ?Sized> fmt::Debug for CreationRule<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreationRule")
            .field("service", &type_name::<T>())
            .finish()
    }
}

fn erased_factory<F>(factory: F) -> FactoryFn
where
    F: Fn(&dyn Resolver) -> Result<Instance> + Send + Sync + 'static,
{
    Arc::new(factory)
}

/// A once-initialised instance slot.
///
/// Concurrent first resolutions of one slot block on the same cell, so the
/// creation rule runs at most once. A failed creation leaves the cell empty.
pub(crate) type InstanceCell = Arc<OnceCell<Instance>>;

/// Singleton slots owned by a rule value: a default slot plus one slot per
/// instance name.
#[derive(Default)]
pub(crate) struct RuleSlots {
    default: InstanceCell,
    named: Mutex<HashMap<String, InstanceCell>>,
}

impl RuleSlots {
    /// Returns the slot for `instance`, creating an empty one on first use.
    ///
    /// The map lock is released before the caller initialises the cell, so
    /// rules may resolve other names of the same rule.
    pub fn cell(&self, instance: Option<&str>) -> InstanceCell {
        match normalize_instance(instance) {
            None => Arc::clone(&self.default),
            Some(name) => Arc::clone(self.named.lock().entry(name.to_owned()).or_default()),
        }
    }
}

/// A creation rule with its service type erased.
#[derive(Clone)]
pub(crate) struct ErasedRule {
    pub factory: FactoryFn,
    pub slots: Arc<RuleSlots>,
    pub type_id: TypeId,
    pub type_name: &'static str,
}

// ═══════════════════════════════════════════
// Builder side: the registration log
// ═══════════════════════════════════════════

/// One `register` call, as configured through its handle.
pub(crate) struct PendingRule {
    pub key: KeyName,
    pub rule: ErasedRule,
    pub instance: Option<String>,
    pub collection: bool,
    pub scope: CacheScope,
}

impl fmt::Debug for PendingRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingRule")
            .field("key", &self.key)
            .field("service", &self.rule.type_name)
            .field("instance", &self.instance)
            .field("collection", &self.collection)
            .field("scope", &self.scope)
            .finish()
    }
}

/// Registrations accumulated by a builder, in registration order.
#[derive(Debug, Default)]
pub(crate) struct RegistrationMap {
    rules: Vec<PendingRule>,
}

impl RegistrationMap {
    /// Records a rule as the default single registration of `key` and
    /// returns it for further configuration.
    pub fn push(&mut self, key: impl Into<KeyName>, rule: ErasedRule) -> &mut PendingRule {
        let key = key.into();
        debug!(key = %key, service = rule.type_name, "Registered creation rule");
        let index = self.rules.len();
        self.rules.push(PendingRule {
            key,
            rule,
            instance: None,
            collection: false,
            scope: CacheScope::default(),
        });
        &mut self.rules[index]
    }

    /// Returns the number of `register` calls recorded.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Compiles the log into one entry per key.
    ///
    /// # Errors
    /// - [`StowageError::MisconfiguredRegistration`]: mixed single and
    ///   collection entries, named collection entries, conflicting types
    /// - [`StowageError::AlreadyRegistered`]: duplicate (key, instance name)
    ///   while `allow_override` is `false`
    pub fn compile(self, allow_override: bool) -> Result<HashMap<KeyName, Entry>> {
        let mut entries: HashMap<KeyName, Entry> = HashMap::new();

        for pending in self.rules {
            let key = pending.key;
            let compiled = CompiledRule {
                rule: pending.rule,
                scope: pending.scope,
            };

            if let (true, Some(name)) = (pending.collection, &pending.instance) {
                return Err(misconfigured(
                    InstanceKey::new(key, Some(name.as_str())),
                    Misconfiguration::NamedCollectionEntry { name: name.clone() },
                ));
            }

            let slot = match entries.entry(key.clone()) {
                MapEntry::Vacant(vacant) => {
                    vacant.insert(if pending.collection {
                        Entry::Collection(vec![compiled])
                    } else {
                        Entry::single(pending.instance, compiled)
                    });
                    continue;
                }
                MapEntry::Occupied(occupied) => occupied.into_mut(),
            };

            let existing_type = slot.service_type_name();
            if slot.service_type_id() != compiled.rule.type_id {
                return Err(misconfigured(
                    InstanceKey::new(key, None),
                    Misconfiguration::ConflictingTypes {
                        first: existing_type,
                        second: compiled.rule.type_name,
                    },
                ));
            }

            match (slot, pending.collection) {
                (Entry::Collection(rules), true) => rules.push(compiled),
                (Entry::Single { default, named }, false) => {
                    let instance_key = InstanceKey::new(key, pending.instance.as_deref());
                    let replaced = match pending.instance {
                        None => default.replace(compiled).is_some(),
                        Some(name) => named.insert(name, compiled).is_some(),
                    };
                    if replaced {
                        if !allow_override {
                            return Err(StowageError::AlreadyRegistered(
                                AlreadyRegisteredError { key: instance_key },
                            ));
                        }
                        warn!(key = %instance_key, "Registration overwritten, last registration wins");
                    }
                }
                _ => {
                    return Err(misconfigured(
                        InstanceKey::new(key, None),
                        Misconfiguration::MixedSingleAndCollection,
                    ));
                }
            }
        }

        Ok(entries)
    }
}

fn misconfigured(key: InstanceKey, problem: Misconfiguration) -> StowageError {
    StowageError::MisconfiguredRegistration(MisconfiguredRegistrationError { key, problem })
}

// ═══════════════════════════════════════════
// Container side: compiled entries
// ═══════════════════════════════════════════

/// A rule ready for resolution.
#[derive(Clone)]
pub(crate) struct CompiledRule {
    pub rule: ErasedRule,
    pub scope: CacheScope,
}

/// Everything registered under one key.
#[derive(Clone)]
pub(crate) enum Entry {
    /// An optional default rule plus rules for specific instance names.
    Single {
        default: Option<CompiledRule>,
        named: HashMap<String, CompiledRule>,
    },
    /// Rules resolved together, in registration order.
    Collection(Vec<CompiledRule>),
}

impl Entry {
    fn single(instance: Option<String>, rule: CompiledRule) -> Self {
        match instance {
            None => Entry::Single {
                default: Some(rule),
                named: HashMap::new(),
            },
            Some(name) => Entry::Single {
                default: None,
                named: HashMap::from([(name, rule)]),
            },
        }
    }

    fn first_rule(&self) -> Option<&CompiledRule> {
        match self {
            Entry::Single { default, named } => default.as_ref().or_else(|| named.values().next()),
            Entry::Collection(rules) => rules.first(),
        }
    }

    /// Service type of the entry; every rule in it shares this type.
    pub fn service_type_id(&self) -> TypeId {
        self.first_rule()
            .map(|r| r.rule.type_id)
            .unwrap_or_else(TypeId::of::<()>)
    }

    pub fn service_type_name(&self) -> &'static str {
        self.first_rule().map(|r| r.rule.type_name).unwrap_or("()")
    }

    /// Picks the rule for an instance name: the rule registered under that
    /// name, otherwise the default rule (which then yields a distinct
    /// singleton per name).
    pub fn rule_for(&self, instance: Option<&str>) -> Option<&CompiledRule> {
        match self {
            Entry::Single { default, named } => normalize_instance(instance)
                .and_then(|name| named.get(name))
                .or(default.as_ref()),
            Entry::Collection(_) => None,
        }
    }
}

impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entry::Single { default, named } => f
                .debug_struct("Single")
                .field("default", &default.is_some())
                .field("named", &named.keys().collect::<Vec<_>>())
                .finish(),
            Entry::Collection(rules) => f.debug_tuple("Collection").field(&rules.len()).finish(),
        }
    }
}
