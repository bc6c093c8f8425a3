//! # The Container
//!
//! The resolution engine: lazily creates instances on first resolve, caches
//! them per (key, instance name), and falls back to parent containers for
//! keys it does not know.
//!
//! # Architecture
//! ```text
//! ContainerBuilder ──build()──> Container ──parents──> [Container, ...]
//!        │                          │
//!   register(key, rule)        resolve(key)
//!        │                          │
//!        ▼                          ▼
//!   Registration             local entry? ── no ──> parents, in order
//! ```
//!
//! # Examples
//! ```rust
//! use std::sync::Arc;
//! use stowage_container::prelude::*;
//!
//! trait RouterStore: Send + Sync {
//!     fn path(&self) -> String;
//! }
//!
//! struct HistoryRouter;
//! impl RouterStore for HistoryRouter {
//!     fn path(&self) -> String { "/home".into() }
//! }
//!
//! struct PageStore {
//!     router: Arc<dyn RouterStore>,
//! }
//!
//! const ROUTER: ServiceKey<dyn RouterStore> = ServiceKey::new("IRouterStore");
//! const PAGE: ServiceKey<PageStore> = ServiceKey::new("IPageStore");
//!
//! let mut global = Container::builder();
//! global.register(&ROUTER, |_| Ok(Arc::new(HistoryRouter) as Arc<dyn RouterStore>));
//! let global = global.build().expect("Failed to build container");
//!
//! let mut page = Container::builder();
//! page.add_parent_container(global)
//!     .register(&PAGE, |r| Ok(Arc::new(PageStore { router: r.resolve(&ROUTER)? })));
//! let page = page.build().expect("Failed to build container");
//!
//! let store = page.resolve(&PAGE).expect("Failed to resolve");
//! assert_eq!(store.router.path(), "/home");
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use once_cell::sync::OnceCell;
use stowage_support::rendering::suggest_similar;
use tracing::{debug, info, instrument, trace};

use crate::error::{
    Misconfiguration, MisconfiguredRegistrationError, ResolutionError, Result, StowageError,
    TypeMismatchError,
};
use crate::key::{InstanceKey, KeyName, ServiceKey};
use crate::path::ResolutionPath;
use crate::provider::Provider;
use crate::registration::Registration;
use crate::registry::{
    Cardinality, CompiledRule, CreationRule, Entry, Instance, InstanceCell, Lookup,
    RegistrationMap, Resolver,
};
use crate::scope::CacheScope;
use crate::settings::ContainerSettings;

/// How many "did you mean?" suggestions a resolution error carries.
const MAX_SUGGESTIONS: usize = 3;

/// Process-unique identity of a built container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContainerId(u64);

impl ContainerId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ============================================================
// ContainerBuilder
// ============================================================

/// Builds a [`Container`] from registered creation rules.
///
/// Register rules and parents, then call [`build()`](ContainerBuilder::build).
/// Building drains the registrations, so the same builder can mint further
/// containers after being re-populated. Parents and settings are kept.
///
/// # Examples
/// ```rust,ignore
/// let mut builder = Container::builder();
/// builder.add_parent_container(global);
/// builder.register(&FORM_PAGE_STORE, |r| { ... });
/// builder.register(&VALIDATOR, |_| { ... }).in_collection();
/// let container = builder.build()?;
/// ```
#[derive(Debug, Default)]
pub struct ContainerBuilder {
    registrations: RegistrationMap,
    parents: Vec<Arc<Container>>,
    settings: ContainerSettings,
}

impl ContainerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces all settings.
    pub fn with_settings(&mut self, settings: ContainerSettings) -> &mut Self {
        self.settings = settings;
        self
    }

    /// Allow overriding previously registered keys (the default).
    pub fn allow_override(&mut self, allow: bool) -> &mut Self {
        self.settings.allow_override = allow;
        self
    }

    pub fn settings(&self) -> ContainerSettings {
        self.settings
    }

    /// Appends a parent consulted when a key is unknown locally.
    ///
    /// Parents are consulted in the order added; the first one that can
    /// resolve the key wins.
    pub fn add_parent_container(&mut self, parent: Arc<Container>) -> &mut Self {
        debug!(parent = %parent.id(), position = self.parents.len(), "Added parent container");
        self.parents.push(parent);
        self
    }

    /// Registers a creation rule for `key`.
    ///
    /// The rule runs at most once per (key, instance name) and cache owner.
    /// The returned [`Registration`] can name the rule or make it a
    /// collection entry.
    pub fn register<T, F>(&mut self, key: &ServiceKey<T>, factory: F) -> Registration<'_>
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&dyn Resolver) -> Result<Arc<T>> + Send + Sync + 'static,
    {
        self.register_rule(key, &CreationRule::new(factory))
    }

    /// Registers an existing rule value, sharing its rule-scoped slots.
    pub fn register_rule<T>(&mut self, key: &ServiceKey<T>, rule: &CreationRule<T>) -> Registration<'_>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        Registration::new(self.registrations.push(key.key_name(), rule.erase()))
    }

    /// Registers an already created instance.
    pub fn register_value<T>(&mut self, key: &ServiceKey<T>, value: Arc<T>) -> Registration<'_>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.register(key, move |_| Ok(Arc::clone(&value)))
    }

    /// Applies a [`Provider`] module.
    pub fn add_provider(&mut self, provider: &dyn Provider) -> &mut Self {
        let before = self.registrations.len();
        provider.register(self);
        debug!(
            provider = provider.name(),
            registered = self.registrations.len() - before,
            "Applied provider"
        );
        self
    }

    /// Returns the number of pending registrations.
    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// Build the container from the pending registrations.
    ///
    /// The builder is left with an empty registration map either way.
    ///
    /// # Errors
    /// - [`StowageError::MisconfiguredRegistration`]: contradictory registrations
    /// - [`StowageError::AlreadyRegistered`]: duplicate with overrides disabled
    #[instrument(skip(self), name = "container_build")]
    pub fn build(&mut self) -> Result<Arc<Container>> {
        let registrations = std::mem::take(&mut self.registrations);
        info!(
            registered = registrations.len(),
            parents = self.parents.len(),
            "Building container"
        );

        let entries = registrations.compile(self.settings.allow_override)?;

        let container = Container {
            id: ContainerId::next(),
            entries,
            parents: self.parents.clone(),
            settings: self.settings,
            cache: DashMap::new(),
            known_keys: OnceCell::new(),
        };

        info!(id = %container.id, keys = container.len(), "Container built successfully ✓");
        Ok(Arc::new(container))
    }
}

// ═══════════════════════════════════════════
// Container
// ═══════════════════════════════════════════

/// Container-owned cache slot: the requested key plus the rule's position
/// within its entry (always 0 for single entries).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheSlot {
    key: InstanceKey,
    position: usize,
}

/// Immutable, thread-safe resolution engine.
///
/// Created by [`ContainerBuilder::build()`]. Only the instance cache changes
/// after construction, and only as a side effect of resolution.
pub struct Container {
    id: ContainerId,
    entries: HashMap<KeyName, Entry>,
    parents: Vec<Arc<Container>>,
    settings: ContainerSettings,
    cache: DashMap<CacheSlot, InstanceCell>,
    known_keys: OnceCell<Vec<KeyName>>,
}

impl Container {
    /// Create a new builder.
    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::new()
    }

    pub fn id(&self) -> ContainerId {
        self.id
    }

    /// Resolve the default instance of `key`.
    ///
    /// ```rust,ignore
    /// let router: Arc<dyn RouterStore> = container.resolve(&ROUTER_STORE)?;
    /// ```
    pub fn resolve<T: ?Sized + Send + Sync + 'static>(&self, key: &ServiceKey<T>) -> Result<Arc<T>> {
        self.as_resolver().resolve(key)
    }

    /// Resolve the instance of `key` named `name`.
    ///
    /// Uses the rule registered under `name` if there is one, otherwise the
    /// default rule, which then yields a separate singleton for `name`.
    pub fn resolve_named<T: ?Sized + Send + Sync + 'static>(
        &self,
        key: &ServiceKey<T>,
        name: &str,
    ) -> Result<Arc<T>> {
        self.as_resolver().resolve_named(key, name)
    }

    /// Like [`resolve`](Self::resolve), but `Ok(None)` when neither this
    /// container nor any parent provides `key`.
    ///
    /// Errors raised while constructing the instance still propagate.
    pub fn try_resolve<T: ?Sized + Send + Sync + 'static>(
        &self,
        key: &ServiceKey<T>,
    ) -> Result<Option<Arc<T>>> {
        self.as_resolver().try_resolve(key)
    }

    /// Resolve every collection entry of `key`, in registration order.
    ///
    /// A single registration yields a one-element sequence.
    pub fn resolve_all<T: ?Sized + Send + Sync + 'static>(
        &self,
        key: &ServiceKey<T>,
    ) -> Result<Vec<Arc<T>>> {
        self.as_resolver().resolve_all(key)
    }

    pub fn resolve_all_named<T: ?Sized + Send + Sync + 'static>(
        &self,
        key: &ServiceKey<T>,
        name: &str,
    ) -> Result<Vec<Arc<T>>> {
        self.as_resolver().resolve_all_named(key, name)
    }

    /// Like [`resolve_all`](Self::resolve_all), but `Ok(None)` when nothing
    /// in the chain can serve the default instance of `key`.
    pub fn try_resolve_all<T: ?Sized + Send + Sync + 'static>(
        &self,
        key: &ServiceKey<T>,
    ) -> Result<Option<Vec<Arc<T>>>> {
        self.as_resolver().try_resolve_all(key)
    }

    /// Returns `true` if this container or a parent has an entry for `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key) || self.parents.iter().any(|p| p.contains(key))
    }

    /// Returns the locally registered keys, sorted.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.entries.keys().map(|key| key.as_ref()).collect();
        keys.sort_unstable();
        keys
    }

    pub fn parents(&self) -> &[Arc<Container>] {
        &self.parents
    }

    /// Returns the number of locally registered keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns how many instances this container has cached itself.
    pub fn cached_instances(&self) -> usize {
        self.cache.iter().filter(|slot| slot.value().get().is_some()).count()
    }

    fn as_resolver(&self) -> &dyn Resolver {
        self
    }

    /// Entry point for every lookup against this container.
    fn resolve_in(&self, lookup: &Lookup, path: &ResolutionPath) -> Result<Option<Vec<Instance>>> {
        trace!(container = %self.id, key = %lookup.key, depth = path.depth(), "Resolving");

        match self.find(lookup, path) {
            Some(result) => result.map(Some),
            None if lookup.optional => Ok(None),
            None => Err(self.not_registered(lookup)),
        }
    }

    /// Local entry first, then parents in order. `None` if nothing can serve the lookup.
    fn find(&self, lookup: &Lookup, path: &ResolutionPath) -> Option<Result<Vec<Instance>>> {
        if let Some(result) = self.resolve_local(lookup, path) {
            return Some(result);
        }

        self.parents.iter().find_map(|parent| {
            trace!(container = %self.id, parent = %parent.id, key = %lookup.key, "Falling back to parent");
            parent.find(lookup, path)
        })
    }

    fn resolve_local(&self, lookup: &Lookup, path: &ResolutionPath) -> Option<Result<Vec<Instance>>> {
        let entry = self.entries.get(lookup.key.key())?;

        if entry.service_type_id() != lookup.type_id {
            return Some(Err(StowageError::TypeMismatch(TypeMismatchError {
                key: lookup.key.clone(),
                expected: lookup.type_name,
                registered: entry.service_type_name(),
            })));
        }

        match entry {
            Entry::Single { .. } => {
                let rule = entry.rule_for(lookup.key.instance_name())?;
                Some(self.instantiate(rule, &lookup.key, 0, path).map(|i| vec![i]))
            }
            Entry::Collection(_) if lookup.cardinality == Cardinality::One => Some(Err(
                StowageError::MisconfiguredRegistration(MisconfiguredRegistrationError {
                    key: lookup.key.clone(),
                    problem: Misconfiguration::CollectionResolvedAsSingle,
                }),
            )),
            Entry::Collection(rules) => Some(
                rules
                    .iter()
                    .enumerate()
                    .map(|(position, rule)| self.instantiate(rule, &lookup.key, position, path))
                    .collect(),
            ),
        }
    }

    /// Returns the cached instance for the slot, creating it on first use.
    ///
    /// Concurrent first resolutions of one slot wait on the same cell, so
    /// the rule runs at most once per slot.
    fn instantiate(
        &self,
        rule: &CompiledRule,
        key: &InstanceKey,
        position: usize,
        path: &ResolutionPath,
    ) -> Result<Instance> {
        let cell = match rule.scope {
            CacheScope::Container => self.cache_cell(CacheSlot {
                key: key.clone(),
                position,
            }),
            CacheScope::Rule => rule.rule.slots.cell(key.instance_name()),
        };

        if let Some(instance) = cell.get() {
            trace!(container = %self.id, key = %key, "Cache hit");
            return Ok(Arc::clone(instance));
        }

        // Must run before waiting on the cell: a rule re-entering a cell it
        // is initialising would block forever.
        let path = if self.settings.detect_cycles {
            path.enter(self.id, key)?
        } else {
            path.clone()
        };

        cell.get_or_try_init(|| self.construct(rule, key, path)).map(Arc::clone)
    }

    /// Clones the cell out of the map so no shard guard is held while a
    /// rule runs; rules resolve other keys from this container.
    fn cache_cell(&self, slot: CacheSlot) -> InstanceCell {
        let existing = self.cache.get(&slot).map(|cell| Arc::clone(cell.value()));
        existing.unwrap_or_else(|| Arc::clone(self.cache.entry(slot).or_default().value()))
    }

    fn construct(&self, rule: &CompiledRule, key: &InstanceKey, path: ResolutionPath) -> Result<Instance> {
        debug!(
            container = %self.id,
            key = %key,
            service = rule.rule.type_name,
            scope = %rule.scope,
            "Creating instance"
        );

        let resolver: &dyn Resolver = &ContainerResolver {
            container: self,
            path,
        };
        (rule.rule.factory)(resolver)
    }

    fn not_registered(&self, lookup: &Lookup) -> StowageError {
        let known = self.known_keys.get_or_init(|| {
            let mut keys = Vec::new();
            self.collect_keys(&mut keys);
            keys.sort_unstable();
            keys.dedup();
            keys
        });
        let known: Vec<&str> = known.iter().map(|key| key.as_ref()).collect();

        let mut named_instances = Vec::new();
        if lookup.key.instance_name().is_none() {
            self.collect_named_instances(lookup.key.key(), &mut named_instances);
            named_instances.sort_unstable();
            named_instances.dedup();
        }

        StowageError::NotRegistered(ResolutionError {
            requested: lookup.key.clone(),
            parents_searched: self.parents.len(),
            suggestions: suggest_similar(lookup.key.key(), &known, MAX_SUGGESTIONS),
            named_instances,
        })
    }

    fn collect_keys(&self, into: &mut Vec<KeyName>) {
        into.extend(self.entries.keys().cloned());
        for parent in &self.parents {
            parent.collect_keys(into);
        }
    }

    fn collect_named_instances(&self, key: &str, into: &mut Vec<String>) {
        if let Some(Entry::Single { named, .. }) = self.entries.get(key) {
            into.extend(named.keys().cloned());
        }
        for parent in &self.parents {
            parent.collect_named_instances(key, into);
        }
    }
}

impl Resolver for Container {
    fn resolve_lookup(&self, lookup: &Lookup) -> Result<Option<Vec<Instance>>> {
        self.resolve_in(lookup, &ResolutionPath::default())
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("id", &self.id)
            .field("registered", &self.entries.len())
            .field("parents", &self.parents.len())
            .field("cached", &self.cache.len())
            .finish()
    }
}

// ═══════════════════════════════════════════
// ContainerResolver (internal bridge)
// ═══════════════════════════════════════════

/// Resolver passed to creation rules; carries the keys under construction.
struct ContainerResolver<'a> {
    container: &'a Container,
    path: ResolutionPath,
}

impl Resolver for ContainerResolver<'_> {
    fn resolve_lookup(&self, lookup: &Lookup) -> Result<Option<Vec<Instance>>> {
        self.container.resolve_in(lookup, &self.path)
    }
}

// ═══════════════════════════════════════════
// Prelude
// ═══════════════════════════════════════════

pub mod prelude {
    pub use super::{Container, ContainerBuilder, ContainerId};
    pub use crate::error::{Result, StowageError};
    pub use crate::key::{InstanceKey, KeyName, ServiceKey};
    pub use crate::provider::Provider;
    pub use crate::registration::Registration;
    pub use crate::registry::{CreationRule, Resolver};
    pub use crate::scope::CacheScope;
    pub use crate::settings::ContainerSettings;
}

// ═══════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════
