//! # Service registry: registration, resolution, scopes, disposal.
//!
//! [`ServiceRegistry`] stores one [`Registration`] per service type and
//! builds instances on demand, honoring the registration's [`Lifetime`].
//! Factories receive a [`Resolver`] and pull their dependencies through it,
//! which gives every resolution a single call tree the registry can watch
//! for cycles.
//!
//! ## Architecture
//! ```text
//! resolve::<T>()
//!     │  fresh ResolutionContext { path, scoped cache }
//!     ▼
//! Resolver::resolve::<T>
//!     ├─ path revisit?          ──► Err(Cycle { chain })
//!     ├─ lookup: self → parent  ──► Err(NotFound) if absent everywhere
//!     ├─ Singleton cached?      ──► return shared instance
//!     ├─ Scoped cached?         ──► return scope-local instance
//!     └─ factory(resolver)      ──► recursive resolve for each dependency
//!            │
//!            └─ cache per lifetime (descriptor / scope / none)
//! ```
//!
//! ## Rules
//! - Re-registering a type replaces the previous registration (last write
//!   wins) and discards any cached singleton instance.
//! - No lock is held while a factory runs; factories may resolve freely
//!   without deadlocking the registry.
//! - A scope created by [`ServiceRegistry::create_scope`] delegates unknown
//!   lookups to its parent and owns its scoped-instance cache; disposing a
//!   scope never touches parent singletons.
//! - `dispose()` is idempotent and survives panicking cleanup hooks.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, warn};

use crate::error::RegistryError;
use crate::registry::descriptor::{AnyService, Lifetime, ServiceDescriptor, ServiceFactory};
use crate::registry::registration::Registration;
use crate::registry::token::ServiceId;

/// Transient state for one top-level resolution call tree.
///
/// Holds the resolution path (for cycle detection) and the per-resolution
/// scoped cache used when resolving on a root registry. Discarded when the
/// top-level `resolve()` returns.
#[derive(Default)]
struct ResolutionContext {
    path: Vec<ServiceId>,
    scoped: HashMap<ServiceId, AnyService>,
}

/// Dependency handle passed to service factories.
///
/// Carries the originating registry plus the live [`ResolutionContext`], so
/// factory-initiated resolutions share one path stack and one scoped cache
/// with the resolution that triggered them.
pub struct Resolver<'a> {
    registry: &'a ServiceRegistry,
    ctx: &'a mut ResolutionContext,
}

impl Resolver<'_> {
    /// Resolves a dependency within the current resolution call tree.
    ///
    /// Fails with [`RegistryError::Cycle`] when `T` is already being built on
    /// this path, or [`RegistryError::NotFound`] when `T` has no registration
    /// in the scope chain.
    pub fn resolve<T: Send + Sync + 'static>(&mut self) -> Result<Arc<T>, RegistryError> {
        let id = ServiceId::of::<T>();
        let any = self.resolve_id(id)?;
        any.downcast::<T>()
            .map_err(|_| RegistryError::TypeMismatch { service: id })
    }

    /// Resolves an optional dependency, swallowing resolution errors.
    pub fn try_resolve<T: Send + Sync + 'static>(&mut self) -> Option<Arc<T>> {
        match self.resolve::<T>() {
            Ok(svc) => Some(svc),
            Err(err) => {
                debug!(error = %err, "optional dependency not resolved");
                None
            }
        }
    }

    fn resolve_id(&mut self, id: ServiceId) -> Result<AnyService, RegistryError> {
        if self.ctx.path.contains(&id) {
            let mut chain = self.ctx.path.clone();
            chain.push(id);
            return Err(RegistryError::Cycle { chain });
        }

        // Zero-dependency services take the same push/pop round trip, so
        // cycle diagnostics always reflect the real path.
        self.ctx.path.push(id);
        let result = self.resolve_pushed(id);
        self.ctx.path.pop();
        result
    }

    fn resolve_pushed(&mut self, id: ServiceId) -> Result<AnyService, RegistryError> {
        let registry = self.registry;
        let Some(found) = registry.lookup(id) else {
            return Err(RegistryError::NotFound { service: id });
        };

        match found.lifetime {
            Lifetime::Singleton => {
                if let Some(existing) = found.cached {
                    return Ok(existing);
                }
            }
            Lifetime::Scoped => {
                if let Some(existing) = self.scoped_cached(id) {
                    return Ok(existing);
                }
            }
            Lifetime::Transient => {}
        }

        let built = (found.factory.as_ref())(&mut *self)?;

        match found.lifetime {
            Lifetime::Singleton => Ok(found.owner.store_singleton(id, built)),
            Lifetime::Scoped => Ok(self.store_scoped(id, built)),
            Lifetime::Transient => Ok(built),
        }
    }

    fn scoped_cached(&self, id: ServiceId) -> Option<AnyService> {
        if self.registry.is_scope {
            self.registry
                .scoped
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .get(&id)
                .cloned()
        } else {
            self.ctx.scoped.get(&id).cloned()
        }
    }

    fn store_scoped(&mut self, id: ServiceId, built: AnyService) -> AnyService {
        if self.registry.is_scope {
            self.registry
                .scoped
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .entry(id)
                .or_insert(built)
                .clone()
        } else {
            self.ctx.scoped.entry(id).or_insert(built).clone()
        }
    }
}

/// Result of a descriptor lookup across the scope chain.
struct Lookup<'r> {
    owner: &'r ServiceRegistry,
    lifetime: Lifetime,
    factory: ServiceFactory,
    cached: Option<AnyService>,
}

/// Service registry with singleton, transient and scoped lifetimes.
///
/// ## Example
/// ```
/// use std::sync::Arc;
/// use wirebus::{Resolver, ServiceRegistry};
///
/// struct AuditLog;
///
/// let registry = ServiceRegistry::new();
/// registry.register_singleton(|_: &mut Resolver<'_>| Ok(Arc::new(AuditLog)));
///
/// let a = registry.resolve::<AuditLog>().unwrap();
/// let b = registry.resolve::<AuditLog>().unwrap();
/// assert!(Arc::ptr_eq(&a, &b));
/// ```
pub struct ServiceRegistry {
    services: RwLock<HashMap<ServiceId, ServiceDescriptor>>,
    scoped: RwLock<HashMap<ServiceId, AnyService>>,
    parent: Option<Arc<ServiceRegistry>>,
    is_scope: bool,
}

impl ServiceRegistry {
    /// Creates a new root registry.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            services: RwLock::new(HashMap::new()),
            scoped: RwLock::new(HashMap::new()),
            parent: None,
            is_scope: false,
        })
    }

    /// Creates a child registry that delegates unknown lookups to `self`.
    ///
    /// The child owns its scoped-instance cache and any registrations made
    /// directly on it (which shadow the parent's). Parent singletons are
    /// shared: resolving a singleton through the child returns the parent's
    /// cached instance.
    pub fn create_scope(self: &Arc<Self>) -> Arc<ServiceRegistry> {
        Arc::new(ServiceRegistry {
            services: RwLock::new(HashMap::new()),
            scoped: RwLock::new(HashMap::new()),
            parent: Some(Arc::clone(self)),
            is_scope: true,
        })
    }

    /// Registers a service.
    ///
    /// Last write wins: a repeated registration for the same type replaces
    /// the previous descriptor, including any cached singleton instance, so
    /// the next resolve builds from the new factory.
    pub fn register<T: Send + Sync + 'static>(&self, registration: Registration<T>) {
        let (id, descriptor) = registration.into_descriptor();
        let mut services = self.services.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = services.insert(id, descriptor) {
            debug!(service = %id, since = ?previous.registered_at, "replaced registration");
        }
    }

    /// Registers a singleton service from a factory.
    pub fn register_singleton<T, F>(&self, factory: F)
    where
        T: Send + Sync + 'static,
        F: Fn(&mut Resolver<'_>) -> Result<Arc<T>, RegistryError> + Send + Sync + 'static,
    {
        self.register(Registration::singleton(factory));
    }

    /// Registers a transient service from a factory.
    pub fn register_transient<T, F>(&self, factory: F)
    where
        T: Send + Sync + 'static,
        F: Fn(&mut Resolver<'_>) -> Result<Arc<T>, RegistryError> + Send + Sync + 'static,
    {
        self.register(Registration::transient(factory));
    }

    /// Registers a scoped service from a factory.
    pub fn register_scoped<T, F>(&self, factory: F)
    where
        T: Send + Sync + 'static,
        F: Fn(&mut Resolver<'_>) -> Result<Arc<T>, RegistryError> + Send + Sync + 'static,
    {
        self.register(Registration::scoped(factory));
    }

    /// Builds or returns an instance of `T`.
    ///
    /// Each call starts a fresh resolution context; see [`Resolver::resolve`]
    /// for the failure modes.
    pub fn resolve<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, RegistryError> {
        let mut ctx = ResolutionContext::default();
        Resolver {
            registry: self,
            ctx: &mut ctx,
        }
        .resolve::<T>()
    }

    /// Like [`resolve`](Self::resolve), but swallows resolution errors.
    pub fn try_resolve<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        match self.resolve::<T>() {
            Ok(svc) => Some(svc),
            Err(err) => {
                debug!(error = %err, "try_resolve swallowed resolution error");
                None
            }
        }
    }

    /// Returns true when `T` is registered here or in any parent.
    pub fn is_registered<T: Send + Sync + 'static>(&self) -> bool {
        let id = ServiceId::of::<T>();
        let mut cur = Some(self);
        while let Some(reg) = cur {
            if reg
                .services
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .contains_key(&id)
            {
                return true;
            }
            cur = reg.parent.as_deref();
        }
        false
    }

    /// Returns the dependencies declared for `T`, in declaration order.
    pub fn dependencies_of<T: Send + Sync + 'static>(&self) -> Option<Vec<ServiceId>> {
        let id = ServiceId::of::<T>();
        let mut cur = Some(self);
        while let Some(reg) = cur {
            let services = reg.services.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(descriptor) = services.get(&id) {
                return Some(descriptor.dependencies.clone());
            }
            drop(services);
            cur = reg.parent.as_deref();
        }
        None
    }

    /// Tears the registry down.
    ///
    /// Runs each cached singleton's cleanup hook (a panicking hook is caught,
    /// logged, and disposal continues with the next instance), then clears
    /// all descriptors and caches. Idempotent.
    pub fn dispose(&self) {
        let drained: Vec<(ServiceId, ServiceDescriptor)> = {
            let mut services = self.services.write().unwrap_or_else(PoisonError::into_inner);
            services.drain().collect()
        };
        for (id, descriptor) in drained {
            let (Some(instance), Some(disposer)) = (descriptor.instance, descriptor.disposer)
            else {
                continue;
            };
            if panic::catch_unwind(AssertUnwindSafe(|| disposer(&instance))).is_err() {
                warn!(service = %id, "cleanup hook panicked; continuing disposal");
            }
        }
        self.scoped
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Finds the descriptor for `id` in this registry or the closest parent.
    ///
    /// Snapshots the factory and cache state so no lock is held while the
    /// factory runs.
    fn lookup(&self, id: ServiceId) -> Option<Lookup<'_>> {
        let mut cur = Some(self);
        while let Some(reg) = cur {
            let services = reg.services.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(descriptor) = services.get(&id) {
                return Some(Lookup {
                    owner: reg,
                    lifetime: descriptor.lifetime,
                    factory: Arc::clone(&descriptor.factory),
                    cached: descriptor.instance.clone(),
                });
            }
            drop(services);
            cur = reg.parent.as_deref();
        }
        None
    }

    /// Caches a freshly built singleton on the owning descriptor.
    ///
    /// Double-checked under the write lock: when a concurrent resolution got
    /// there first, its instance wins and is returned, preserving reference
    /// equality for every caller.
    fn store_singleton(&self, id: ServiceId, built: AnyService) -> AnyService {
        let mut services = self.services.write().unwrap_or_else(PoisonError::into_inner);
        match services.get_mut(&id) {
            Some(descriptor) => match &descriptor.instance {
                Some(existing) => Arc::clone(existing),
                None => {
                    descriptor.instance = Some(Arc::clone(&built));
                    built
                }
            },
            // Registration vanished mid-build (concurrent dispose); hand the
            // caller what was built, uncached.
            None => built,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    struct AuditLog;

    struct Repo;

    struct Pair {
        first: Arc<Repo>,
        second: Arc<Repo>,
    }

    struct CycleA;
    struct CycleB;

    fn register_cycle(registry: &ServiceRegistry) {
        registry.register_transient(|r: &mut Resolver<'_>| {
            r.resolve::<CycleB>()?;
            Ok(Arc::new(CycleA))
        });
        registry.register_transient(|r: &mut Resolver<'_>| {
            r.resolve::<CycleA>()?;
            Ok(Arc::new(CycleB))
        });
    }

    #[test]
    fn test_singleton_identity() {
        let registry = ServiceRegistry::new();
        registry.register_singleton(|_: &mut Resolver<'_>| Ok(Arc::new(AuditLog)));

        let a = registry.resolve::<AuditLog>().unwrap();
        let b = registry.resolve::<AuditLog>().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_singleton_shared_across_scopes() {
        let registry = ServiceRegistry::new();
        registry.register_singleton(|_: &mut Resolver<'_>| Ok(Arc::new(AuditLog)));

        let one = registry.create_scope();
        let two = registry.create_scope();
        let a = one.resolve::<AuditLog>().unwrap();
        let b = two.resolve::<AuditLog>().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_transient_distinctness() {
        let registry = ServiceRegistry::new();
        registry.register_transient(|_: &mut Resolver<'_>| Ok(Arc::new(Repo)));

        let a = registry.resolve::<Repo>().unwrap();
        let b = registry.resolve::<Repo>().unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_scoped_isolation_between_scopes() {
        let registry = ServiceRegistry::new();
        registry.register_scoped(|_: &mut Resolver<'_>| Ok(Arc::new(Repo)));

        let scope = registry.create_scope();
        let a = scope.resolve::<Repo>().unwrap();
        let b = scope.resolve::<Repo>().unwrap();
        assert!(Arc::ptr_eq(&a, &b), "same scope shares one instance");

        let other = registry.create_scope();
        let c = other.resolve::<Repo>().unwrap();
        assert!(!Arc::ptr_eq(&a, &c), "different scopes get distinct instances");
    }

    #[test]
    fn test_scoped_shared_within_one_root_resolution() {
        let registry = ServiceRegistry::new();
        registry.register_scoped(|_: &mut Resolver<'_>| Ok(Arc::new(Repo)));
        registry.register_transient(|r: &mut Resolver<'_>| {
            Ok(Arc::new(Pair {
                first: r.resolve::<Repo>()?,
                second: r.resolve::<Repo>()?,
            }))
        });

        let pair = registry.resolve::<Pair>().unwrap();
        assert!(Arc::ptr_eq(&pair.first, &pair.second));

        let again = registry.resolve::<Pair>().unwrap();
        assert!(
            !Arc::ptr_eq(&pair.first, &again.first),
            "each top-level resolve is its own implicit scope"
        );
    }

    #[test]
    fn test_not_found() {
        let registry = ServiceRegistry::new();
        match registry.resolve::<Repo>() {
            Err(err @ RegistryError::NotFound { .. }) => {
                assert_eq!(err.as_label(), "service_not_found");
            }
            other => panic!("expected NotFound, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_cycle_detected_from_both_entry_points() {
        let registry = ServiceRegistry::new();
        register_cycle(&registry);

        let a = ServiceId::of::<CycleA>();
        let b = ServiceId::of::<CycleB>();

        match registry.resolve::<CycleA>() {
            Err(RegistryError::Cycle { chain }) => {
                assert_eq!(chain.first(), Some(&a));
                assert_eq!(chain.last(), Some(&a));
                assert!(chain.contains(&b));
            }
            other => panic!("expected Cycle, got {:?}", other.map(|_| ())),
        }

        match registry.resolve::<CycleB>() {
            Err(RegistryError::Cycle { chain }) => {
                assert_eq!(chain.first(), Some(&b));
                assert_eq!(chain.last(), Some(&b));
                assert!(chain.contains(&a));
            }
            other => panic!("expected Cycle, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_try_resolve_swallows_errors() {
        let registry = ServiceRegistry::new();
        assert!(registry.try_resolve::<Repo>().is_none());

        register_cycle(&registry);
        assert!(registry.try_resolve::<CycleA>().is_none());
    }

    #[test]
    fn test_parent_delegation() {
        let registry = ServiceRegistry::new();
        registry.register_transient(|_: &mut Resolver<'_>| Ok(Arc::new(Repo)));

        let scope = registry.create_scope();
        assert!(scope.is_registered::<Repo>());
        assert!(scope.resolve::<Repo>().is_ok());
        assert!(!scope.is_registered::<AuditLog>());
    }

    #[test]
    fn test_reregistration_invalidates_singleton_cache() {
        let registry = ServiceRegistry::new();
        registry.register_singleton(|_: &mut Resolver<'_>| Ok(Arc::new(AuditLog)));
        let first = registry.resolve::<AuditLog>().unwrap();

        registry.register_singleton(|_: &mut Resolver<'_>| Ok(Arc::new(AuditLog)));
        let second = registry.resolve::<AuditLog>().unwrap();
        assert!(
            !Arc::ptr_eq(&first, &second),
            "re-registration must drop the cached instance"
        );
    }

    #[test]
    fn test_declared_dependencies_preserved_in_order() {
        let registry = ServiceRegistry::new();
        registry.register(
            Registration::transient(|r: &mut Resolver<'_>| {
                Ok(Arc::new(Pair {
                    first: r.resolve::<Repo>()?,
                    second: r.resolve::<Repo>()?,
                }))
            })
            .depends_on::<Repo>()
            .depends_on::<AuditLog>(),
        );

        let deps = registry.dependencies_of::<Pair>().unwrap();
        assert_eq!(deps, vec![ServiceId::of::<Repo>(), ServiceId::of::<AuditLog>()]);
        assert!(registry.dependencies_of::<Repo>().is_none());
    }

    #[test]
    fn test_dispose_runs_hooks_and_is_idempotent() {
        static CLEANED: AtomicUsize = AtomicUsize::new(0);

        let registry = ServiceRegistry::new();
        registry.register(
            Registration::singleton(|_: &mut Resolver<'_>| Ok(Arc::new(AuditLog)))
                .dispose_with(|_| {
                    CLEANED.fetch_add(1, Ordering::SeqCst);
                }),
        );

        registry.resolve::<AuditLog>().unwrap();
        registry.dispose();
        assert_eq!(CLEANED.load(Ordering::SeqCst), 1);

        registry.dispose();
        assert_eq!(CLEANED.load(Ordering::SeqCst), 1, "dispose is idempotent");
        assert!(registry.resolve::<AuditLog>().is_err());
    }

    #[test]
    fn test_dispose_survives_panicking_hook() {
        static OTHER_CLEANED: AtomicBool = AtomicBool::new(false);

        let registry = ServiceRegistry::new();
        registry.register(
            Registration::singleton(|_: &mut Resolver<'_>| Ok(Arc::new(AuditLog)))
                .dispose_with(|_| panic!("hook blew up")),
        );
        registry.register(
            Registration::singleton(|_: &mut Resolver<'_>| Ok(Arc::new(Repo))).dispose_with(
                |_| {
                    OTHER_CLEANED.store(true, Ordering::SeqCst);
                },
            ),
        );

        registry.resolve::<AuditLog>().unwrap();
        registry.resolve::<Repo>().unwrap();
        registry.dispose();
        assert!(OTHER_CLEANED.load(Ordering::SeqCst));
    }

    #[test]
    fn test_child_dispose_leaves_parent_untouched() {
        let registry = ServiceRegistry::new();
        registry.register_singleton(|_: &mut Resolver<'_>| Ok(Arc::new(AuditLog)));
        let before = registry.resolve::<AuditLog>().unwrap();

        let scope = registry.create_scope();
        scope.dispose();

        let after = registry.resolve::<AuditLog>().unwrap();
        assert!(Arc::ptr_eq(&before, &after));
    }

    #[test]
    fn test_optional_dependency_via_resolver() {
        let registry = ServiceRegistry::new();
        registry.register_transient(|r: &mut Resolver<'_>| {
            assert!(r.try_resolve::<AuditLog>().is_none());
            Ok(Arc::new(Repo))
        });
        assert!(registry.resolve::<Repo>().is_ok());
    }
}
