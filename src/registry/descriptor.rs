//! # Service lifetimes and registration records.
//!
//! [`Lifetime`] selects how the registry reuses instances; a
//! [`ServiceDescriptor`] is the registry's internal record for one
//! registration (factory, lifetime, declared dependencies, cached singleton
//! instance, optional cleanup hook).

use std::any::Any;
use std::sync::Arc;
use std::time::SystemTime;

use crate::error::RegistryError;
use crate::registry::container::Resolver;
use crate::registry::token::ServiceId;

/// Type-erased service instance, as stored in the registry caches.
pub(crate) type AnyService = Arc<dyn Any + Send + Sync>;

/// Type-erased factory invoked to build an instance.
///
/// The factory receives a [`Resolver`] and obtains its dependencies by
/// calling [`Resolver::resolve`] on it, in declaration order.
pub(crate) type ServiceFactory =
    Arc<dyn Fn(&mut Resolver<'_>) -> Result<AnyService, RegistryError> + Send + Sync>;

/// Type-erased cleanup hook run by `dispose()` on a cached singleton.
pub(crate) type ServiceDisposer = Arc<dyn Fn(&AnyService) + Send + Sync>;

/// Policy governing instance reuse across resolutions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lifetime {
    /// One instance for the registry's lifetime, built on first resolve.
    Singleton,
    /// A new instance on every resolve.
    Transient,
    /// One instance per scope.
    ///
    /// Within a registry created by
    /// [`create_scope`](crate::ServiceRegistry::create_scope), repeated
    /// resolves share one instance for the scope's lifetime. On a root
    /// registry, each top-level `resolve()` call acts as its own implicit
    /// scope: the instance is shared within that call tree and discarded
    /// afterwards.
    Scoped,
}

/// Internal record for one registration.
///
/// Created by `register(...)`, replaced wholesale on re-registration
/// (last write wins), destroyed when the owning registry is disposed.
/// `dependencies` is fixed at registration time and never mutated.
pub(crate) struct ServiceDescriptor {
    pub(crate) factory: ServiceFactory,
    pub(crate) lifetime: Lifetime,
    pub(crate) dependencies: Vec<ServiceId>,
    pub(crate) instance: Option<AnyService>,
    pub(crate) disposer: Option<ServiceDisposer>,
    pub(crate) registered_at: SystemTime,
}
