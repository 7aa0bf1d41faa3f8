//! # Registration bundle for one service.
//!
//! [`Registration`] packages everything the registry needs to know about a
//! service: its lifetime, the factory that builds it, the dependencies it
//! declares, and an optional cleanup hook for singleton teardown.
//!
//! A registration can be created:
//! - **Explicitly** with [`Registration::new`] (full control)
//! - **Via shorthands** [`Registration::singleton`], [`Registration::transient`],
//!   [`Registration::scoped`]
//!
//! ## Rules
//! - The declared dependency list is fixed once the registration is handed to
//!   [`ServiceRegistry::register`](crate::ServiceRegistry::register).
//! - The factory obtains dependencies through its [`Resolver`] argument; the
//!   declared list is metadata for introspection and diagnostics.
//!
//! ## Example
//! ```
//! use std::sync::Arc;
//! use wirebus::{Lifetime, Registration, Resolver, ServiceRegistry};
//!
//! struct AuditLog;
//! struct EmployeeService { audit: Arc<AuditLog> }
//!
//! let registry = ServiceRegistry::new();
//! registry.register(Registration::singleton(|_: &mut Resolver<'_>| Ok(Arc::new(AuditLog))));
//! registry.register(
//!     Registration::new(Lifetime::Transient, |r: &mut Resolver<'_>| {
//!         Ok(Arc::new(EmployeeService { audit: r.resolve::<AuditLog>()? }))
//!     })
//!     .depends_on::<AuditLog>(),
//! );
//!
//! let svc = registry.resolve::<EmployeeService>().unwrap();
//! # let _ = svc;
//! ```

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::SystemTime;

use crate::error::RegistryError;
use crate::registry::container::Resolver;
use crate::registry::descriptor::{
    AnyService, Lifetime, ServiceDescriptor, ServiceDisposer, ServiceFactory,
};
use crate::registry::token::ServiceId;

/// Registration bundle for service type `T`.
pub struct Registration<T> {
    lifetime: Lifetime,
    factory: ServiceFactory,
    dependencies: Vec<ServiceId>,
    disposer: Option<ServiceDisposer>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> Registration<T> {
    /// Creates a registration with an explicit lifetime.
    pub fn new<F>(lifetime: Lifetime, factory: F) -> Self
    where
        F: Fn(&mut Resolver<'_>) -> Result<Arc<T>, RegistryError> + Send + Sync + 'static,
    {
        let erased: ServiceFactory = Arc::new(move |resolver: &mut Resolver<'_>| {
            factory(resolver).map(|svc| svc as AnyService)
        });
        Self {
            lifetime,
            factory: erased,
            dependencies: Vec::new(),
            disposer: None,
            _marker: PhantomData,
        }
    }

    /// Shorthand for [`Lifetime::Singleton`].
    pub fn singleton<F>(factory: F) -> Self
    where
        F: Fn(&mut Resolver<'_>) -> Result<Arc<T>, RegistryError> + Send + Sync + 'static,
    {
        Self::new(Lifetime::Singleton, factory)
    }

    /// Shorthand for [`Lifetime::Transient`].
    pub fn transient<F>(factory: F) -> Self
    where
        F: Fn(&mut Resolver<'_>) -> Result<Arc<T>, RegistryError> + Send + Sync + 'static,
    {
        Self::new(Lifetime::Transient, factory)
    }

    /// Shorthand for [`Lifetime::Scoped`].
    pub fn scoped<F>(factory: F) -> Self
    where
        F: Fn(&mut Resolver<'_>) -> Result<Arc<T>, RegistryError> + Send + Sync + 'static,
    {
        Self::new(Lifetime::Scoped, factory)
    }

    /// Declares a dependency on service type `D`.
    ///
    /// Declaration order is preserved and should match the order the factory
    /// resolves its dependencies in.
    pub fn depends_on<D: Send + Sync + 'static>(mut self) -> Self {
        self.dependencies.push(ServiceId::of::<D>());
        self
    }

    /// Attaches a cleanup hook invoked by
    /// [`dispose`](crate::ServiceRegistry::dispose) on the cached singleton
    /// instance.
    ///
    /// Hooks only ever run for instances the registry cached itself, so
    /// attaching one to a transient registration has no effect.
    pub fn dispose_with<F>(mut self, hook: F) -> Self
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let erased: ServiceDisposer = Arc::new(move |svc: &AnyService| {
            if let Some(concrete) = svc.downcast_ref::<T>() {
                hook(concrete);
            }
        });
        self.disposer = Some(erased);
        self
    }

    pub(crate) fn into_descriptor(self) -> (ServiceId, ServiceDescriptor) {
        let id = ServiceId::of::<T>();
        let descriptor = ServiceDescriptor {
            factory: self.factory,
            lifetime: self.lifetime,
            dependencies: self.dependencies,
            instance: None,
            disposer: self.disposer,
            registered_at: SystemTime::now(),
        };
        (id, descriptor)
    }
}
