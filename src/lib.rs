//! # wirebus
//!
//! **Wirebus** is a lightweight service registry and domain-event dispatcher
//! for Rust.
//!
//! It provides primitives to wire an application's services together
//! (dependency injection with singleton/transient/scoped lifetimes and
//! cycle detection) and to fan domain events out to prioritized subscribers
//! with retry, backoff, and failure-isolation policies. The crate is designed
//! as a building block for application kernels that want explicit wiring
//! instead of global state.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │ Registration │   │ Registration │   │ Registration │
//!     │ (service #1) │   │ (service #2) │   │ (service #3) │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  ServiceRegistry (root)                                           │
//! │  - descriptor map (ServiceId → factory/lifetime/deps)             │
//! │  - singleton cache (one instance per registry lifetime)           │
//! │  - create_scope() → child registries with scoped caches           │
//! └──────────────────────────────┬────────────────────────────────────┘
//!                                │ resolve::<EmployeeService>()
//!                                ▼
//!                    ┌───────────────────────┐
//!                    │   EmployeeService     │
//!                    │ (deps injected,       │
//!                    │  dispatcher included) │
//!                    └───────────┬───────────┘
//!                                │ publish(DomainEvent)
//!                                ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  EventDispatcher                                                  │
//! │  - pattern match (exact + trailing wildcard)                      │
//! │  - can_handle() filter, priority order, sequential delivery       │
//! │  - per-subscription retry/backoff + error policy                  │
//! └──────┬──────────────────┬──────────────────┬──────────────────────┘
//!        ▼                  ▼                  ▼
//!   handler (prio 10)  handler (prio 5)   handler (prio 0)
//!                                              │ exhausted retries
//!                                              ▼
//!                                        DeadLetter event
//! ```
//!
//! ### Resolution lifecycle
//! ```text
//! resolve::<T>() ──► fresh resolution context (path + scoped cache)
//!
//! for each service on the way down:
//!   ├─► revisit on path?        → Err(Cycle { full chain })
//!   ├─► not registered anywhere → Err(NotFound)
//!   ├─► Singleton cached        → shared instance
//!   ├─► Scoped cached           → scope-local instance
//!   └─► run factory             → factory resolves its own deps first
//! ```
//!
//! ## Features
//! | Area              | Description                                                       | Key types / traits                        |
//! |-------------------|-------------------------------------------------------------------|-------------------------------------------|
//! | **Registry**      | Register services with lifetimes; resolve with cycle detection.   | [`ServiceRegistry`], [`Registration`]     |
//! | **Scopes**        | Child registries with scoped instance reuse.                      | [`ServiceRegistry::create_scope`]         |
//! | **Events**        | Immutable event records with a closed body enumeration.           | [`DomainEvent`], [`EventBody`]            |
//! | **Dispatch**      | Priority-ordered, failure-isolated synchronous fan-out.           | [`EventDispatcher`], [`Handle`]           |
//! | **Policies**      | Retry backoff, jitter, terminal-failure handling.                 | [`BackoffPolicy`], [`ErrorPolicy`]        |
//! | **Errors**        | Typed errors for registration, resolution and handling.           | [`RegistryError`], [`HandlerError`]       |
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use serde_json::json;
//! use wirebus::{
//!     DomainEvent, EventDispatcher, Handle, HandlerError, Resolver, ServiceRegistry,
//!     SubscribeOptions,
//! };
//!
//! struct AuditLog;
//!
//! struct EmployeeService {
//!     dispatcher: Arc<EventDispatcher>,
//! }
//!
//! struct AuditTrail;
//!
//! #[async_trait]
//! impl Handle for AuditTrail {
//!     async fn handle(&self, event: &DomainEvent) -> Result<(), HandlerError> {
//!         let _ = event.payload();
//!         Ok(())
//!     }
//!     fn name(&self) -> &'static str { "audit-trail" }
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     // Wire services once at startup; no global container.
//!     let registry = ServiceRegistry::new();
//!     registry.register_singleton(|_: &mut Resolver<'_>| Ok(Arc::new(AuditLog)));
//!     registry.register_singleton(|_: &mut Resolver<'_>| Ok(EventDispatcher::new()));
//!     registry.register_transient(|r: &mut Resolver<'_>| {
//!         Ok(Arc::new(EmployeeService { dispatcher: r.resolve()? }))
//!     });
//!
//!     let service = registry.resolve::<EmployeeService>().unwrap();
//!     service
//!         .dispatcher
//!         .subscribe("Employee.*", Arc::new(AuditTrail), SubscribeOptions::default())
//!         .unwrap();
//!
//!     let event = DomainEvent::new("Employee.SalaryIncreased")
//!         .with_payload(json!({ "employeeId": "e1", "amount": 500 }))
//!         .with_aggregate("e1", "Employee");
//!     service.dispatcher.publish(event).await;
//!
//!     assert_eq!(service.dispatcher.stats().events_processed, 1);
//!     registry.dispose();
//! }
//! ```

mod dispatch;
mod error;
mod events;
mod policies;
mod registry;

// ---- Public re-exports ----

pub use dispatch::{DispatcherConfig, EventDispatcher, Handle, StatsSnapshot, SubscribeOptions};
pub use error::{HandlerError, RegistryError, SubscribeError};
pub use events::{DeadLetter, DomainEvent, EventBody, EventPattern, DEAD_LETTER_TYPE};
pub use policies::{BackoffPolicy, ErrorPolicy, JitterPolicy};
pub use registry::{Lifetime, Registration, Resolver, ServiceId, ServiceRegistry};
