//! Service registry: typed tokens, lifetimes, resolution.
//!
//! This module groups the dependency container. Services are registered under
//! their Rust type ([`ServiceId`]) with a [`Lifetime`] and a factory; the
//! container resolves them recursively, detecting cycles and honoring
//! singleton/transient/scoped reuse.
//!
//! ## Contents
//! - [`ServiceRegistry`] the container: register / resolve / scopes / dispose
//! - [`Resolver`] dependency handle passed to factories
//! - [`Registration`] per-service bundle (lifetime, factory, deps, cleanup)
//! - [`ServiceId`], [`Lifetime`] identity and reuse policy

mod container;
mod descriptor;
mod registration;
mod token;

pub use container::{Resolver, ServiceRegistry};
pub use descriptor::Lifetime;
pub use registration::Registration;
pub use token::ServiceId;
