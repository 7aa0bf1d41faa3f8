//! Error types used by the registry and the event dispatcher.
//!
//! This module defines three error enums:
//!
//! - [`RegistryError`] — failures raised while registering or resolving services.
//! - [`SubscribeError`] — failures raised while registering an event subscription.
//! - [`HandlerError`] — failures returned by event handlers; consumed inside
//!   `publish()` and never propagated to the publishing caller.
//!
//! All types provide `as_label()` returning a short stable snake_case label
//! for logs/metrics.

use thiserror::Error;

use crate::registry::ServiceId;

/// # Errors produced by the service registry.
///
/// Resolution errors are always surfaced to the caller of
/// [`resolve`](crate::ServiceRegistry::resolve);
/// [`try_resolve`](crate::ServiceRegistry::try_resolve) converts them into an
/// empty result instead.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RegistryError {
    /// The requested service has no registration in this registry or any
    /// parent in the scope chain.
    #[error("service not found: {service}")]
    NotFound {
        /// Identity of the missing service.
        service: ServiceId,
    },

    /// Resolving the requested service would revisit a service already being
    /// built on the current resolution path.
    ///
    /// The chain holds the full offending path; the revisited service appears
    /// at both ends.
    #[error("circular dependency detected: {}", format_chain(.chain))]
    Cycle {
        /// Resolution path, entry service duplicated at the end.
        chain: Vec<ServiceId>,
    },

    /// A stored instance did not have the type its key promised.
    ///
    /// Registrations pair the key and the factory's concrete type, so this is
    /// unreachable through the public API; it exists so resolution never has
    /// to panic on a downcast.
    #[error("stored instance has unexpected type for {service}")]
    TypeMismatch {
        /// Identity of the mistyped service.
        service: ServiceId,
    },
}

impl RegistryError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use wirebus::{RegistryError, ServiceId};
    ///
    /// struct Repo;
    /// let err = RegistryError::NotFound { service: ServiceId::of::<Repo>() };
    /// assert_eq!(err.as_label(), "service_not_found");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RegistryError::NotFound { .. } => "service_not_found",
            RegistryError::Cycle { .. } => "circular_dependency",
            RegistryError::TypeMismatch { .. } => "service_type_mismatch",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RegistryError::NotFound { service } => format!("not registered: {service}"),
            RegistryError::Cycle { chain } => format!("cycle: {}", format_chain(chain)),
            RegistryError::TypeMismatch { service } => format!("type mismatch: {service}"),
        }
    }
}

fn format_chain(chain: &[ServiceId]) -> String {
    chain
        .iter()
        .map(ServiceId::short_name)
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// # Errors produced while registering an event subscription.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum SubscribeError {
    /// The event-type pattern is malformed.
    ///
    /// Valid patterns are an exact event type (`"Employee.Created"`), a
    /// trailing wildcard (`"Employee.*"`), or the match-all pattern (`"*"`).
    #[error("invalid event pattern: {pattern:?}")]
    InvalidPattern {
        /// The rejected pattern string.
        pattern: String,
    },
}

impl SubscribeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            SubscribeError::InvalidPattern { .. } => "invalid_pattern",
        }
    }
}

/// # Failures returned by event handlers.
///
/// A handler failure never propagates out of
/// [`publish`](crate::EventDispatcher::publish): the dispatcher retries
/// retryable failures per the subscription's retry budget, then applies the
/// subscription's [`ErrorPolicy`](crate::ErrorPolicy).
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum HandlerError {
    /// The handler failed but may succeed if retried.
    #[error("handler failed: {error}")]
    Failed {
        /// The underlying error message.
        error: String,
    },

    /// Non-recoverable failure; remaining retries are skipped.
    #[error("handler failed fatally (no retry): {error}")]
    Fatal {
        /// The underlying error message.
        error: String,
    },
}

impl HandlerError {
    /// Shorthand for a retryable failure.
    pub fn failed(error: impl Into<String>) -> Self {
        HandlerError::Failed {
            error: error.into(),
        }
    }

    /// Shorthand for a non-retryable failure.
    pub fn fatal(error: impl Into<String>) -> Self {
        HandlerError::Fatal {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            HandlerError::Failed { .. } => "handler_failed",
            HandlerError::Fatal { .. } => "handler_fatal",
        }
    }

    /// Indicates whether the failure is safe to retry.
    ///
    /// # Example
    /// ```
    /// use wirebus::HandlerError;
    ///
    /// assert!(HandlerError::failed("boom").is_retryable());
    /// assert!(!HandlerError::fatal("nope").is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        matches!(self, HandlerError::Failed { .. })
    }
}
