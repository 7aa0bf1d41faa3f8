//! # Event handler trait.
//!
//! Provides [`Handle`] an extension point for plugging event handlers into
//! the dispatcher.
//!
//! Each handler gets:
//! - **Pattern routing** (subscription patterns pre-select event types)
//! - **Fine-grained filtering** ([`Handle::can_handle`] is consulted even
//!   after the pattern matched)
//! - **Panic isolation** (panics are caught and treated as a failed attempt)
//!
//! ## Rules
//! - Handlers run strictly sequentially within one `publish()` call.
//! - A handler failure never prevents the remaining subscriptions from
//!   running, and never reaches the publishing caller.
//!
//! ## Example
//! ```
//! use async_trait::async_trait;
//! use wirebus::{DomainEvent, Handle, HandlerError};
//!
//! struct PayrollProjection;
//!
//! #[async_trait]
//! impl Handle for PayrollProjection {
//!     async fn handle(&self, event: &DomainEvent) -> Result<(), HandlerError> {
//!         // update a read model, call a downstream, etc.
//!         let _ = event;
//!         Ok(())
//!     }
//!
//!     fn can_handle(&self, event: &DomainEvent) -> bool {
//!         event.aggregate_type() == Some("Employee")
//!     }
//!
//!     fn name(&self) -> &'static str { "payroll-projection" }
//! }
//! ```

use async_trait::async_trait;

use crate::error::HandlerError;
use crate::events::DomainEvent;

/// Event handler invoked by the dispatcher.
///
/// ### Implementation requirements
/// - Use async I/O; avoid blocking the executor.
/// - Return [`HandlerError::Failed`] for failures worth retrying and
///   [`HandlerError::Fatal`] when retrying cannot help.
/// - Keep [`Self::can_handle`] cheap; it runs on every pattern match.
#[async_trait]
pub trait Handle: Send + Sync + 'static {
    /// Processes a single event.
    ///
    /// Called sequentially, in priority order, within the publishing call.
    /// Panics are caught and counted as a failed attempt.
    async fn handle(&self, event: &DomainEvent) -> Result<(), HandlerError>;

    /// Finer-grained filter consulted after the subscription pattern matched.
    ///
    /// Default: accept everything the pattern selected.
    fn can_handle(&self, event: &DomainEvent) -> bool {
        let _ = event;
        true
    }

    /// Returns the handler name used in logs and dead-letter records.
    ///
    /// Prefer short, descriptive names (e.g., "audit", "payroll-sync").
    /// The default uses `type_name::<Self>()`, which can be verbose -
    /// override it when possible.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
