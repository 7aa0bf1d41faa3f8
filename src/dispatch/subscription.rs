//! Subscription records and options.
//!
//! [`SubscribeOptions`] is the caller-facing bundle passed to
//! [`subscribe`](crate::EventDispatcher::subscribe); the dispatcher turns it
//! into an internal [`Subscription`] with a parsed pattern and an insertion
//! sequence used to break priority ties deterministically.

use std::sync::Arc;

use crate::dispatch::handler::Handle;
use crate::events::EventPattern;
use crate::policies::ErrorPolicy;

/// Options for one subscription.
///
/// ## Defaults
/// - `priority = 0` (higher runs first)
/// - `retry_count = 0` (one attempt, no retries)
/// - `error_policy = ErrorPolicy::Ignore`
#[derive(Clone, Copy, Debug, Default)]
pub struct SubscribeOptions {
    /// Dispatch order: higher priorities run first; ties run in
    /// subscription order.
    pub priority: i32,
    /// Number of retries after a failed attempt (total attempts =
    /// `retry_count + 1`).
    pub retry_count: u32,
    /// What to do once retries are exhausted.
    pub error_policy: ErrorPolicy,
}

impl SubscribeOptions {
    /// Returns options with the given priority.
    #[inline]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Returns options with the given retry budget.
    #[inline]
    pub fn with_retries(mut self, retry_count: u32) -> Self {
        self.retry_count = retry_count;
        self
    }

    /// Returns options with the given terminal-failure policy.
    #[inline]
    pub fn with_error_policy(mut self, error_policy: ErrorPolicy) -> Self {
        self.error_policy = error_policy;
        self
    }
}

/// One registered subscription.
#[derive(Clone)]
pub(crate) struct Subscription {
    pub(crate) pattern: EventPattern,
    pub(crate) handler: Arc<dyn Handle>,
    pub(crate) priority: i32,
    pub(crate) retry_count: u32,
    pub(crate) error_policy: ErrorPolicy,
    /// Insertion sequence; breaks priority ties first-subscribed-first.
    pub(crate) order: u64,
}
