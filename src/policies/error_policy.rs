//! # Failure policies for event subscriptions.
//!
//! [`ErrorPolicy`] determines what happens after a handler exhausts its retry
//! budget for one event.
//!
//! - [`ErrorPolicy::Ignore`] the failure is logged and dispatch moves on (default).
//! - [`ErrorPolicy::Retry`] retries were the remedy; once exhausted, the failure is logged as terminal.
//! - [`ErrorPolicy::DeadLetter`] the event is wrapped as a dead letter and re-published for recovery tooling.
//!
//! ## Choosing the right policy
//!
//! **Best-effort side effects** (cache warmers, notifications):
//! ```text
//! ErrorPolicy::Ignore           → failure is invisible to the publisher
//! ```
//!
//! **Flaky downstreams** (network calls worth retrying):
//! ```text
//! ErrorPolicy::Retry            → pair with a retry budget on the subscription
//! ```
//!
//! **Must-not-lose events** (audit trails, projections):
//! ```text
//! ErrorPolicy::DeadLetter       → failed event resurfaces as a DeadLetter event
//! ```
//!
//! Whatever the policy, one subscription's failure never prevents the
//! remaining subscriptions from seeing the event.

/// Policy applied when a subscription's handler fails terminally.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Log the failure and continue with the next subscription (default).
    #[default]
    Ignore,
    /// Retries are the remedy; after they are exhausted, log as terminal.
    Retry,
    /// Wrap the failed event as a dead letter and publish it.
    DeadLetter,
}
