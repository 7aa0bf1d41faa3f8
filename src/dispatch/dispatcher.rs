//! # Event dispatcher: ordered fan-out with retry and failure policies.
//!
//! [`EventDispatcher`] delivers each published [`DomainEvent`] to every
//! matching subscription before returning to the caller.
//!
//! ## Architecture
//! ```text
//! publish(event)
//!     │
//!     ├─ collect: pattern matches (exact + wildcard)
//!     ├─ filter:  handler.can_handle(event)
//!     ├─ sort:    priority desc, ties by subscription order
//!     ▼
//! for each subscription (strictly sequential):
//!     attempt handle(event)
//!         ├─ Ok   ──► success counter
//!         └─ Err  ──► retry with backoff (up to retry_count times)
//!                       └─ exhausted ──► ErrorPolicy
//!                             ├─ Ignore     → log, continue
//!                             ├─ Retry      → log terminal, continue
//!                             └─ DeadLetter → synthesize DeadLetter event,
//!                                             dispatch it after this event
//! ```
//!
//! ## Rules
//! - Handlers for one event run strictly sequentially, never concurrently;
//!   side effects across handlers are ordered by priority.
//! - One subscription's failure never prevents the remaining subscriptions
//!   from running and never propagates out of `publish()`.
//! - Retry delays use a non-blocking timer; the dispatching task yields
//!   between attempts instead of blocking a thread.
//! - A dead-letter event whose own handler fails under the dead-letter
//!   policy is not wrapped again (no dead-letter loops).

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;

use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use tracing::{debug, error, warn};

use crate::dispatch::handler::Handle;
use crate::dispatch::stats::{DispatchStats, StatsSnapshot};
use crate::dispatch::subscription::{SubscribeOptions, Subscription};
use crate::error::{HandlerError, SubscribeError};
use crate::events::{DomainEvent, EventPattern};
use crate::policies::{BackoffPolicy, ErrorPolicy};

/// Configuration for an [`EventDispatcher`].
///
/// ## Field semantics
/// - `backoff`: delay schedule between handler retries, shared by every
///   subscription (the retry *budget* stays per-subscription).
#[derive(Clone, Copy, Debug, Default)]
pub struct DispatcherConfig {
    /// Backoff schedule applied between retry attempts.
    pub backoff: BackoffPolicy,
}

/// Synchronous domain-event dispatcher.
///
/// ## Example
/// ```
/// use std::sync::Arc;
/// use async_trait::async_trait;
/// use wirebus::{DomainEvent, EventDispatcher, Handle, HandlerError, SubscribeOptions};
///
/// struct Audit;
///
/// #[async_trait]
/// impl Handle for Audit {
///     async fn handle(&self, _event: &DomainEvent) -> Result<(), HandlerError> { Ok(()) }
///     fn name(&self) -> &'static str { "audit" }
/// }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let dispatcher = EventDispatcher::new();
/// dispatcher
///     .subscribe("Employee.*", Arc::new(Audit), SubscribeOptions::default())
///     .unwrap();
///
/// dispatcher.publish(DomainEvent::new("Employee.Created")).await;
/// assert_eq!(dispatcher.stats().events_processed, 1);
/// # }
/// ```
pub struct EventDispatcher {
    subscriptions: RwLock<Vec<Subscription>>,
    order: AtomicU64,
    stats: DispatchStats,
    config: DispatcherConfig,
}

impl EventDispatcher {
    /// Creates a dispatcher with the default configuration.
    pub fn new() -> Arc<Self> {
        Self::with_config(DispatcherConfig::default())
    }

    /// Creates a dispatcher with an explicit configuration.
    pub fn with_config(config: DispatcherConfig) -> Arc<Self> {
        Arc::new(Self {
            subscriptions: RwLock::new(Vec::new()),
            order: AtomicU64::new(0),
            stats: DispatchStats::default(),
            config,
        })
    }

    /// Registers a subscription.
    ///
    /// `pattern` is an exact event type (`"Employee.Created"`), a trailing
    /// wildcard (`"Employee.*"`), or `"*"`.
    pub fn subscribe(
        &self,
        pattern: &str,
        handler: Arc<dyn Handle>,
        options: SubscribeOptions,
    ) -> Result<(), SubscribeError> {
        let parsed = EventPattern::parse(pattern)?;
        debug!(pattern = %parsed, handler = handler.name(), "subscription registered");
        let subscription = Subscription {
            pattern: parsed,
            handler,
            priority: options.priority,
            retry_count: options.retry_count,
            error_policy: options.error_policy,
            order: self.order.fetch_add(1, AtomicOrdering::Relaxed),
        };
        self.subscriptions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(subscription);
        Ok(())
    }

    /// Removes the subscription matching `pattern` and `handler` identity.
    ///
    /// No-op when nothing matches (including malformed patterns).
    pub fn unsubscribe(&self, pattern: &str, handler: &Arc<dyn Handle>) {
        let Ok(parsed) = EventPattern::parse(pattern) else {
            return;
        };
        self.subscriptions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|s| !(s.pattern == parsed && Arc::ptr_eq(&s.handler, handler)));
    }

    /// Delivers `event` to every matching, interested subscription, then
    /// returns.
    ///
    /// Dead letters synthesized along the way are dispatched before this
    /// call returns, after the event that produced them.
    pub async fn publish(&self, event: DomainEvent) {
        let mut queue = vec![event];
        while !queue.is_empty() {
            let mut synthesized = Vec::new();
            for ev in queue.drain(..) {
                synthesized.extend(self.dispatch_one(&ev).await);
            }
            queue = synthesized;
        }
    }

    /// Publishes each event in order.
    ///
    /// Events are dispatched one at a time; the next event starts only after
    /// every subscription for the previous one has been attempted.
    pub async fn publish_batch(&self, events: Vec<DomainEvent>) {
        for event in events {
            self.publish(event).await;
        }
    }

    /// Returns a point-in-time view of the dispatch counters.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Number of registered subscriptions.
    pub fn subscription_count(&self) -> usize {
        self.subscriptions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Dispatches one event to its subscriptions; returns synthesized
    /// dead letters.
    async fn dispatch_one(&self, event: &DomainEvent) -> Vec<DomainEvent> {
        let started = Instant::now();

        // Snapshot matching subscriptions and release the lock before any
        // await; handlers may subscribe/unsubscribe reentrantly.
        let mut matched: Vec<Subscription> = {
            let subscriptions = self
                .subscriptions
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            subscriptions
                .iter()
                .filter(|s| s.pattern.matches(event.event_type()))
                .cloned()
                .collect()
        };
        matched.retain(|s| s.handler.can_handle(event));
        matched.sort_by(|a, b| b.priority.cmp(&a.priority).then(a.order.cmp(&b.order)));

        let mut dead_letters = Vec::new();
        for subscription in &matched {
            let Some(terminal) = self.deliver(subscription, event).await else {
                continue;
            };
            match subscription.error_policy {
                ErrorPolicy::Ignore => {
                    debug!(
                        handler = subscription.handler.name(),
                        event_type = event.event_type(),
                        "failure ignored by policy"
                    );
                }
                ErrorPolicy::Retry => {
                    error!(
                        handler = subscription.handler.name(),
                        event_type = event.event_type(),
                        error = %terminal,
                        "retries exhausted; giving up"
                    );
                }
                ErrorPolicy::DeadLetter => {
                    if event.is_dead_letter() {
                        error!(
                            handler = subscription.handler.name(),
                            "dead-letter handler failed; not wrapping again"
                        );
                    } else {
                        self.stats.record_dead_lettered();
                        dead_letters.push(DomainEvent::dead_letter(
                            event.clone(),
                            subscription.handler.name(),
                            terminal.to_string(),
                        ));
                    }
                }
            }
        }

        self.stats.record_published(started.elapsed());
        dead_letters
    }

    /// Runs one subscription against one event, retrying per its budget.
    ///
    /// Returns the terminal error if every attempt failed.
    async fn deliver(
        &self,
        subscription: &Subscription,
        event: &DomainEvent,
    ) -> Option<HandlerError> {
        let attempts = subscription.retry_count.saturating_add(1);
        let mut last = None;
        for attempt in 0..attempts {
            if attempt > 0 {
                tokio::time::sleep(self.config.backoff.next(attempt - 1)).await;
            }
            match invoke(subscription.handler.as_ref(), event).await {
                Ok(()) => {
                    self.stats.record_processed();
                    return None;
                }
                Err(err) => {
                    warn!(
                        handler = subscription.handler.name(),
                        event_type = event.event_type(),
                        attempt,
                        error = %err,
                        "handler attempt failed"
                    );
                    let retryable = err.is_retryable();
                    last = Some(err);
                    if !retryable {
                        break;
                    }
                }
            }
        }
        self.stats.record_failed();
        last
    }
}

/// Invokes a handler with panic isolation.
async fn invoke(handler: &dyn Handle, event: &DomainEvent) -> Result<(), HandlerError> {
    match AssertUnwindSafe(handler.handle(event)).catch_unwind().await {
        Ok(outcome) => outcome,
        Err(panic) => Err(HandlerError::failed(panic_text(panic))),
    }
}

fn panic_text(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "handler panicked".to_string()
    }
}
