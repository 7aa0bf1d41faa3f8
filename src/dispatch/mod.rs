//! Event dispatch: handler trait, subscriptions, dispatcher, stats.
//!
//! This module groups the synchronous fan-out machinery. Events enter via
//! [`EventDispatcher::publish`], get routed through subscription patterns,
//! and run each interested handler in priority order with per-subscription
//! retry and failure policies.
//!
//! ## Contents
//! - [`EventDispatcher`], [`DispatcherConfig`] the dispatcher itself
//! - [`Handle`] the handler capability implemented by subscribers
//! - [`SubscribeOptions`] priority / retries / error policy per subscription
//! - [`StatsSnapshot`] dispatch counters

mod dispatcher;
mod handler;
mod stats;
mod subscription;

pub use dispatcher::{DispatcherConfig, EventDispatcher};
pub use handler::Handle;
pub use stats::StatsSnapshot;
pub use subscription::SubscribeOptions;
