//! # Domain events published through the dispatcher.
//!
//! [`DomainEvent`] is an immutable record built by business logic and handed
//! to [`EventDispatcher::publish`](crate::EventDispatcher::publish). Once
//! handlers finish, the event has no owner; callers may drop it or persist it
//! externally.
//!
//! The [`EventBody`] enum is closed: an event either carries a domain payload
//! or wraps another event as a [`DeadLetter`], so handlers can match the two
//! cases exhaustively.
//!
//! ## Ordering guarantees
//! Each event has a globally unique id (`event_id`) that increases
//! monotonically within the process. Use it to restore publish order when
//! events are persisted out of order.
//!
//! ## Example
//! ```
//! use serde_json::json;
//! use wirebus::DomainEvent;
//!
//! let ev = DomainEvent::new("Employee.SalaryIncreased")
//!     .with_payload(json!({ "employeeId": "e1", "amount": 500 }))
//!     .with_aggregate("e1", "Employee");
//!
//! assert_eq!(ev.event_type(), "Employee.SalaryIncreased");
//! assert_eq!(ev.aggregate_id(), Some("e1"));
//! assert!(!ev.is_dead_letter());
//! ```

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::SystemTime;

use serde::Serialize;

/// Global sequence counter for event ids.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Event type assigned to dead-letter events.
pub const DEAD_LETTER_TYPE: &str = "DeadLetter";

/// Payload of a [`DomainEvent`].
///
/// Closed enumeration: handlers can match on it exhaustively instead of
/// sniffing dynamic payload shapes.
#[derive(Clone, Debug, Serialize)]
pub enum EventBody {
    /// Ordinary domain payload, as structured JSON.
    Domain(serde_json::Value),
    /// A previously published event that exhausted its handler's retries
    /// under the dead-letter policy.
    DeadLetter(DeadLetter),
}

/// Terminal failure record carried by a dead-letter event.
#[derive(Clone, Debug, Serialize)]
pub struct DeadLetter {
    original: Box<DomainEvent>,
    handler: Arc<str>,
    error: Arc<str>,
}

impl DeadLetter {
    /// The event that failed terminal processing.
    pub fn original(&self) -> &DomainEvent {
        &self.original
    }

    /// Name of the handler that exhausted its retries.
    pub fn handler(&self) -> &str {
        &self.handler
    }

    /// Last failure message.
    pub fn error(&self) -> &str {
        &self.error
    }
}

/// Immutable domain event record.
///
/// Construction is builder-style; there are no mutators, so an event never
/// changes after it is built.
#[derive(Clone, Debug, Serialize)]
pub struct DomainEvent {
    /// Globally unique, monotonically increasing id.
    event_id: u64,
    /// Dot-separated event type, e.g. `"Employee.Created"`.
    event_type: Arc<str>,
    /// Wall-clock timestamp taken at construction.
    occurred_at: SystemTime,
    /// Identifier of the aggregate the event belongs to, if any.
    aggregate_id: Option<Arc<str>>,
    /// Kind of that aggregate, e.g. `"Employee"`.
    aggregate_type: Option<Arc<str>>,
    /// Domain payload or dead-letter wrapper.
    body: EventBody,
}

impl DomainEvent {
    /// Creates an event of the given type with a null payload, the current
    /// timestamp, and the next sequence id.
    pub fn new(event_type: impl Into<Arc<str>>) -> Self {
        Self {
            event_id: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            event_type: event_type.into(),
            occurred_at: SystemTime::now(),
            aggregate_id: None,
            aggregate_type: None,
            body: EventBody::Domain(serde_json::Value::Null),
        }
    }

    /// Attaches a structured payload.
    ///
    /// ### Note
    /// No effect on dead-letter events; their body is the wrapped failure.
    #[inline]
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        if matches!(self.body, EventBody::Domain(_)) {
            self.body = EventBody::Domain(payload);
        }
        self
    }

    /// Attaches the owning aggregate's id and kind.
    #[inline]
    pub fn with_aggregate(
        mut self,
        id: impl Into<Arc<str>>,
        kind: impl Into<Arc<str>>,
    ) -> Self {
        self.aggregate_id = Some(id.into());
        self.aggregate_type = Some(kind.into());
        self
    }

    /// Wraps a failed event as a dead letter.
    ///
    /// The new event gets type [`DEAD_LETTER_TYPE`], its own id and
    /// timestamp, and inherits the original's aggregate references so
    /// recovery tooling can still find the affected record.
    pub fn dead_letter(
        original: DomainEvent,
        handler: impl Into<Arc<str>>,
        error: impl Into<Arc<str>>,
    ) -> Self {
        let aggregate_id = original.aggregate_id.clone();
        let aggregate_type = original.aggregate_type.clone();
        Self {
            event_id: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            event_type: Arc::from(DEAD_LETTER_TYPE),
            occurred_at: SystemTime::now(),
            aggregate_id,
            aggregate_type,
            body: EventBody::DeadLetter(DeadLetter {
                original: Box::new(original),
                handler: handler.into(),
                error: error.into(),
            }),
        }
    }

    /// Globally unique event id.
    pub fn event_id(&self) -> u64 {
        self.event_id
    }

    /// Event type string used for subscription matching.
    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    /// Construction timestamp.
    pub fn occurred_at(&self) -> SystemTime {
        self.occurred_at
    }

    /// Owning aggregate id, if attached.
    pub fn aggregate_id(&self) -> Option<&str> {
        self.aggregate_id.as_deref()
    }

    /// Owning aggregate kind, if attached.
    pub fn aggregate_type(&self) -> Option<&str> {
        self.aggregate_type.as_deref()
    }

    /// Event body.
    pub fn body(&self) -> &EventBody {
        &self.body
    }

    /// Domain payload, when this is not a dead letter.
    pub fn payload(&self) -> Option<&serde_json::Value> {
        match &self.body {
            EventBody::Domain(value) => Some(value),
            EventBody::DeadLetter(_) => None,
        }
    }

    /// Dead-letter record, when this event wraps a failure.
    pub fn dead_letter_info(&self) -> Option<&DeadLetter> {
        match &self.body {
            EventBody::Domain(_) => None,
            EventBody::DeadLetter(dl) => Some(dl),
        }
    }

    #[inline]
    pub fn is_dead_letter(&self) -> bool {
        matches!(self.body, EventBody::DeadLetter(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ids_are_monotonic() {
        let a = DomainEvent::new("Employee.Created");
        let b = DomainEvent::new("Employee.Created");
        assert!(b.event_id() > a.event_id());
    }

    #[test]
    fn test_builder_fields() {
        let ev = DomainEvent::new("Employee.Hired")
            .with_payload(json!({ "grade": 7 }))
            .with_aggregate("e42", "Employee");

        assert_eq!(ev.event_type(), "Employee.Hired");
        assert_eq!(ev.aggregate_id(), Some("e42"));
        assert_eq!(ev.aggregate_type(), Some("Employee"));
        assert_eq!(ev.payload(), Some(&json!({ "grade": 7 })));
    }

    #[test]
    fn test_dead_letter_preserves_original() {
        let original = DomainEvent::new("Employee.Terminated").with_aggregate("e7", "Employee");
        let original_id = original.event_id();

        let dl = DomainEvent::dead_letter(original, "payroll-sync", "connection refused");
        assert_eq!(dl.event_type(), DEAD_LETTER_TYPE);
        assert!(dl.is_dead_letter());
        assert_eq!(dl.aggregate_id(), Some("e7"));
        assert!(dl.payload().is_none());

        let info = dl.dead_letter_info().unwrap();
        assert_eq!(info.original().event_id(), original_id);
        assert_eq!(info.handler(), "payroll-sync");
        assert_eq!(info.error(), "connection refused");
    }

    #[test]
    fn test_payload_ignored_on_dead_letter() {
        let dl = DomainEvent::dead_letter(DomainEvent::new("X"), "h", "e")
            .with_payload(json!({ "should": "not apply" }));
        assert!(dl.is_dead_letter());
    }
}
