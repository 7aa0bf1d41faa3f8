//! # Subscription patterns for event types.
//!
//! [`EventPattern`] decides which event types a subscription receives:
//! - an exact type (`"Employee.Created"`),
//! - a trailing wildcard covering one namespace (`"Employee.*"`),
//! - or the match-all pattern (`"*"`).
//!
//! A wildcard is only valid as the final segment; patterns like
//! `"*.Created"` or `"Emp*ee"` are rejected at subscribe time.

use std::fmt;
use std::sync::Arc;

use crate::error::SubscribeError;

/// Parsed event-type pattern.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EventPattern {
    /// Matches one event type exactly.
    Exact(Arc<str>),
    /// Matches every event type starting with the stored prefix.
    ///
    /// `"Employee.*"` parses to the prefix `"Employee."`; the match-all
    /// pattern `"*"` parses to the empty prefix.
    Prefix(Arc<str>),
}

impl EventPattern {
    /// Parses a pattern string.
    ///
    /// ## Example
    /// ```
    /// use wirebus::EventPattern;
    ///
    /// let p = EventPattern::parse("Employee.*").unwrap();
    /// assert!(p.matches("Employee.Created"));
    /// assert!(!p.matches("Department.Created"));
    ///
    /// assert!(EventPattern::parse("*.Created").is_err());
    /// ```
    pub fn parse(pattern: &str) -> Result<Self, SubscribeError> {
        let invalid = || SubscribeError::InvalidPattern {
            pattern: pattern.to_string(),
        };

        if pattern.is_empty() {
            return Err(invalid());
        }
        if pattern == "*" {
            return Ok(EventPattern::Prefix(Arc::from("")));
        }
        match pattern.find('*') {
            None => Ok(EventPattern::Exact(Arc::from(pattern))),
            Some(pos) => {
                // Wildcard must be the last character, preceded by a dot.
                if pos + 1 == pattern.len() && pattern[..pos].ends_with('.') && pos > 1 {
                    Ok(EventPattern::Prefix(Arc::from(&pattern[..pos])))
                } else {
                    Err(invalid())
                }
            }
        }
    }

    /// Returns true when this pattern covers `event_type`.
    pub fn matches(&self, event_type: &str) -> bool {
        match self {
            EventPattern::Exact(exact) => &**exact == event_type,
            EventPattern::Prefix(prefix) => event_type.starts_with(&**prefix),
        }
    }
}

impl fmt::Display for EventPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventPattern::Exact(exact) => f.write_str(exact),
            EventPattern::Prefix(prefix) => write!(f, "{prefix}*"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        let p = EventPattern::parse("Employee.Created").unwrap();
        assert!(p.matches("Employee.Created"));
        assert!(!p.matches("Employee.Updated"));
        assert!(!p.matches("Employee"));
    }

    #[test]
    fn test_trailing_wildcard() {
        let p = EventPattern::parse("Employee.*").unwrap();
        assert!(p.matches("Employee.Created"));
        assert!(p.matches("Employee.Salary.Increased"));
        assert!(!p.matches("Department.Created"));
        assert!(!p.matches("EmployeeX.Created"));
    }

    #[test]
    fn test_match_all() {
        let p = EventPattern::parse("*").unwrap();
        assert!(p.matches("Employee.Created"));
        assert!(p.matches("anything"));
    }

    #[test]
    fn test_invalid_patterns() {
        for bad in ["", "*.Created", "Emp*ee", "Employee*", "Employee.*.Raise"] {
            assert!(
                EventPattern::parse(bad).is_err(),
                "pattern {bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_display_round_trip() {
        assert_eq!(
            EventPattern::parse("Employee.*").unwrap().to_string(),
            "Employee.*"
        );
        assert_eq!(
            EventPattern::parse("Employee.Created").unwrap().to_string(),
            "Employee.Created"
        );
    }
}
