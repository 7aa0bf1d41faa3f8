//! # Typed service identity.
//!
//! [`ServiceId`] names a registrable capability by its Rust type. Resolution
//! is keyed by [`TypeId`], so a lookup can never hand back an instance of the
//! wrong type; the captured type name exists purely for diagnostics
//! (error chains, logs).

use std::any::{type_name, TypeId};
use std::fmt;

/// Identity of a registrable service.
///
/// Obtained with [`ServiceId::of`]; compares and hashes by [`TypeId`], so two
/// ids are equal exactly when they name the same Rust type.
///
/// ## Example
/// ```
/// use wirebus::ServiceId;
///
/// struct PayrollRepository;
///
/// let id = ServiceId::of::<PayrollRepository>();
/// assert_eq!(id, ServiceId::of::<PayrollRepository>());
/// assert_eq!(id.short_name(), "PayrollRepository");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ServiceId {
    type_id: TypeId,
    name: &'static str,
}

impl ServiceId {
    /// Returns the identity of service type `T`.
    pub fn of<T: 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    /// Returns the full type name, including module path.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the type name without its module path.
    ///
    /// Used in error chains and log lines where the full path is noise.
    pub fn short_name(&self) -> &'static str {
        self.name.rsplit("::").next().unwrap_or(self.name)
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}
