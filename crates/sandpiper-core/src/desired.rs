//! Desired-state and resource identity types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Declared desired state for a single sandbox.
///
/// Immutable once submitted for a reconciliation call. Validation of the
/// field grammars happens in [`crate::validate::validate`] before any
/// network call is made.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DesiredState {
    /// Sandbox name.
    pub name: String,
    /// Email address of the owner.
    pub owner_email: String,
    /// Instance size. Opaque to the client; the control plane interprets it.
    pub size: String,
    /// Time-to-live in days, between 1 and 30.
    pub ttl_days: i64,
    /// CIDR ranges allowed to reach the sandbox, in declaration order.
    pub allowed_cidrs: Vec<String>,
}

/// Whether the sandbox should exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Presence {
    /// The sandbox should exist and match the desired state.
    Present,
    /// The sandbox should not exist.
    Absent,
}

impl fmt::Display for Presence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Presence::Present => write!(f, "present"),
            Presence::Absent => write!(f, "absent"),
        }
    }
}

/// The client's belief about an existing remote resource.
///
/// An absent sandbox id means the resource does not yet exist from the
/// client's perspective. The resource version is the opaque optimistic
/// concurrency token echoed back to the control plane via `If-Match`.
#[derive(Debug, Clone, Default)]
pub struct ResourceRef {
    sandbox_id: Option<String>,
    resource_version: Option<String>,
}

impl ResourceRef {
    /// Build a resource reference from host-supplied fields.
    ///
    /// Empty strings mean "not set"; host runtimes routinely pass them in
    /// place of a missing value.
    pub fn new(sandbox_id: Option<String>, resource_version: Option<String>) -> Self {
        Self {
            sandbox_id: sandbox_id.filter(|s| !s.is_empty()),
            resource_version: resource_version.filter(|s| !s.is_empty()),
        }
    }

    /// The known sandbox id, if any.
    pub fn sandbox_id(&self) -> Option<&str> {
        self.sandbox_id.as_deref()
    }

    /// The optimistic concurrency token, if any.
    pub fn resource_version(&self) -> Option<&str> {
        self.resource_version.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_strings_mean_absent() {
        let r = ResourceRef::new(Some(String::new()), Some(String::new()));
        assert!(r.sandbox_id().is_none());
        assert!(r.resource_version().is_none());
    }

    #[test]
    fn test_resource_ref_roundtrip() {
        let r = ResourceRef::new(Some("sbx-1".into()), Some("v42".into()));
        assert_eq!(r.sandbox_id(), Some("sbx-1"));
        assert_eq!(r.resource_version(), Some("v42"));
    }

    #[test]
    fn test_presence_display() {
        assert_eq!(Presence::Present.to_string(), "present");
        assert_eq!(Presence::Absent.to_string(), "absent");
    }

    #[test]
    fn test_presence_deserializes_lowercase() {
        let p: Presence = serde_json::from_str("\"absent\"").unwrap();
        assert_eq!(p, Presence::Absent);
    }
}
