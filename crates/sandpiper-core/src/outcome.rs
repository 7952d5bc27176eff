//! Reconciliation outcomes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Terminal classification of one reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutcomeStatus {
    /// The remote state already matched the desired state.
    Unchanged,
    /// A change was accepted and its operation observed once, still in flight.
    Accepted,
    /// A change was accepted and its operation finished successfully.
    Completed,
    /// The sandbox was deleted.
    Deleted,
    /// There was nothing to delete.
    AlreadyDeleted,
    /// The reconciliation could not converge.
    Failed,
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutcomeStatus::Unchanged => write!(f, "unchanged"),
            OutcomeStatus::Accepted => write!(f, "accepted"),
            OutcomeStatus::Completed => write!(f, "completed"),
            OutcomeStatus::Deleted => write!(f, "deleted"),
            OutcomeStatus::AlreadyDeleted => write!(f, "already-deleted"),
            OutcomeStatus::Failed => write!(f, "failed"),
        }
    }
}

/// The terminal artifact of a reconciliation invocation.
///
/// Produced exactly once per call; every reconciler path ends in one of
/// these (or an error surfaced to the caller), never in an undefined branch.
#[derive(Debug, Clone, Serialize)]
pub struct Outcome {
    /// Whether the control plane accepted a mutation during this call.
    pub changed: bool,
    /// Terminal classification.
    pub status: OutcomeStatus,
    /// Structured payload from the control plane, verbatim.
    pub detail: serde_json::Value,
    /// Long-running operation reference, when one was issued.
    pub operation_ref: Option<String>,
}

impl Outcome {
    /// Remote state already matched; nothing was sent beyond the probe.
    pub fn unchanged(detail: serde_json::Value) -> Self {
        Self {
            changed: false,
            status: OutcomeStatus::Unchanged,
            detail,
            operation_ref: None,
        }
    }

    /// Change accepted; the operation was observed once and left in flight.
    pub fn accepted(operation_ref: String, detail: serde_json::Value) -> Self {
        Self {
            changed: true,
            status: OutcomeStatus::Accepted,
            detail,
            operation_ref: Some(operation_ref),
        }
    }

    /// Change accepted and the operation reached a successful terminal phase.
    pub fn completed(operation_ref: String, detail: serde_json::Value) -> Self {
        Self {
            changed: true,
            status: OutcomeStatus::Completed,
            detail,
            operation_ref: Some(operation_ref),
        }
    }

    /// Deletion accepted by the control plane.
    pub fn deleted(detail: serde_json::Value, operation_ref: Option<String>) -> Self {
        Self {
            changed: true,
            status: OutcomeStatus::Deleted,
            detail,
            operation_ref,
        }
    }

    /// Nothing to delete; the resource was already gone.
    pub fn already_deleted(detail: serde_json::Value) -> Self {
        Self {
            changed: false,
            status: OutcomeStatus::AlreadyDeleted,
            detail,
            operation_ref: None,
        }
    }

    /// The reconciliation did not converge.
    ///
    /// `changed` stays true when the control plane had already accepted a
    /// mutation; it may have partially applied.
    pub fn failed(
        changed: bool,
        detail: serde_json::Value,
        operation_ref: Option<String>,
    ) -> Self {
        Self {
            changed,
            status: OutcomeStatus::Failed,
            detail,
            operation_ref,
        }
    }

    /// Whether this outcome reports a failure.
    pub fn is_failure(&self) -> bool {
        self.status == OutcomeStatus::Failed
    }

    /// Human-readable summary line for the host boundary.
    pub fn summary(&self) -> String {
        match (&self.status, &self.operation_ref) {
            (OutcomeStatus::Unchanged, _) => {
                "Sandbox configuration already up-to-date".to_string()
            }
            (OutcomeStatus::Accepted, Some(op)) => format!("sandbox operation {op} accepted"),
            (OutcomeStatus::Accepted, None) => "sandbox operation accepted".to_string(),
            (OutcomeStatus::Completed, Some(op)) => format!("sandbox operation {op} completed"),
            (OutcomeStatus::Completed, None) => "sandbox operation completed".to_string(),
            (OutcomeStatus::Deleted, _) => "sandbox deleted".to_string(),
            (OutcomeStatus::AlreadyDeleted, _) => "Sandbox already deleted".to_string(),
            (OutcomeStatus::Failed, _) => self
                .detail
                .get("msg")
                .and_then(|m| m.as_str())
                .unwrap_or("sandbox reconciliation failed")
                .to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_wire_names() {
        assert_eq!(
            serde_json::to_value(OutcomeStatus::AlreadyDeleted).unwrap(),
            json!("already-deleted")
        );
        assert_eq!(
            serde_json::to_value(OutcomeStatus::Unchanged).unwrap(),
            json!("unchanged")
        );
    }

    #[test]
    fn test_unchanged_is_not_a_change() {
        let outcome = Outcome::unchanged(json!({"size": "small"}));
        assert!(!outcome.changed);
        assert!(!outcome.is_failure());
        assert_eq!(outcome.summary(), "Sandbox configuration already up-to-date");
    }

    #[test]
    fn test_failed_summary_prefers_detail_msg() {
        let outcome = Outcome::failed(true, json!({"msg": "operation op-1 timed out"}), None);
        assert!(outcome.is_failure());
        assert_eq!(outcome.summary(), "operation op-1 timed out");
    }

    #[test]
    fn test_failed_summary_fallback() {
        let outcome = Outcome::failed(false, json!({"status": 204}), None);
        assert_eq!(outcome.summary(), "sandbox reconciliation failed");
    }

    #[test]
    fn test_deleted_statuses() {
        assert!(Outcome::deleted(json!(null), None).changed);
        assert!(!Outcome::already_deleted(json!(null)).changed);
        assert_eq!(
            Outcome::already_deleted(json!(null)).summary(),
            "Sandbox already deleted"
        );
    }
}
