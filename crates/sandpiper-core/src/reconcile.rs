//! The reconciliation state machine.
//!
//! One invocation walks Start, Validated, RequestSent, then either
//! Unchanged or Accepted, optionally Polling, and ends in a terminal
//! [`Outcome`]. Every branch terminates in an outcome or an error; there
//! is no response the reconciler leaves unresolved.

use crate::config::ClientConfig;
use crate::desired::{DesiredState, Presence, ResourceRef};
use crate::error::{ClientError, Result};
use crate::outcome::Outcome;
use crate::poller::{OperationPhase, OperationPoller, OperationRecord};
use crate::request::{build_request, Action, AttemptContext};
use crate::transport::Transport;
use crate::validate::validate;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

/// Drives one sandbox toward its declared desired state.
///
/// Holds no per-sandbox state of its own; every reconcile call constructs
/// its working set fresh, so one reconciler can serve many sandboxes from
/// concurrent tasks without locking.
pub struct Reconciler {
    transport: Arc<dyn Transport>,
    config: ClientConfig,
}

impl Reconciler {
    /// Create a reconciler over the given transport.
    pub fn new(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        Self { transport, config }
    }

    /// Reconcile one sandbox and return the terminal outcome.
    ///
    /// Validation runs before anything touches the network. A repeated
    /// call with identical desired state against an unchanged remote
    /// reports `changed: false`.
    pub async fn reconcile(
        &self,
        presence: Presence,
        desired: &DesiredState,
        resource: &ResourceRef,
    ) -> Result<Outcome> {
        let start = std::time::Instant::now();
        let attempt = AttemptContext::new();
        tracing::info!(
            sandbox = %desired.name,
            %presence,
            attempt = %attempt.idempotency_id(),
            "Starting reconciliation"
        );

        validate(desired)?;

        let outcome = match presence {
            Presence::Present => self.converge_present(desired, resource, &attempt).await?,
            Presence::Absent => self.converge_absent(desired, resource, &attempt).await?,
        };

        tracing::info!(
            sandbox = %desired.name,
            status = %outcome.status,
            changed = outcome.changed,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Reconciliation finished"
        );
        Ok(outcome)
    }

    async fn converge_present(
        &self,
        desired: &DesiredState,
        resource: &ResourceRef,
        attempt: &AttemptContext,
    ) -> Result<Outcome> {
        let action = if resource.sandbox_id().is_some() {
            Action::Update
        } else {
            Action::Create
        };
        let request = build_request(action, desired, resource, attempt)?;
        let response = self.transport.send(&request).await?.error_for_status()?;

        match response.status {
            200 => {
                tracing::debug!(sandbox = %desired.name, "Configuration already up-to-date");
                Ok(Outcome::unchanged(response.body))
            }
            202 => {
                let Some(operation_ref) = operation_ref_in(&response.body) else {
                    tracing::warn!(sandbox = %desired.name, "Accepted response did not name an operation");
                    return Ok(Outcome::failed(
                        true,
                        json!({
                            "msg": "accepted response did not carry a sandbox_id",
                            "response": response.body,
                        }),
                        None,
                    ));
                };
                self.settle_present(operation_ref).await
            }
            status => Ok(unexpected_status(status, &request.path)),
        }
    }

    async fn converge_absent(
        &self,
        desired: &DesiredState,
        resource: &ResourceRef,
        attempt: &AttemptContext,
    ) -> Result<Outcome> {
        let request = build_request(Action::Delete, desired, resource, attempt)?;
        let response = self.transport.send(&request).await?.error_for_status()?;

        match response.status {
            200 => {
                tracing::debug!(sandbox = %desired.name, "Already deleted");
                Ok(Outcome::already_deleted(response.body))
            }
            202 => match operation_ref_in(&response.body) {
                // Deletes only wait when the body names an operation to watch
                Some(operation_ref) if self.config.wait_for_completion => {
                    match self.poller().wait_until_terminal(&operation_ref).await {
                        Ok(record) => Ok(settled_outcome(operation_ref, record, true)),
                        Err(ClientError::PollTimeout {
                            operation_id,
                            waited,
                        }) => Ok(timeout_outcome(operation_id, waited)),
                        Err(e) => Err(e),
                    }
                }
                operation_ref => Ok(Outcome::deleted(response.body, operation_ref)),
            },
            status => Ok(unexpected_status(status, &request.path)),
        }
    }

    /// Resolve an accepted create or update to its terminal outcome.
    async fn settle_present(&self, operation_ref: String) -> Result<Outcome> {
        let poller = self.poller();
        if !self.config.wait_for_completion {
            // Single observation, reported with whatever phase it is in
            let record = poller.fetch(&operation_ref).await?;
            return Ok(Outcome::accepted(operation_ref, record.raw));
        }
        match poller.wait_until_terminal(&operation_ref).await {
            Ok(record) => Ok(settled_outcome(operation_ref, record, false)),
            Err(ClientError::PollTimeout {
                operation_id,
                waited,
            }) => Ok(timeout_outcome(operation_id, waited)),
            Err(e) => Err(e),
        }
    }

    fn poller(&self) -> OperationPoller<'_> {
        OperationPoller::new(
            self.transport.as_ref(),
            self.config.poll_interval,
            self.config.wait_timeout,
        )
    }
}

/// Accepted bodies reference their operation through the sandbox id.
fn operation_ref_in(body: &serde_json::Value) -> Option<String> {
    body.get("sandbox_id")
        .and_then(|v| v.as_str())
        .map(str::to_string)
}

fn settled_outcome(operation_ref: String, record: OperationRecord, delete: bool) -> Outcome {
    let succeeded = record.phase == OperationPhase::Succeeded;
    let detail = record.result.unwrap_or(record.raw);
    match (succeeded, delete) {
        (true, true) => Outcome::deleted(detail, Some(operation_ref)),
        (true, false) => Outcome::completed(operation_ref, detail),
        (false, _) => Outcome::failed(true, detail, Some(operation_ref)),
    }
}

fn timeout_outcome(operation_id: String, waited: Duration) -> Outcome {
    let detail = json!({
        "msg": format!(
            "operation {operation_id} did not reach a terminal phase within {waited:?}"
        ),
        "operation_id": operation_id.clone(),
    });
    Outcome::failed(true, detail, Some(operation_id))
}

fn unexpected_status(status: u16, path: &str) -> Outcome {
    tracing::warn!(status, path, "Unhandled response status");
    Outcome::failed(
        false,
        json!({"msg": format!("unhandled response status {status} from {path}")}),
        None,
    )
}
