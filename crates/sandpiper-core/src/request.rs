//! Outbound request construction for the sandbox control plane.

use crate::desired::{DesiredState, ResourceRef};
use crate::error::{ClientError, Result};
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

/// Context for one logical reconciliation attempt.
///
/// The idempotency id is minted once per attempt and threaded by value
/// through every request of that attempt, so the control plane can
/// recognize retried requests instead of provisioning twin resources.
#[derive(Debug, Clone)]
pub struct AttemptContext {
    idempotency_id: Uuid,
}

impl AttemptContext {
    /// Mint a fresh attempt context.
    pub fn new() -> Self {
        Self {
            idempotency_id: Uuid::new_v4(),
        }
    }

    /// The idempotency id shared by all requests of this attempt.
    pub fn idempotency_id(&self) -> Uuid {
        self.idempotency_id
    }
}

impl Default for AttemptContext {
    fn default() -> Self {
        Self::new()
    }
}

/// The mutating action the reconciler has decided to request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Provision a new sandbox.
    Create,
    /// Converge an existing sandbox toward the desired state.
    Update,
    /// Remove an existing sandbox.
    Delete,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Create => write!(f, "create"),
            Action::Update => write!(f, "update"),
            Action::Delete => write!(f, "delete"),
        }
    }
}

/// HTTP method for a control-plane call.
///
/// A closed set: anything outside it cannot be expressed, so a bad method
/// is a compile error rather than a runtime condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Patch,
    Delete,
}

impl Method {
    /// Wire name of the method.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

/// Request body sent to the control plane.
///
/// Carries the full desired-state fields plus the attempt's idempotency id
/// for every mutating action. Delete bodies are semantically redundant but
/// the control plane expects the uniform shape, so it is kept.
#[derive(Debug, Clone, Serialize)]
pub struct RequestEnvelope {
    pub name: String,
    pub owner_email: String,
    pub size: String,
    pub ttl_days: i64,
    pub allowed_cidrs: Vec<String>,
    /// Idempotency id of the attempt.
    pub id: Uuid,
}

impl RequestEnvelope {
    fn new(desired: &DesiredState, attempt: &AttemptContext) -> Self {
        Self {
            name: desired.name.clone(),
            owner_email: desired.owner_email.clone(),
            size: desired.size.clone(),
            ttl_days: desired.ttl_days,
            allowed_cidrs: desired.allowed_cidrs.clone(),
            id: attempt.idempotency_id(),
        }
    }
}

/// A fully assembled control-plane request, ready for the transport.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    /// HTTP method to dispatch.
    pub method: Method,
    /// Path relative to the configured endpoint, always starting with `/`.
    pub path: String,
    /// JSON body, if the call carries one.
    pub body: Option<RequestEnvelope>,
    /// Value for the `If-Match` header; empty when no version is known.
    pub if_match: String,
}

/// Assemble the request for a mutating action.
///
/// Update and delete address an existing resource and fail with
/// [`ClientError::MissingResourceId`] when no sandbox id is known, rather
/// than constructing a malformed collection path.
pub fn build_request(
    action: Action,
    desired: &DesiredState,
    resource: &ResourceRef,
    attempt: &AttemptContext,
) -> Result<ApiRequest> {
    let (method, path) = match action {
        Action::Create => (Method::Post, "/v1/sandboxes".to_string()),
        Action::Update => (
            Method::Patch,
            format!("/v1/sandboxes/{}", require_id(resource, "update")?),
        ),
        Action::Delete => (
            Method::Delete,
            format!("/v1/sandboxes/{}", require_id(resource, "delete")?),
        ),
    };
    tracing::trace!(%action, %path, "Request assembled");
    Ok(ApiRequest {
        method,
        path,
        body: Some(RequestEnvelope::new(desired, attempt)),
        if_match: resource.resource_version().unwrap_or_default().to_string(),
    })
}

/// Assemble the read for a long-running operation resource.
pub fn operation_request(operation_ref: &str) -> ApiRequest {
    ApiRequest {
        method: Method::Get,
        path: format!("/v1/operations/{operation_ref}"),
        body: None,
        if_match: String::new(),
    }
}

fn require_id<'a>(resource: &'a ResourceRef, action: &'static str) -> Result<&'a str> {
    resource
        .sandbox_id()
        .ok_or(ClientError::MissingResourceId { action })
}
