//! Host-boundary parameter document.
//!
//! The host runtime hands over one JSON document per run. Parameters are
//! converted into the typed configuration and desired state exactly once,
//! at this boundary, and never mutated mid-flow.

use sandpiper_core::{ClientConfig, ConfigError, DesiredState, Presence, ResourceRef};
use serde::Deserialize;
use std::time::Duration;

fn default_wait() -> bool {
    true
}

fn default_wait_timeout_secs() -> u64 {
    300
}

/// Parameters handed over by the host runtime.
#[derive(Debug, Deserialize)]
pub struct HostParams {
    /// Control plane base URL. Falls back to `SANDPIPER_API_ENDPOINT`.
    #[serde(default)]
    pub api_endpoint: Option<String>,
    /// Bearer token. Falls back to `SANDPIPER_API_TOKEN`. Never logged.
    #[serde(default)]
    pub api_token: Option<String>,
    pub name: String,
    pub owner_email: String,
    pub size: String,
    pub ttl_days: i64,
    pub allowed_cidrs: Vec<String>,
    #[serde(default)]
    pub resource_version: Option<String>,
    /// Whether the sandbox should exist.
    pub state: Presence,
    #[serde(default)]
    pub sandbox_id: Option<String>,
    /// Wait for accepted operations to finish (default: true).
    #[serde(default = "default_wait")]
    pub wait: bool,
    /// Total wait budget in seconds (default: 300).
    #[serde(default = "default_wait_timeout_secs")]
    pub wait_timeout: u64,
}

impl HostParams {
    /// Resolve the client configuration, preferring explicit parameters
    /// over environment fallbacks.
    pub fn client_config(&self) -> Result<ClientConfig, ConfigError> {
        let env = ClientConfig::from_env();
        ClientConfig::builder()
            .endpoint(self.api_endpoint.clone().unwrap_or(env.endpoint))
            .token(self.api_token.clone().unwrap_or(env.token))
            .wait_for_completion(self.wait)
            .wait_timeout(Duration::from_secs(self.wait_timeout))
            .build()
    }

    /// The declared desired state.
    pub fn desired_state(&self) -> DesiredState {
        DesiredState {
            name: self.name.clone(),
            owner_email: self.owner_email.clone(),
            size: self.size.clone(),
            ttl_days: self.ttl_days,
            allowed_cidrs: self.allowed_cidrs.clone(),
        }
    }

    /// The client's belief about the remote resource.
    pub fn resource_ref(&self) -> ResourceRef {
        ResourceRef::new(self.sandbox_id.clone(), self.resource_version.clone())
    }
}
