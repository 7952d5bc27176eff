//! # sandpiper-core
//!
//! Reconciliation engine for remote development sandboxes.
//!
//! Given a declared desired state and the client's belief about the remote
//! resource, this crate computes and executes the minimal control-plane
//! action (create, update, delete, or nothing), follows accepted changes
//! through their long-running operations, and reports whether anything
//! changed.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                    Reconciler                       │
//! │   validate ─▶ build_request ─▶ Transport::send      │
//! │                                     │               │
//! │                 ┌───────────────────┤               │
//! │                 ▼                   ▼               │
//! │            200: unchanged      202: accepted        │
//! │                                     │               │
//! │                              OperationPoller        │
//! │                        GET /v1/operations/{id}      │
//! │                         until terminal phase        │
//! └─────────────────────────────────────────────────────┘
//!                           │
//!                           ▼
//!                    Outcome { changed, status, detail }
//! ```
//!
//! ## Quick Start
//!
//! ```ignore
//! use sandpiper_core::{
//!     ClientConfig, DesiredState, HttpTransport, Presence, Reconciler, ResourceRef,
//! };
//! use std::sync::Arc;
//!
//! # async fn example() -> sandpiper_core::Result<()> {
//! let config = ClientConfig::builder()
//!     .endpoint("https://sandboxes.internal:8443")
//!     .token(std::env::var("SANDPIPER_API_TOKEN").unwrap())
//!     .build()
//!     .unwrap();
//!
//! let desired = DesiredState {
//!     name: "dev-1".into(),
//!     owner_email: "dev@example.com".into(),
//!     size: "small".into(),
//!     ttl_days: 7,
//!     allowed_cidrs: vec!["10.0.0.0/8".into()],
//! };
//!
//! let transport = Arc::new(HttpTransport::new(&config));
//! let reconciler = Reconciler::new(config, transport);
//! let outcome = reconciler
//!     .reconcile(Presence::Present, &desired, &ResourceRef::default())
//!     .await?;
//! println!("changed: {}", outcome.changed);
//! # Ok(())
//! # }
//! ```
//!
//! ## Guarantees
//!
//! - **Validated before sent**: bad parameters never reach the network.
//! - **Idempotent**: a repeated call against an unchanged remote reports
//!   `changed: false`; one idempotency id covers all requests of a call.
//! - **Exhaustive**: every response resolves to an [`Outcome`] or an error;
//!   unknown statuses become failed outcomes instead of silent gaps.
//! - **Bounded**: request timeouts and the polling deadline cap how long a
//!   call can take, and the poller's wait never blocks other tasks.

mod config;
mod desired;
mod error;
mod outcome;
mod poller;
mod reconcile;
mod request;
mod transport;
mod validate;

pub use config::{ClientConfig, ClientConfigBuilder, ConfigError};
pub use desired::{DesiredState, Presence, ResourceRef};
pub use error::{ClientError, Result};
pub use outcome::{Outcome, OutcomeStatus};
pub use poller::{OperationPhase, OperationPoller, OperationRecord};
pub use reconcile::Reconciler;
pub use request::{
    build_request, operation_request, Action, ApiRequest, AttemptContext, Method, RequestEnvelope,
};
pub use transport::{ApiResponse, HttpTransport, Transport};
pub use validate::validate;
