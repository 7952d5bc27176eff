//! sandpiper entry point.
//!
//! Host-boundary adapter for the sandbox reconciliation engine: reads one
//! JSON parameter document (from the path in argv[1], or stdin when no
//! path is given), drives a single reconciliation, and writes one JSON
//! result document to stdout. Logs go to stderr because stdout carries
//! the result document. A failure prints `{"failed": true, ...}` and
//! exits nonzero.

mod params;

use params::HostParams;
use sandpiper_core::{ClientError, HttpTransport, Outcome, Reconciler};
use serde_json::{json, Value};
use std::io::Read;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout is reserved for the result document
    tracing_subscriber::registry()
        .with(
            EnvFilter::from_default_env()
                .add_directive("sandpiper_core=info".parse()?)
                .add_directive("sandpiper_cli=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let (document, failed) = run().await;
    println!("{}", serde_json::to_string(&document)?);
    if failed {
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> (Value, bool) {
    let raw = match read_params() {
        Ok(raw) => raw,
        Err(e) => {
            return failure(json!({
                "msg": format!("failed to read parameter document: {e}")
            }))
        }
    };
    let params: HostParams = match serde_json::from_str(&raw) {
        Ok(params) => params,
        Err(e) => return failure(json!({"msg": format!("invalid parameter document: {e}")})),
    };
    let config = match params.client_config() {
        Ok(config) => config,
        Err(e) => return failure(json!({"msg": e.to_string()})),
    };
    tracing::debug!(?config, "Configuration resolved");

    let transport = Arc::new(HttpTransport::new(&config));
    let reconciler = Reconciler::new(config, transport);

    match reconciler
        .reconcile(params.state, &params.desired_state(), &params.resource_ref())
        .await
    {
        Ok(outcome) if outcome.is_failure() => failure(result_document(&outcome)),
        Ok(outcome) => (result_document(&outcome), false),
        Err(e) => failure(error_document(e)),
    }
}

/// Read the parameter document from argv[1] or stdin.
fn read_params() -> std::io::Result<String> {
    match std::env::args().nth(1) {
        Some(path) => std::fs::read_to_string(path),
        None => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            Ok(buffer)
        }
    }
}

fn result_document(outcome: &Outcome) -> Value {
    json!({
        "changed": outcome.changed,
        "msg": outcome.summary(),
        "original_message": outcome.detail,
    })
}

/// Failure document for a reconciliation error.
///
/// Remote rejections merge the error body's fields into the document so
/// the caller sees the control plane's own description of the problem.
/// The merge never displaces keys this adapter already set.
fn error_document(error: ClientError) -> Value {
    match error {
        ClientError::Api { status, body } => {
            let mut document = json!({"msg": "API failure", "status": status});
            if let (Some(doc), Some(fields)) = (document.as_object_mut(), body.as_object()) {
                for (key, value) in fields {
                    doc.entry(key.clone()).or_insert_with(|| value.clone());
                }
            } else if !body.is_null() {
                document["body"] = body;
            }
            document
        }
        other => json!({"msg": other.to_string()}),
    }
}

fn failure(mut document: Value) -> (Value, bool) {
    if let Some(map) = document.as_object_mut() {
        map.insert("failed".to_string(), json!(true));
    }
    (document, true)
}
