//! Command implementations behind the `carelink-server` binary.
//!
//! `carelink-server serve` - Run the API.
//! `carelink-server token mint` - Issue a token with the configured secret and lifetime.
//! `carelink-server token verify` - Verify a token and print its claims.
//! `carelink-server envelope seal` - Encrypt a JSON document into an envelope.
//! `carelink-server envelope open` - Decrypt an envelope back to JSON.

use crate::routes::create_router;
use crate::state::AppState;
use anyhow::Context;
use serde_json::Value;
use tokio::net::TcpListener;

/// Bind and serve the API until Ctrl-C.
pub async fn serve(state: AppState, bind: &str) -> anyhow::Result<()> {
    let app = create_router(state);

    let listener = TcpListener::bind(bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;
    tracing::info!(address = %bind, "carelink-server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("carelink-server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}

/// Issue a token and return it.
pub fn token_mint(state: &AppState, id: i64, role: &str, approved: bool) -> anyhow::Result<String> {
    state
        .issuer()
        .issue(id, role, approved)
        .context("failed to issue token")
}

/// Verify a token and return its claims as pretty JSON.
pub fn token_verify(state: &AppState, token: &str) -> anyhow::Result<String> {
    let claims = state
        .verifier()
        .verify(token.trim())
        .context("token rejected")?;
    Ok(serde_json::to_string_pretty(&claims)?)
}

/// Seal a JSON document into an envelope string.
pub fn envelope_seal(state: &AppState, json: &str) -> anyhow::Result<String> {
    let value: Value = serde_json::from_str(json).context("input is not valid JSON")?;
    state
        .cipher()
        .seal_json(&value)
        .context("failed to seal payload")
}

/// Open an envelope string and return the pretty-printed JSON inside.
pub fn envelope_open(state: &AppState, envelope: &str) -> anyhow::Result<String> {
    let value = state
        .cipher()
        .open_json(envelope.trim())
        .context("failed to open envelope")?;
    Ok(serde_json::to_string_pretty(&value)?)
}
