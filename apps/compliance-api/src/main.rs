//! Compliance Intelligence API
//!
//! HTTP front for the compliance core. Provides REST endpoints for:
//!
//! - Filing ingestion and section/evidence extraction
//! - Clause evaluation against extracted evidence
//! - Evidence navigation for recorded decisions
//! - Audit-firm risk scoring and repeated-clause detection
//! - Audit ledger listing and chain verification

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use clap::Parser;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod api;
mod config;
mod error;
mod state;

use api::{
    handle_audit_events, handle_audit_firm_risk, handle_decision_risk, handle_evaluate_clause,
    handle_extract_document, handle_health, handle_ingest_document, handle_repeat_violations,
    handle_verify_chain, handle_violation_evidence, SharedState,
};
use config::ServiceConfig;
use state::AppState;

/// Command-line arguments for the compliance API
#[derive(Parser, Debug)]
#[command(name = "compliance-api")]
#[command(about = "Clause evaluation, evidence navigation and audit ledger service")]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "8000")]
    port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Optional TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Build the router with every endpoint mounted
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handle_health))
        // Documents
        .route("/v1/documents/ingest", post(handle_ingest_document))
        .route(
            "/v1/documents/:document_id/extract",
            post(handle_extract_document),
        )
        // Decisions
        .route("/v1/compliance/evaluate", post(handle_evaluate_clause))
        .route(
            "/v1/violations/:violation_id/evidence",
            get(handle_violation_evidence),
        )
        // Intelligence
        .route(
            "/v1/intelligence/audit-firm-risk",
            post(handle_audit_firm_risk),
        )
        .route(
            "/v1/intelligence/audit-firm-risk/decisions",
            post(handle_decision_risk),
        )
        .route(
            "/v1/intelligence/repeat-violations",
            post(handle_repeat_violations),
        )
        // Audit ledger
        .route("/v1/audit/events", get(handle_audit_events))
        .route("/v1/audit/verify", get(handle_verify_chain))
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match &args.config {
        Some(path) => ServiceConfig::from_file(path)?,
        None => ServiceConfig::default(),
    };
    info!(
        "Ledger writer role: {}, unredacted reader role: {}",
        config.access.ledger_writer_role, config.access.unredacted_reader_role
    );

    let state = Arc::new(AppState::new(config));

    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Compliance API listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
