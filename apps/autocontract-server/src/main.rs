//! AutoContract Server
//!
//! Backend for filling Argentine rental contract templates. Provides REST API
//! endpoints for:
//!
//! - Variable detection (LLM)
//! - Guided data collection chat (LLM)
//! - Value substitution into the template
//! - Typst export of the finished contract
//!
//! The `convert` subcommand turns a filled contract file into a template
//! with `{{MARKER}}` placeholders instead of starting the server.
//!
//! ## Architecture
//!
//! Substitution and export are pure calls into `contract-engine`. The two
//! LLM-backed endpoints go through a single [`llm::LlmClient`] chosen at
//! startup, with every call bounded by `--timeout-ms`.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::anyhow;
use axum::{
    routing::{get, post},
    Router,
};
use clap::{Parser, Subcommand};
use tower::ServiceBuilder;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::{info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod api;
mod config;
mod convert;
mod error;
mod llm;
mod prompts;

use api::{
    handle_analyze, handle_chat, handle_export, handle_generate, handle_health, handle_info,
    handle_root,
};
use config::ProviderSettings;
use llm::LlmClient;

/// Command-line arguments for the autocontract server
#[derive(Parser, Debug)]
#[command(name = "autocontract-server")]
#[command(about = "Rental contract assistant: variable detection, guided chat and substitution")]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "8000")]
    port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// LLM call timeout in milliseconds
    #[arg(long, global = true, default_value = "60000")]
    timeout_ms: u64,

    /// Rate limit: requests per second per IP
    #[arg(long, default_value = "10")]
    rate_limit: u32,

    /// Directory holding the frontend (index.html and assets)
    #[arg(long, env = "FRONTEND_DIR")]
    frontend_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(flatten)]
    provider: ProviderSettings,

    /// Runs the server when omitted
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert a filled contract (.pdf, .docx or .txt) into a {{MARKER}} template
    Convert(convert::ConvertArgs),
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// LLM call timeout in milliseconds
    pub timeout_ms: u64,
    pub llm: Arc<dyn LlmClient>,
    pub frontend_dir: Option<PathBuf>,
}

/// Routes and handlers, without the network-facing middleware added in `main`.
pub fn build_router(state: AppState) -> Router {
    let mut router = Router::new()
        // Health check
        .route("/health", get(handle_health))
        .route("/", get(handle_root))
        // API endpoints
        .route("/api/info", get(handle_info))
        .route("/api/analyze", post(handle_analyze))
        .route("/api/chat", post(handle_chat))
        .route("/api/generate", post(handle_generate))
        .route("/api/export", post(handle_export))
        // Path used by earlier frontends
        .route("/api/export-docx", post(handle_export));

    if let Some(dir) = &state.frontend_dir {
        router = router.nest_service("/static", ServeDir::new(dir));
    }

    router.with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
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

    let llm = args.provider.build_client()?;

    if let Some(Command::Convert(convert_args)) = &args.command {
        let summary = convert::run(convert_args, llm.as_ref(), args.timeout_ms).await?;
        println!("{}", summary.output.display());
        return Ok(());
    }

    info!("Starting autocontract server on {}:{}", args.host, args.port);

    // Create rate limiter configuration
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(args.rate_limit.into())
            .burst_size(args.rate_limit * 2)
            .finish()
            .ok_or_else(|| anyhow!("invalid rate limit: {}", args.rate_limit))?,
    );

    // Create shared state
    let state = AppState {
        timeout_ms: args.timeout_ms,
        llm,
        frontend_dir: args.frontend_dir.clone(),
    };

    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = build_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors)
            .layer(GovernorLayer {
                config: governor_conf,
            }),
    );

    // Start server
    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Server listening on http://{}", addr);
    info!("Rate limit: {} requests/second per IP", args.rate_limit);
    info!("LLM timeout: {}ms", args.timeout_ms);
    if let Some(dir) = &args.frontend_dir {
        info!("Serving frontend from {}", dir.display());
    }

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
