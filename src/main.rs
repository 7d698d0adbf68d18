use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use axum_prometheus::PrometheusMetricLayer;
use clap::{Args, Parser, Subcommand};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Deserialize;
use serde_json::{json, Value};
use sheet_autofill::autofill::{
    AutofillEngine, AutofillOptions, AutofillResult, InMemoryCompletionTracker,
};
use sheet_autofill::config::AppConfig;
use sheet_autofill::error::AppError;
use sheet_autofill::telemetry;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
struct AppState {
    engine: Arc<AutofillEngine<InMemoryCompletionTracker>>,
    readiness: Arc<AtomicBool>,
    metrics: PrometheusHandle,
}

#[derive(Parser, Debug)]
#[command(
    name = "Performance Sheet Autofill",
    about = "Suggest performance sheet values from the command line or over HTTP",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Generate suggestions for a sheet stored as a JSON file
    Suggest(SuggestArgs),
}

#[derive(Args, Debug, Default)]
struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    port: Option<u16>,
}

#[derive(Args, Debug)]
struct SuggestArgs {
    /// Path to the sheet record (JSON)
    input: PathBuf,
    /// Sheet identity for completion tracking
    #[arg(long)]
    sheet_id: Option<String>,
    /// Field that changed, to report which tabs it recomputes
    #[arg(long)]
    changed_field: Option<String>,
    /// Skip form-data normalization before evaluating rules
    #[arg(long)]
    no_transform: bool,
}

#[derive(Debug, Deserialize)]
struct AutofillRequest {
    data: Value,
    #[serde(flatten)]
    options: AutofillOptions,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run_cli().await {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
}

async fn run_cli() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => run_server(args).await,
        Command::Suggest(args) => run_suggest(args),
    }
}

async fn run_server(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let state = AppState {
        engine: Arc::new(AutofillEngine::default()),
        readiness: readiness_flag.clone(),
        metrics: prometheus_handle,
    };

    let app = app_router(state).layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "sheet autofill service ready");

    axum::serve(listener, app).await?;
    Ok(())
}

fn run_suggest(args: SuggestArgs) -> Result<(), AppError> {
    let SuggestArgs {
        input,
        sheet_id,
        changed_field,
        no_transform,
    } = args;

    let raw = std::fs::read_to_string(input)?;
    let data: Value = serde_json::from_str(&raw)?;

    let engine = AutofillEngine::default();
    let options = AutofillOptions {
        sheet_id,
        changed_field,
        transform: !no_transform,
    };
    let result = engine.generate(&data, &options);

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/v1/autofill", post(autofill_endpoint))
        .with_state(state)
}

async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn readiness_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

async fn metrics_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

async fn autofill_endpoint(
    State(state): State<AppState>,
    Json(payload): Json<AutofillRequest>,
) -> Json<AutofillResult> {
    let AutofillRequest { data, options } = payload;
    Json(state.engine.generate(&data, &options))
}
