use std::net::SocketAddr;

use axum::{
    Router,
    extract::{MatchedPath, Request},
};
use axum_server::Handle;
use clap::Parser;
use reqwest::Client;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{Layer, filter, layer::SubscriberExt, util::SubscriberInitExt};

use ledgerhub::{
    AnalysisState, HttpTransactionSource,
    analysis::build_router,
    config::{ServiceUrls, outbound_timeout},
    graceful_shutdown,
};

/// The budget-analysis service: per-budget spend summaries and category
/// spending insights, computed from the transaction service on every request.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// The port to serve the analysis API from.
    #[arg(short, long, default_value_t = 8004)]
    port: u16,
}

#[tokio::main]
async fn main() {
    setup_logging();

    let args = Args::parse();
    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));

    let services = ServiceUrls::from_env();
    let client = Client::builder()
        .timeout(outbound_timeout())
        .build()
        .expect("Could not build the outbound HTTP client.");
    let source = HttpTransactionSource::new(client, &services.transactions);
    let state = AnalysisState::new(source);

    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    let router = add_tracing_layer(build_router(state));

    tracing::info!("Budget analysis service listening on {}", addr);
    axum_server::bind(addr)
        .handle(handle)
        .serve(router.into_make_service())
        .await
        .unwrap();
}

fn setup_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer().pretty().with_filter(
                filter::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| filter::EnvFilter::new("info")),
            ),
        )
        .init();
}

fn add_tracing_layer(router: Router) -> Router {
    let tracing_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request| {
            let method = req.method();
            let uri = req.uri();

            let matched_path = req
                .extensions()
                .get::<MatchedPath>()
                .map(|matched_path| matched_path.as_str());

            tracing::debug_span!("request", %method, %uri, matched_path)
        })
        // Upstream failures are translated and logged by the engine, so the
        // default 5xx logging would duplicate them.
        .on_failure(());

    router.layer(tracing_layer)
}
