//! Spindex Directory API
//!
//! Subscription-gated startup directory with outreach tooling.
//!
//! ## REST Endpoints
//!
//! - `GET /api/v1/directory/{slug}` - Directory listing with facets
//! - `GET /api/v1/directory/{slug}/companies/{company_slug}` - Company detail
//! - `GET /api/v1/directory/{slug}/people/{person_slug}` - Person detail
//! - `GET /api/v1/directory/{slug}/outreach` - Outreach queue (subscribers)
//! - `POST /api/v1/people/{id}/contacted` - Record an outreach contact
//! - `GET /api/v1/people/{id}/compose` - Build a mailto compose link
//! - `POST /api/v1/billing/checkout` - Create checkout session
//! - `POST /api/v1/billing/portal` - Create customer portal session
//! - `GET /api/v1/billing/subscription` - Get caller's subscription
//! - `GET/POST /api/v1/admin/universities`, `PUT/DELETE .../{id}` - Admin CRUD
//! - `GET/POST /api/v1/admin/companies`, `PUT/DELETE .../{id}` - Admin CRUD
//! - `GET/POST /api/v1/admin/people`, `PUT/DELETE .../{id}` - Admin CRUD
//! - `GET/POST /api/v1/admin/templates`, `PUT/DELETE .../{id}` - Admin CRUD
//! - `POST /webhooks/stripe` - Stripe webhook handler
//!
//! ## Health Endpoints
//!
//! - `GET /health` - Liveness probe
//! - `GET /ready` - Readiness probe
//! - `GET /metrics` - Prometheus metrics

mod config;
mod error;
mod extractors;
mod handlers;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::connect_info::IntoMakeServiceWithConnectInfo;
use axum::routing::{get, post, put};
use axum::Router;
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use spindex_auth_core::HttpSessionOracle;
use spindex_billing_core::{BillingService, StripeProvider};
use spindex_db::Repositories;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::handlers::{health, ready};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive("directory_api=debug".parse()?))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Spindex Directory API");

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!(
        http_port = config.http_port,
        billing_enabled = config.billing.is_some(),
        "Configuration loaded"
    );

    // Initialize metrics
    let metrics_handle = if config.metrics_enabled {
        Some(setup_metrics()?)
    } else {
        None
    };

    // Create database pool
    let pool =
        spindex_db::create_pool(&config.database_url, config.database_max_connections).await?;

    // Create repositories
    let repos = Repositories::new(pool.clone());

    // Create identity oracle
    let oracle = HttpSessionOracle::new(config.identity.clone());

    // Create billing service when configured
    let billing = config.billing.clone().map(|billing_config| {
        BillingService::new(
            Arc::new(repos.subscriptions.clone()),
            Arc::new(StripeProvider::new(billing_config.clone())),
            billing_config,
        )
    });
    if billing.is_none() {
        tracing::warn!("Billing not configured; checkout, portal, and webhook endpoints disabled");
    }

    // Create application state
    let state = AppState::new(oracle, repos, billing, pool, config.clone());

    // Build HTTP router
    let app = build_router(state, metrics_handle);

    // Start server
    let http_addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    run_http_server(app, http_addr).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn build_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let request_timeout = state.request_timeout();

    // API v1 routes
    let api_v1 = Router::new()
        // Directory routes (public, gated fields redacted for anonymous callers)
        .route("/directory/{slug}", get(handlers::get_directory))
        .route(
            "/directory/{slug}/companies/{company_slug}",
            get(handlers::get_company),
        )
        .route(
            "/directory/{slug}/people/{person_slug}",
            get(handlers::get_person),
        )
        // Outreach routes (subscribers only)
        .route("/directory/{slug}/outreach", get(handlers::get_outreach_queue))
        .route("/people/{id}/contacted", post(handlers::mark_contacted))
        .route("/people/{id}/compose", get(handlers::compose_email))
        // Billing routes
        .route("/billing/checkout", post(handlers::create_checkout))
        .route("/billing/portal", post(handlers::create_portal))
        .route("/billing/subscription", get(handlers::get_subscription))
        // Admin routes
        .route(
            "/admin/universities",
            get(handlers::list_universities).post(handlers::create_university),
        )
        .route(
            "/admin/universities/{id}",
            put(handlers::update_university).delete(handlers::delete_university),
        )
        .route(
            "/admin/companies",
            get(handlers::list_companies).post(handlers::create_company),
        )
        .route(
            "/admin/companies/{id}",
            put(handlers::update_company).delete(handlers::delete_company),
        )
        .route(
            "/admin/people",
            get(handlers::list_people).post(handlers::create_person),
        )
        .route(
            "/admin/people/{id}",
            put(handlers::update_person).delete(handlers::delete_person),
        )
        .route(
            "/admin/templates",
            get(handlers::list_templates).post(handlers::create_template),
        )
        .route(
            "/admin/templates/{id}",
            put(handlers::update_template).delete(handlers::delete_template),
        );

    // Webhook route (separate - uses raw body, no JSON parsing)
    let webhook_routes = Router::new().route("/webhooks/stripe", post(handlers::stripe_webhook));

    // Health routes (no timeout - must always respond quickly)
    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready));

    // Metrics route (no timeout)
    let metrics_route = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    // Build middleware stack (order matters - outermost first)
    let middleware = ServiceBuilder::new()
        // Request ID propagation (outermost)
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        // Tracing with request details
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // CORS
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        // Request timeout (innermost - closest to handler)
        .layer(TimeoutLayer::new(request_timeout));

    // Combine all routes
    Router::new()
        .nest("/api/v1", api_v1)
        .merge(webhook_routes)
        .layer(middleware)
        .merge(health_routes) // Health routes without timeout
        .merge(metrics_route) // Metrics route without timeout
        .with_state(state)
}

async fn run_http_server(app: Router, addr: SocketAddr) -> anyhow::Result<()> {
    tracing::info!("HTTP server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    let service: IntoMakeServiceWithConnectInfo<Router, SocketAddr> =
        app.into_make_service_with_connect_info();

    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn setup_metrics() -> anyhow::Result<PrometheusHandle> {
    // Latency buckets for directory and billing operations
    // Most ops should complete in <100ms
    let latency_buckets = &[0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.2, 0.5, 1.0, 2.5];

    let builder = PrometheusBuilder::new().set_buckets_for_metric(
        Matcher::Full("directory_operation_duration_seconds".to_string()),
        latency_buckets,
    )?;

    let handle = builder.install_recorder()?;

    // Register metrics with descriptions
    metrics::describe_counter!(
        "directory_checkouts_created_total",
        "Total checkout sessions created"
    );
    metrics::describe_counter!(
        "directory_webhooks_processed_total",
        "Total webhooks processed by outcome"
    );
    metrics::describe_histogram!(
        "directory_operation_duration_seconds",
        "Directory operation latency in seconds by operation type"
    );

    Ok(handle)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
