//! Billing sync service entry point.

use std::sync::Arc;
use std::time::Duration;

use axum::http::{header, Method};
use secrecy::ExposeSecret;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use billing_sync::adapters::appstore::AppleJwsVerifier;
use billing_sync::adapters::http::{billing_router, BillingAppState};
use billing_sync::adapters::postgres::PostgresUserRecordStore;
use billing_sync::adapters::storage::FileSnapshotCache;
use billing_sync::adapters::stripe::{StripeConfig, StripePaymentAdapter};
use billing_sync::config::AppConfig;
use billing_sync::ports::AppleNotificationVerifier;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        tracing::error!(%error, "Service exited with error");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    init_tracing(&config);
    config.validate_or_warn()?;

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout())
        .connect(&config.database.url)
        .await?;
    tracing::info!("Database connection established");

    if config.database.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Database migrations applied");
    }

    let stripe_config =
        StripeConfig::new(config.payment.stripe_api_key.expose_secret().to_string());

    let apple_verifier: Option<Arc<dyn AppleNotificationVerifier>> =
        match &config.payment.apple_signing_key_pem {
            Some(pem) => {
                let verifier = AppleJwsVerifier::from_pem(
                    pem.expose_secret(),
                    config.payment.apple_bundle_id.clone(),
                )?;
                Some(Arc::new(verifier))
            }
            None => {
                tracing::warn!("App Store verification key not configured; /webhook-apple will reject deliveries");
                None
            }
        };

    let state = BillingAppState {
        record_store: Arc::new(PostgresUserRecordStore::new(pool)),
        snapshot_cache: Arc::new(FileSnapshotCache::new(&config.cache.snapshot_path)),
        payment_provider: Arc::new(StripePaymentAdapter::new(stripe_config)),
        apple_verifier,
        webhook_secret: config.payment.stripe_webhook_secret.clone(),
        price_id: config.payment.price_id.clone(),
        public_base_url: config.payment.public_base_url.clone(),
        require_livemode: config.payment.require_livemode,
    };

    let app = billing_router().with_state(state).layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TraceLayer::new_for_http())
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.server.request_timeout_secs,
            )))
            .layer(cors_layer(&config)),
    );

    let addr = config.server.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Billing sync service listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.server.log_level.clone()));

    if config.is_production() {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).compact().init();
    }
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    let origins = config.server.cors_origins_list();
    if origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let parsed: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
    layer.allow_origin(parsed)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            tracing::error!(%error, "Failed to install shutdown signal handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => tracing::error!(%error, "Failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received ctrl-c, shutting down"),
        _ = terminate => tracing::info!("Received terminate signal, shutting down"),
    }
}
