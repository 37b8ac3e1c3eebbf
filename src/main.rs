use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tracing::info;

use foodcosta_rs::{
    handlers::{
        admin, api, health_check, metrics_handler, request_validation_middleware,
        security_headers_middleware,
    },
    init_observability,
    observability::{observability_middleware, Metrics},
    repositories::{PgCatalogRepository, PgOrderRepository},
    services::{CartService, CartStore, CatalogService, OrderService, PricingConverter},
    shutdown_observability, Config,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration first (basic logging only)
    let config = Config::from_environment()?;
    println!("Configuration loaded successfully");

    init_observability(
        &config.observability.service_name,
        &config.observability.service_version,
        &config.observability.otlp_endpoint,
        config.observability.enable_json_logging,
    )?;

    info!("Starting foodcosta-rs service");
    info!(
        "Service: {} v{}",
        config.observability.service_name, config.observability.service_version
    );

    let metrics = Arc::new(Metrics::new()?);
    info!("Metrics initialized successfully");

    // Lazy pool: the service starts even when the backend is down, and
    // catalog reads degrade instead of failing the whole session.
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect_lazy(&config.database.database_url)?;
    info!("Database pool initialized");

    let catalog_repository = Arc::new(PgCatalogRepository::new(pool.clone()));
    let order_repository = Arc::new(PgOrderRepository::new(pool.clone()));
    info!("Repositories initialized successfully");

    let pricing = PricingConverter::new(
        config.pricing.exchange_rate_decimal()?,
        config.pricing.currency_symbol.clone(),
    );
    info!(
        "Pricing converter initialized with fixed rate {}",
        pricing.rate()
    );

    let cart_store = Arc::new(CartStore::new());
    let catalog_service = Arc::new(CatalogService::new(catalog_repository.clone()));
    let cart_service = Arc::new(CartService::new(
        cart_store.clone(),
        catalog_repository.clone(),
        pricing.clone(),
    ));
    let order_service = Arc::new(OrderService::new(
        cart_store,
        order_repository,
        pricing,
    ));
    info!("Services initialized successfully");

    let app = create_app(
        metrics,
        catalog_service,
        cart_service,
        order_service,
        admin::AdminState {
            pool,
            catalog_repository,
        },
        config.server.request_timeout(),
    );

    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);
    info!("Server listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;

    let shutdown_signal = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install CTRL+C signal handler");
        info!("Shutdown signal received");
        shutdown_observability().await;
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

fn create_app(
    metrics: Arc<Metrics>,
    catalog_service: Arc<CatalogService>,
    cart_service: Arc<CartService>,
    order_service: Arc<OrderService>,
    admin_state: admin::AdminState,
    request_timeout: std::time::Duration,
) -> Router {
    let metrics_for_middleware = metrics.clone();

    let api_state = api::ApiState {
        catalog_service,
        cart_service,
        order_service,
        metrics: metrics.clone(),
    };

    Router::new()
        // Health and metrics endpoints (with metrics state)
        .route("/health/status", get(health_check))
        .route("/metrics", get(metrics_handler))
        .with_state(metrics)
        // Catalog endpoints (read-only)
        .route("/api/restaurants", get(api::list_restaurants))
        .route("/api/restaurants/:restaurant_id", get(api::get_restaurant))
        .route(
            "/api/restaurants/:restaurant_id/menu",
            get(api::list_menu_items),
        )
        // Cart endpoints
        .route("/api/cart/:session_id", get(api::get_cart))
        .route("/api/cart/:session_id/items", post(api::add_cart_item))
        .route(
            "/api/cart/:session_id/items/:menu_item_id",
            put(api::update_cart_item).delete(api::remove_cart_item),
        )
        .route("/api/cart/:session_id/clear", post(api::clear_cart))
        .route("/api/cart/:session_id/checkout", post(api::checkout_cart))
        // Order endpoints
        .route("/api/orders/:order_id", get(api::get_order))
        .with_state(api_state)
        // Admin endpoints (with admin state)
        .route("/api/admin/setup-schema", post(admin::setup_schema))
        .route("/api/admin/seed", post(admin::seed_database))
        .with_state(admin_state)
        // Middleware layers (order matters - outer to inner)
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(CorsLayer::permissive())
        .layer(TimeoutLayer::new(request_timeout))
        .layer(middleware::from_fn(request_validation_middleware))
        .layer(middleware::from_fn(move |req, next| {
            observability_middleware(metrics_for_middleware.clone(), req, next)
        }))
}
