//! Business Site Backend - library for app logic and testing

pub mod logging;
pub mod routes;
pub mod schema;
pub mod state;
pub mod storage;

use axum::{
    http::{HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer,
};

use crate::routes::{appointments, blog, health, inquiries, portfolio, services, testimonials, users};
use crate::state::AppState;
use crate::storage::StoreConfig;

/// Configure CORS from environment variables.
/// Uses ALLOWED_ORIGINS (comma-separated) or FRONTEND_ORIGIN.
/// Falls back to the local dev frontends.
pub fn configure_cors() -> CorsLayer {
    let allowed_origins = std::env::var("ALLOWED_ORIGINS")
        .ok()
        .and_then(|s| {
            let origins: Vec<HeaderValue> = s
                .split(',')
                .filter_map(|origin| origin.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                None
            } else {
                Some(origins)
            }
        })
        .or_else(|| {
            std::env::var("FRONTEND_ORIGIN")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(|origin| vec![origin])
        })
        .unwrap_or_else(|| {
            vec![
                HeaderValue::from_static("http://localhost:3000"),
                HeaderValue::from_static("http://127.0.0.1:3000"),
                HeaderValue::from_static("http://localhost:5173"),
            ]
        });

    CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::AUTHORIZATION,
        ])
        .allow_credentials(true)
}

/// Back-office routes, mounted under /api/admin behind `authenticate_admin`.
fn admin_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/users", get(users::list_users).post(users::create_user))
        .route(
            "/users/{id}",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route(
            "/services",
            get(services::admin_list_services).post(services::create_service),
        )
        .route(
            "/services/{id}",
            get(services::admin_get_service)
                .put(services::update_service)
                .delete(services::delete_service),
        )
        .route(
            "/portfolio",
            get(portfolio::admin_list_portfolio).post(portfolio::create_portfolio_item),
        )
        .route(
            "/portfolio/{id}",
            get(portfolio::admin_get_portfolio_item)
                .put(portfolio::update_portfolio_item)
                .delete(portfolio::delete_portfolio_item),
        )
        .route(
            "/blog",
            get(blog::admin_list_posts).post(blog::create_post),
        )
        .route(
            "/blog/{id}",
            get(blog::admin_get_post)
                .put(blog::update_post)
                .delete(blog::delete_post),
        )
        .route(
            "/inquiries",
            get(inquiries::list_inquiries).post(inquiries::create_inquiry),
        )
        .route(
            "/inquiries/{id}",
            get(inquiries::get_inquiry)
                .put(inquiries::update_inquiry)
                .delete(inquiries::delete_inquiry),
        )
        .route(
            "/appointments",
            get(appointments::list_appointments).post(appointments::create_appointment),
        )
        .route(
            "/appointments/{id}",
            get(appointments::get_appointment)
                .put(appointments::update_appointment)
                .delete(appointments::delete_appointment),
        )
        .route(
            "/testimonials",
            get(testimonials::admin_list_testimonials).post(testimonials::create_testimonial),
        )
        .route(
            "/testimonials/{id}",
            get(testimonials::get_testimonial)
                .put(testimonials::update_testimonial)
                .delete(testimonials::delete_testimonial),
        )
        .route(
            "/maintenance/reconcile",
            post(portfolio::reconcile_portfolio),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            routes::auth::authenticate_admin,
        ))
}

/// Create and configure the application router.
pub fn create_app(state: AppState) -> Router {
    let cors = configure_cors();

    Router::new()
        .route("/api/services", get(services::list_services))
        .route(
            "/api/services/featured",
            get(services::list_featured_services),
        )
        .route("/api/services/{id}", get(services::get_service))
        .route(
            "/api/services/{id}/portfolio",
            get(services::get_service_portfolio),
        )
        .route("/api/portfolio", get(portfolio::list_portfolio))
        .route("/api/portfolio/{id}", get(portfolio::get_portfolio_item))
        .route("/api/blog", get(blog::list_posts))
        .route("/api/blog/{id}", get(blog::get_post))
        .route("/api/testimonials", get(testimonials::list_testimonials))
        .route("/api/contact", post(inquiries::submit_contact))
        .route("/api/appointments", post(appointments::book_appointment))
        .route("/api/status", get(health::status))
        .route("/health", get(health::health_ping))
        .nest("/api/admin", admin_routes(&state))
        .with_state(state)
        .layer(logging::middleware::propagate_request_id_layer())
        .layer(middleware::from_fn(logging::middleware::log_request))
        .layer(logging::middleware::request_id_layer())
        .layer(TraceLayer::new_for_http())
        // Compress responses with gzip/br/zstd automatically
        .layer(CompressionLayer::new())
        // Global 2 MB request body cap
        .layer(RequestBodyLimitLayer::new(2 * 1024 * 1024))
        .layer(cors)
}

/// Run the server (used by main).
pub async fn run() -> std::io::Result<()> {
    dotenvy::dotenv().ok();

    // Guards must live until shutdown or buffered log lines are lost.
    let _log_guards = logging::init();

    health::init_start_time();

    let storage = storage::connect(&StoreConfig::default()).await;
    tracing::info!(backend = storage.backend_name(), "Storage ready");

    let state = AppState::from_env(storage);
    if state.admin_token.is_none() {
        tracing::warn!("ADMIN_API_TOKEN not set. Admin routes are open to anyone who can reach them.");
    }

    let app = create_app(state);

    let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(5000);
    let addr: SocketAddr = format!("{}:{}", host, port).parse().map_err(|e| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("Invalid HOST/PORT configuration: {}", e),
        )
    })?;
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
}
