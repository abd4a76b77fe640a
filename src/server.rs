//! # Server Configuration
//!
//! This module contains the router, shared state and OpenAPI document for the
//! Greenergy API.

use std::sync::Arc;

use axum::{Router, middleware, routing::get};
use sea_orm::DatabaseConnection;
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::auth_middleware;
use crate::config::AppConfig;
use crate::handlers::{self, unavailability};
use crate::repositories::TimeSeriesRepository;
use crate::services::UnavailabilityService;
use crate::telemetry::trace_id_middleware;

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DatabaseConnection,
    pub unavailability: Arc<UnavailabilityService>,
}

impl AppState {
    /// State backed by the SeaORM store on `db`.
    pub fn new(config: Arc<AppConfig>, db: DatabaseConnection) -> Self {
        let store = TimeSeriesRepository::new(Arc::new(db.clone()));
        Self {
            config,
            db,
            unavailability: Arc::new(UnavailabilityService::new(Arc::new(store))),
        }
    }
}

/// Creates and configures the Axum application router
pub fn create_app(state: AppState) -> Router {
    let api = Router::new()
        .route("/", get(unavailability::list_unavailabilities))
        .route("/grouped", get(unavailability::list_grouped_unavailabilities))
        .route("/stats", get(unavailability::unavailability_stats))
        .route("/export/csv", get(unavailability::export_csv))
        .route("/export/excel", get(unavailability::export_excel))
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state.config),
            auth_middleware,
        ));

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .nest("/api/unavailability", api)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
        .layer(middleware::from_fn(trace_id_middleware))
        .layer(TraceLayer::new_for_http())
}

/// Starts the server with the given configuration
pub async fn run_server(config: AppConfig, db: DatabaseConnection) -> anyhow::Result<()> {
    let addr = config.bind_addr()?;
    let profile = config.profile.clone();

    let state = AppState::new(Arc::new(config), db);
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, %profile, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Registers the API key and bearer security schemes.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_key",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("x-api-key"))),
        );
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::health,
        crate::handlers::unavailability::list_unavailabilities,
        crate::handlers::unavailability::list_grouped_unavailabilities,
        crate::handlers::unavailability::unavailability_stats,
        crate::handlers::unavailability::export_csv,
        crate::handlers::unavailability::export_excel,
    ),
    components(
        schemas(
            crate::models::ServiceInfo,
            crate::handlers::HealthResponse,
            crate::models::UnavailabilityItem,
            crate::models::UnavailabilityStats,
            crate::models::UnavailabilityResponse,
            crate::error::ApiError,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "root", description = "Service information and health"),
        (name = "unavailability", description = "Generation unit unavailabilities")
    ),
    info(
        title = "Greenergy API",
        description = "Generation outage ingestion and aggregation",
        version = env!("CARGO_PKG_VERSION"),
    )
)]
pub struct ApiDoc;
