use axum::{Router, extract::FromRef, http::HeaderName};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core domain: entities, validation, authorization, persistence.
pub mod auth;
pub mod config;
pub mod error;
pub mod in_memory;
pub mod models;
pub mod repository;
pub mod validation;

// Use cases, the HTTP layer on top of them, and the demo data seeder.
pub mod handlers;
pub mod seed;
pub mod services;

// Module for routing segregation (Public, Admin).
pub mod routes;
use routes::{admin, public};

// --- Public Re-exports ---

pub use auth::AdminGate;
pub use config::AppConfig;
pub use in_memory::InMemoryRepository;
pub use repository::{PostgresRepository, RepositoryState};
pub use services::{CategoryService, ItemService};

/// ApiDoc
///
/// Aggregates every `#[utoipa::path]` handler and `ToSchema` model into the
/// OpenAPI document served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::get_health,
        handlers::get_items, handlers::get_item, handlers::get_item_create_form,
        handlers::create_item, handlers::get_item_update_form, handlers::update_item,
        handlers::get_item_delete_form, handlers::delete_item,
        handlers::get_categories, handlers::get_category, handlers::create_category,
        handlers::get_category_update_form, handlers::update_category,
        handlers::get_category_delete_plan, handlers::delete_category,
    ),
    components(
        schemas(
            models::Category, models::Item, models::CategoryForm, models::ItemForm,
            models::CategoryRefs, models::DeleteForm, models::CategoryDetail,
            models::CategoryDeletePlan, models::ItemDetail, models::CategoryOption,
            models::ItemFormView, models::ItemEditView, validation::Field,
            validation::FailureKind, validation::FieldError, validation::Attempted,
            validation::ValidationFailure, error::ErrorBody, error::BlockedBody,
            handlers::Deleted, handlers::ItemRejection, handlers::Health,
        )
    ),
    tags(
        (name = "catalog-manager", description = "Inventory catalog of items and categories")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single, immutable container shared by every request. Both services
/// wrap the same repository and the same admin gate.
#[derive(Clone)]
pub struct AppState {
    pub categories: CategoryService,
    pub items: ItemService,
    pub config: AppConfig,
}

impl AppState {
    /// Wires both services to `repo`, guarded by the configured admin password.
    pub fn new(repo: RepositoryState, config: AppConfig) -> Self {
        let gate = AdminGate::new(config.admin_password.clone());
        Self {
            categories: CategoryService::new(repo.clone(), gate.clone()),
            items: ItemService::new(repo, gate),
            config,
        }
    }
}

// --- Axum FromRef Extractor Implementations ---

// Handlers pull only the service they need out of the shared AppState.

impl FromRef<AppState> for CategoryService {
    fn from_ref(app_state: &AppState) -> CategoryService {
        app_state.categories.clone()
    }
}

impl FromRef<AppState> for ItemService {
    fn from_ref(app_state: &AppState) -> ItemService {
        app_state.items.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Assembles the routing structure, applies the global middleware and
/// registers the application state.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Header name constant for Request Correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Base Router Assembly
    let base_router = Router::new()
        // Documentation: Serve the auto-generated Swagger UI.
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Reads and form view models.
        .merge(public::public_routes())
        // Mutations. The admin password is checked by the services, per request body.
        .merge(admin::admin_routes())
        .with_state(state);

    // 3. Observability and Correlation Layers
    base_router
        .layer(
            ServiceBuilder::new()
                // 3a. Request ID Generation: a UUID for every incoming request.
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                // 3b. Request Tracing: one span per request, tagged with the request ID.
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // 3c. Request ID Propagation: echo x-request-id back to the client.
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        // 4. CORS Layer
        .layer(cors)
}

/// trace_span_logger
///
/// Builds the `TraceLayer` span so every log line of a request carries its
/// `x-request-id` next to the method and URI.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
