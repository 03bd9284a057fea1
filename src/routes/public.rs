use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Public Router Module
///
/// Endpoints that never mutate the catalog and need no credential. The
/// `GET` side of every form (create/update/delete) lives here so the client
/// can render it before the admin submits.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness check for load balancers; reports the runtime environment.
        .route("/health", get(handlers::get_health))
        // GET /catalog, /catalog/items
        // The catalog landing page is the item listing.
        .route("/catalog", get(handlers::get_items))
        .route("/catalog/items", get(handlers::get_items))
        // GET /catalog/item/create
        // Category picker for a new item.
        .route("/catalog/item/create", get(handlers::get_item_create_form))
        .route("/catalog/item/{id}", get(handlers::get_item))
        .route("/catalog/item/{id}/update", get(handlers::get_item_update_form))
        .route("/catalog/item/{id}/delete", get(handlers::get_item_delete_form))
        .route("/catalog/categories", get(handlers::get_categories))
        .route("/catalog/category/{id}", get(handlers::get_category))
        .route(
            "/catalog/category/{id}/update",
            get(handlers::get_category_update_form),
        )
        // GET /catalog/category/{id}/delete
        // Shows which items would lose the reference and which block the delete.
        .route(
            "/catalog/category/{id}/delete",
            get(handlers::get_category_delete_plan),
        )
}
