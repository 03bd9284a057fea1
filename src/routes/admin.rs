use crate::{AppState, handlers};
use axum::{Router, routing::post};

/// Admin Router Module
///
/// Every route that changes the catalog. Each request body carries the admin
/// password; the services reject a wrong one with a 422 flagging only the
/// `password` field, before anything is written.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/catalog/item/create", post(handlers::create_item))
        .route("/catalog/item/{id}/update", post(handlers::update_item))
        .route("/catalog/item/{id}/delete", post(handlers::delete_item))
        .route("/catalog/category/create", post(handlers::create_category))
        .route(
            "/catalog/category/{id}/update",
            post(handlers::update_category),
        )
        // POST /catalog/category/{id}/delete
        // Cascades the removal to items that have another category, or answers
        // 409 with the items that would be left without one.
        .route(
            "/catalog/category/{id}/delete",
            post(handlers::delete_category),
        )
}
