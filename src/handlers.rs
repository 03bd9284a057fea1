use crate::{
    config::{AppConfig, Env},
    error::{BlockedBody, CategoryError, ErrorBody, ItemError},
    models::{
        self, Category, CategoryDeletePlan, CategoryDetail, CategoryForm, DeleteForm, Item,
        ItemDetail, ItemEditView, ItemForm, ItemFormView,
    },
    services::{CategoryService, ItemService},
    validation::{self, Attempted, FieldError, ValidationFailure},
};
use axum::{
    Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Response Bodies ---

/// Deleted
///
/// Acknowledges a delete and names the listing the client should return to.
#[derive(Debug, Serialize, ToSchema)]
pub struct Deleted {
    pub id: Uuid,
    pub next: String,
}

/// Health
///
/// Liveness answer, tagged with the environment the service was started in.
#[derive(Debug, Serialize, ToSchema)]
pub struct Health {
    pub status: String,
    pub env: Env,
}

/// ItemRejection
///
/// 422 body of a rejected item submission: the failure plus a fresh category
/// picker with the user's well-formed picks still checked.
#[derive(Debug, Serialize, ToSchema)]
pub struct ItemRejection {
    pub attempted: Attempted,
    pub errors: Vec<FieldError>,
    pub form: ItemFormView,
}

/// Rebuilds the picker for a rejected item submission. A failure to list the
/// categories turns the whole response into a 500.
async fn reject_item(items: &ItemService, failure: ValidationFailure) -> Response {
    let selected = match &failure.attempted {
        Attempted::Item(form) => validation::normalize_category_refs(form.categories.as_ref()).ids,
        _ => Vec::new(),
    };
    match items.form_view_model_for(&selected).await {
        Ok(form) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ItemRejection {
                attempted: failure.attempted,
                errors: failure.errors,
                form,
            }),
        )
            .into_response(),
        Err(err) => err.into_response(),
    }
}

// --- Health ---

/// get_health
///
/// [Public Route] Liveness check for monitoring and load balancers.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = Health))
)]
pub async fn get_health(State(config): State<AppConfig>) -> Json<Health> {
    Json(Health {
        status: "ok".to_string(),
        env: config.env,
    })
}

// --- Item Handlers ---

/// get_items
///
/// [Public Route] Lists every item, ascending by name.
#[utoipa::path(
    get,
    path = "/catalog/items",
    responses((status = 200, description = "All items", body = [Item]))
)]
pub async fn get_items(State(items): State<ItemService>) -> Result<Json<Vec<Item>>, ItemError> {
    Ok(Json(items.list().await?))
}

/// get_item
///
/// [Public Route] One item with its categories resolved.
#[utoipa::path(
    get,
    path = "/catalog/item/{id}",
    params(("id" = Uuid, Path, description = "Item ID")),
    responses(
        (status = 200, description = "Found", body = ItemDetail),
        (status = 404, description = "Not Found", body = ErrorBody)
    )
)]
pub async fn get_item(
    State(items): State<ItemService>,
    Path(id): Path<Uuid>,
) -> Result<Json<ItemDetail>, ItemError> {
    Ok(Json(items.detail(id).await?))
}

/// get_item_create_form
///
/// [Public Route] The category picker for a new item, nothing checked.
#[utoipa::path(
    get,
    path = "/catalog/item/create",
    responses((status = 200, description = "Form view model", body = ItemFormView))
)]
pub async fn get_item_create_form(
    State(items): State<ItemService>,
) -> Result<Json<ItemFormView>, ItemError> {
    Ok(Json(items.form_view_model(None).await?))
}

/// create_item
///
/// [Admin Route] Creates an item. The admin password travels in the body.
#[utoipa::path(
    post,
    path = "/catalog/item/create",
    request_body = ItemForm,
    responses(
        (status = 201, description = "Created", body = Item),
        (status = 422, description = "Rejected submission", body = ItemRejection)
    )
)]
pub async fn create_item(
    State(items): State<ItemService>,
    Json(payload): Json<ItemForm>,
) -> Response {
    match items.create(payload).await {
        Ok(item) => (
            StatusCode::CREATED,
            [(header::LOCATION, item.url())],
            Json(item),
        )
            .into_response(),
        Err(ItemError::Invalid(failure)) => reject_item(&items, failure).await,
        Err(err) => err.into_response(),
    }
}

/// get_item_update_form
///
/// [Public Route] The stored item plus its pre-checked category picker.
#[utoipa::path(
    get,
    path = "/catalog/item/{id}/update",
    params(("id" = Uuid, Path, description = "Item ID")),
    responses(
        (status = 200, description = "Edit view", body = ItemEditView),
        (status = 404, description = "Not Found", body = ErrorBody)
    )
)]
pub async fn get_item_update_form(
    State(items): State<ItemService>,
    Path(id): Path<Uuid>,
) -> Result<Json<ItemEditView>, ItemError> {
    Ok(Json(items.edit_view(id).await?))
}

/// update_item
///
/// [Admin Route] Overwrites an item.
#[utoipa::path(
    post,
    path = "/catalog/item/{id}/update",
    params(("id" = Uuid, Path, description = "Item ID")),
    request_body = ItemForm,
    responses(
        (status = 200, description = "Updated", body = Item),
        (status = 404, description = "Not Found", body = ErrorBody),
        (status = 422, description = "Rejected submission", body = ItemRejection)
    )
)]
pub async fn update_item(
    State(items): State<ItemService>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ItemForm>,
) -> Response {
    match items.update(id, payload).await {
        Ok(item) => ([(header::LOCATION, item.url())], Json(item)).into_response(),
        Err(ItemError::Invalid(failure)) => reject_item(&items, failure).await,
        Err(err) => err.into_response(),
    }
}

/// get_item_delete_form
///
/// [Public Route] The item a delete would remove.
#[utoipa::path(
    get,
    path = "/catalog/item/{id}/delete",
    params(("id" = Uuid, Path, description = "Item ID")),
    responses(
        (status = 200, description = "Found", body = Item),
        (status = 404, description = "Not Found", body = ErrorBody)
    )
)]
pub async fn get_item_delete_form(
    State(items): State<ItemService>,
    Path(id): Path<Uuid>,
) -> Result<Json<Item>, ItemError> {
    Ok(Json(items.get(id).await?))
}

/// delete_item
///
/// [Admin Route] Removes an item.
#[utoipa::path(
    post,
    path = "/catalog/item/{id}/delete",
    params(("id" = Uuid, Path, description = "Item ID")),
    request_body = DeleteForm,
    responses(
        (status = 200, description = "Deleted", body = Deleted),
        (status = 404, description = "Not Found", body = ErrorBody),
        (status = 422, description = "Incorrect password", body = ValidationFailure)
    )
)]
pub async fn delete_item(
    State(items): State<ItemService>,
    Path(id): Path<Uuid>,
    Json(payload): Json<DeleteForm>,
) -> Result<Json<Deleted>, ItemError> {
    items.delete(id, payload).await?;
    Ok(Json(Deleted {
        id,
        next: "/catalog/items".to_string(),
    }))
}

// --- Category Handlers ---

/// get_categories
///
/// [Public Route] Lists every category, ascending by name.
#[utoipa::path(
    get,
    path = "/catalog/categories",
    responses((status = 200, description = "All categories", body = [Category]))
)]
pub async fn get_categories(
    State(categories): State<CategoryService>,
) -> Result<Json<Vec<Category>>, CategoryError> {
    Ok(Json(categories.list().await?))
}

/// get_category
///
/// [Public Route] One category and every item that references it.
#[utoipa::path(
    get,
    path = "/catalog/category/{id}",
    params(("id" = Uuid, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Found", body = CategoryDetail),
        (status = 404, description = "Not Found", body = ErrorBody)
    )
)]
pub async fn get_category(
    State(categories): State<CategoryService>,
    Path(id): Path<Uuid>,
) -> Result<Json<CategoryDetail>, CategoryError> {
    Ok(Json(categories.detail(id).await?))
}

/// create_category
///
/// [Admin Route] Creates a category.
#[utoipa::path(
    post,
    path = "/catalog/category/create",
    request_body = CategoryForm,
    responses(
        (status = 201, description = "Created", body = Category),
        (status = 422, description = "Rejected submission", body = ValidationFailure)
    )
)]
pub async fn create_category(
    State(categories): State<CategoryService>,
    Json(payload): Json<CategoryForm>,
) -> Result<impl IntoResponse, CategoryError> {
    let category = categories.create(payload).await?;
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, category.url())],
        Json(category),
    ))
}

/// get_category_update_form
///
/// [Public Route] The stored category, to pre-fill the update form.
#[utoipa::path(
    get,
    path = "/catalog/category/{id}/update",
    params(("id" = Uuid, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Found", body = Category),
        (status = 404, description = "Not Found", body = ErrorBody)
    )
)]
pub async fn get_category_update_form(
    State(categories): State<CategoryService>,
    Path(id): Path<Uuid>,
) -> Result<Json<models::Category>, CategoryError> {
    Ok(Json(categories.get(id).await?))
}

/// update_category
///
/// [Admin Route] Overwrites a category.
#[utoipa::path(
    post,
    path = "/catalog/category/{id}/update",
    params(("id" = Uuid, Path, description = "Category ID")),
    request_body = CategoryForm,
    responses(
        (status = 200, description = "Updated", body = Category),
        (status = 404, description = "Not Found", body = ErrorBody),
        (status = 422, description = "Rejected submission", body = ValidationFailure)
    )
)]
pub async fn update_category(
    State(categories): State<CategoryService>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CategoryForm>,
) -> Result<impl IntoResponse, CategoryError> {
    let category = categories.update(id, payload).await?;
    Ok(([(header::LOCATION, category.url())], Json(category)))
}

/// get_category_delete_plan
///
/// [Public Route] Previews a category delete: items that would lose the
/// reference and items that would block it.
#[utoipa::path(
    get,
    path = "/catalog/category/{id}/delete",
    params(("id" = Uuid, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Delete plan", body = CategoryDeletePlan),
        (status = 404, description = "Not Found", body = ErrorBody)
    )
)]
pub async fn get_category_delete_plan(
    State(categories): State<CategoryService>,
    Path(id): Path<Uuid>,
) -> Result<Json<CategoryDeletePlan>, CategoryError> {
    Ok(Json(categories.delete_plan(id).await?))
}

/// delete_category
///
/// [Admin Route] Deletes a category, first stripping it from every item that
/// also belongs elsewhere.
///
/// *Blocking*: refused with 409 while any item has this as its only category.
#[utoipa::path(
    post,
    path = "/catalog/category/{id}/delete",
    params(("id" = Uuid, Path, description = "Category ID")),
    request_body = DeleteForm,
    responses(
        (status = 200, description = "Deleted", body = Deleted),
        (status = 404, description = "Not Found", body = ErrorBody),
        (status = 409, description = "Items would be left without a category", body = BlockedBody),
        (status = 422, description = "Incorrect password", body = ValidationFailure)
    )
)]
pub async fn delete_category(
    State(categories): State<CategoryService>,
    Path(id): Path<Uuid>,
    Json(payload): Json<DeleteForm>,
) -> Result<Json<Deleted>, CategoryError> {
    categories.delete(id, payload).await?;
    Ok(Json(Deleted {
        id,
        next: "/catalog/categories".to_string(),
    }))
}
