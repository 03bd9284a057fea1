use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    models::{Category, Item},
    repository::RepositoryError,
    validation::ValidationFailure,
};

/// CategoryError
///
/// Every way a category operation can end other than success. Only
/// `Repository` is an infrastructure fault; the rest are outcomes the caller
/// is expected to match on.
#[derive(Debug, Error)]
pub enum CategoryError {
    #[error("category submission rejected")]
    Invalid(ValidationFailure),

    #[error("category {0} not found")]
    NotFound(Uuid),

    #[error("category {} still has {} item(s) with no other category", .category.id, .dangling.len())]
    Blocked {
        category: Category,
        dangling: Vec<Item>,
    },

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

pub type CategoryResult<T> = Result<T, CategoryError>;

/// ItemError
#[derive(Debug, Error)]
pub enum ItemError {
    #[error("item submission rejected")]
    Invalid(ValidationFailure),

    #[error("item {0} not found")]
    NotFound(Uuid),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

pub type ItemResult<T> = Result<T, ItemError>;

/// ErrorBody
///
/// JSON body for 404 and 500 responses.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
}

/// BlockedBody
///
/// JSON body for a refused category delete: the Items that would be left
/// without any category.
#[derive(Debug, Serialize, ToSchema)]
pub struct BlockedBody {
    pub error: String,
    pub category: Category,
    pub dangling: Vec<Item>,
}

fn not_found(message: String) -> Response {
    (StatusCode::NOT_FOUND, Json(ErrorBody { error: message })).into_response()
}

/// The fault detail is logged; the client only gets a generic message.
fn internal(err: RepositoryError) -> Response {
    tracing::error!("repository failure: {}", err);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody {
            error: "Internal server error".to_string(),
        }),
    )
        .into_response()
}

impl IntoResponse for CategoryError {
    fn into_response(self) -> Response {
        match self {
            CategoryError::Invalid(failure) => {
                (StatusCode::UNPROCESSABLE_ENTITY, Json(failure)).into_response()
            }
            CategoryError::NotFound(id) => not_found(format!("Category {} not found", id)),
            CategoryError::Blocked { category, dangling } => (
                StatusCode::CONFLICT,
                Json(BlockedBody {
                    error: format!(
                        "Delete or recategorize these items before deleting '{}'",
                        category.name
                    ),
                    category,
                    dangling,
                }),
            )
                .into_response(),
            CategoryError::Repository(err) => internal(err),
        }
    }
}

impl IntoResponse for ItemError {
    fn into_response(self) -> Response {
        match self {
            ItemError::Invalid(failure) => {
                (StatusCode::UNPROCESSABLE_ENTITY, Json(failure)).into_response()
            }
            ItemError::NotFound(id) => not_found(format!("Item {} not found", id)),
            ItemError::Repository(err) => internal(err),
        }
    }
}
