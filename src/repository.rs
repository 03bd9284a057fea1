use crate::models::{Category, CategoryFields, EntityKind, Item, ItemFields};
use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// RepositoryError
///
/// A missing row is reported separately from a storage fault so the services
/// can turn the former into a `NotFound` outcome and let only the latter
/// propagate as an infrastructure failure.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: Uuid },

    #[error("database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        RepositoryError::Database(err.to_string())
    }
}

pub type RepoResult<T> = Result<T, RepositoryError>;

/// CategoryFilter
#[derive(Debug, Clone, PartialEq)]
pub enum CategoryFilter {
    /// Categories whose id is in the list. Unknown ids are simply absent from
    /// the result.
    Ids(Vec<Uuid>),
}

/// ItemFilter
#[derive(Debug, Clone, PartialEq)]
pub enum ItemFilter {
    /// Items whose `categories` contains the id.
    InCategory(Uuid),
}

/// Repository Trait
///
/// The persistence contract the catalog services depend on. Implementations
/// (Postgres, in-memory) guarantee per-call write atomicity and nothing more;
/// multi-entity sequencing is the services' job.
///
/// Listings are ordered by `name` compared byte-wise (so "Zebra" sorts before
/// "apple"), ties broken by id.
///
/// **Send + Sync + async_trait** are required to share the trait object
/// (`Arc<dyn Repository>`) across Axum's task boundaries.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Categories ---
    async fn list_categories(&self) -> RepoResult<Vec<Category>>;
    async fn find_category(&self, id: Uuid) -> RepoResult<Option<Category>>;
    async fn find_categories(&self, filter: CategoryFilter) -> RepoResult<Vec<Category>>;
    /// `None` inserts under a fresh id; `Some(id)` overwrites every field of an
    /// existing row and fails with `NotFound` if there is none.
    async fn save_category(&self, id: Option<Uuid>, fields: CategoryFields)
    -> RepoResult<Category>;
    async fn delete_category(&self, id: Uuid) -> RepoResult<()>;

    // --- Items ---
    async fn list_items(&self) -> RepoResult<Vec<Item>>;
    async fn find_item(&self, id: Uuid) -> RepoResult<Option<Item>>;
    async fn find_items(&self, filter: ItemFilter) -> RepoResult<Vec<Item>>;
    /// Same semantics as `save_category`. `categories` is stored sorted and
    /// without duplicates, whatever order the caller supplied.
    async fn save_item(&self, id: Option<Uuid>, fields: ItemFields) -> RepoResult<Item>;
    async fn delete_item(&self, id: Uuid) -> RepoResult<()>;
}

/// Sorted, duplicate-free form in which every backend stores an Item's
/// category list.
pub(crate) fn canonical_categories(mut categories: Vec<Uuid>) -> Vec<Uuid> {
    categories.sort();
    categories.dedup();
    categories
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// `Repository` backed by PostgreSQL. Item category references live in a
/// `UUID[]` column (see `migrations/`), so the "every reference exists" rule
/// cannot be a foreign key and is enforced by the services instead.
pub struct PostgresRepository {
    pool: PgPool,
}

const CATEGORY_COLUMNS: &str = "id, name, description, created_at, updated_at";
const ITEM_COLUMNS: &str =
    "id, name, description, price, stock, categories, image, created_at, updated_at";

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// clear
    ///
    /// Empties both tables. Only used by the seed binary before repopulating.
    pub async fn clear(&self) -> RepoResult<()> {
        sqlx::query("TRUNCATE items, categories")
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn list_categories(&self) -> RepoResult<Vec<Category>> {
        let sql = format!(
            r#"SELECT {CATEGORY_COLUMNS} FROM categories ORDER BY name COLLATE "C", id"#
        );
        let categories = sqlx::query_as::<_, Category>(&sql)
            .fetch_all(&self.pool)
            .await
            .inspect_err(|e| tracing::error!("list_categories error: {:?}", e))?;
        Ok(categories)
    }

    async fn find_category(&self, id: Uuid) -> RepoResult<Option<Category>> {
        let sql = format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = $1");
        let category = sqlx::query_as::<_, Category>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .inspect_err(|e| tracing::error!("find_category error: {:?}", e))?;
        Ok(category)
    }

    async fn find_categories(&self, filter: CategoryFilter) -> RepoResult<Vec<Category>> {
        let CategoryFilter::Ids(ids) = filter;
        let sql = format!(
            r#"SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = ANY($1) ORDER BY name COLLATE "C", id"#
        );
        let categories = sqlx::query_as::<_, Category>(&sql)
            .bind(ids)
            .fetch_all(&self.pool)
            .await
            .inspect_err(|e| tracing::error!("find_categories error: {:?}", e))?;
        Ok(categories)
    }

    /// save_category
    ///
    /// INSERT for a new row, UPDATE ... RETURNING for an existing one. An
    /// UPDATE matching no row is reported as `NotFound`.
    async fn save_category(
        &self,
        id: Option<Uuid>,
        fields: CategoryFields,
    ) -> RepoResult<Category> {
        match id {
            None => {
                let sql = format!(
                    "INSERT INTO categories (id, name, description, created_at, updated_at) \
                     VALUES ($1, $2, $3, NOW(), NOW()) RETURNING {CATEGORY_COLUMNS}"
                );
                let category = sqlx::query_as::<_, Category>(&sql)
                    .bind(Uuid::new_v4())
                    .bind(fields.name)
                    .bind(fields.description)
                    .fetch_one(&self.pool)
                    .await
                    .inspect_err(|e| tracing::error!("insert category error: {:?}", e))?;
                Ok(category)
            }
            Some(id) => {
                let sql = format!(
                    "UPDATE categories SET name = $2, description = $3, updated_at = NOW() \
                     WHERE id = $1 RETURNING {CATEGORY_COLUMNS}"
                );
                sqlx::query_as::<_, Category>(&sql)
                    .bind(id)
                    .bind(fields.name)
                    .bind(fields.description)
                    .fetch_optional(&self.pool)
                    .await
                    .inspect_err(|e| tracing::error!("update category error: {:?}", e))?
                    .ok_or(RepositoryError::NotFound {
                        kind: EntityKind::Category,
                        id,
                    })
            }
        }
    }

    async fn delete_category(&self, id: Uuid) -> RepoResult<()> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .inspect_err(|e| tracing::error!("delete category error: {:?}", e))?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound {
                kind: EntityKind::Category,
                id,
            });
        }
        Ok(())
    }

    async fn list_items(&self) -> RepoResult<Vec<Item>> {
        let sql = format!(r#"SELECT {ITEM_COLUMNS} FROM items ORDER BY name COLLATE "C", id"#);
        let items = sqlx::query_as::<_, Item>(&sql)
            .fetch_all(&self.pool)
            .await
            .inspect_err(|e| tracing::error!("list_items error: {:?}", e))?;
        Ok(items)
    }

    async fn find_item(&self, id: Uuid) -> RepoResult<Option<Item>> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = $1");
        let item = sqlx::query_as::<_, Item>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .inspect_err(|e| tracing::error!("find_item error: {:?}", e))?;
        Ok(item)
    }

    /// find_items
    ///
    /// `InCategory` uses array containment (`@>`), which the GIN index on the
    /// array column serves.
    async fn find_items(&self, filter: ItemFilter) -> RepoResult<Vec<Item>> {
        let ItemFilter::InCategory(category) = filter;
        let sql = format!(
            r#"SELECT {ITEM_COLUMNS} FROM items WHERE categories @> ARRAY[$1]::uuid[] ORDER BY name COLLATE "C", id"#
        );
        let items = sqlx::query_as::<_, Item>(&sql)
            .bind(category)
            .fetch_all(&self.pool)
            .await
            .inspect_err(|e| tracing::error!("find_items error: {:?}", e))?;
        Ok(items)
    }

    async fn save_item(&self, id: Option<Uuid>, fields: ItemFields) -> RepoResult<Item> {
        let categories = canonical_categories(fields.categories);
        match id {
            None => {
                let sql = format!(
                    "INSERT INTO items (id, name, description, price, stock, categories, image, created_at, updated_at) \
                     VALUES ($1, $2, $3, $4, $5, $6, $7, NOW(), NOW()) RETURNING {ITEM_COLUMNS}"
                );
                let item = sqlx::query_as::<_, Item>(&sql)
                    .bind(Uuid::new_v4())
                    .bind(fields.name)
                    .bind(fields.description)
                    .bind(fields.price)
                    .bind(fields.stock)
                    .bind(&categories)
                    .bind(fields.image)
                    .fetch_one(&self.pool)
                    .await
                    .inspect_err(|e| tracing::error!("insert item error: {:?}", e))?;
                Ok(item)
            }
            Some(id) => {
                let sql = format!(
                    "UPDATE items SET name = $2, description = $3, price = $4, stock = $5, \
                     categories = $6, image = $7, updated_at = NOW() \
                     WHERE id = $1 RETURNING {ITEM_COLUMNS}"
                );
                sqlx::query_as::<_, Item>(&sql)
                    .bind(id)
                    .bind(fields.name)
                    .bind(fields.description)
                    .bind(fields.price)
                    .bind(fields.stock)
                    .bind(&categories)
                    .bind(fields.image)
                    .fetch_optional(&self.pool)
                    .await
                    .inspect_err(|e| tracing::error!("update item error: {:?}", e))?
                    .ok_or(RepositoryError::NotFound {
                        kind: EntityKind::Item,
                        id,
                    })
            }
        }
    }

    async fn delete_item(&self, id: Uuid) -> RepoResult<()> {
        let result = sqlx::query("DELETE FROM items WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .inspect_err(|e| tracing::error!("delete item error: {:?}", e))?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound {
                kind: EntityKind::Item,
                id,
            });
        }
        Ok(())
    }
}
