use catalog_manager::{
    models::{CategoryFields, EntityKind, ItemFields, PLACEHOLDER_IMAGE},
    repository::{CategoryFilter, ItemFilter, PostgresRepository, Repository, RepositoryError},
};
use sqlx::PgPool;
use tokio::test;
use uuid::Uuid;

// These run against a live database:
//   DATABASE_URL=postgres://... cargo test -- --ignored
// Records carry a per-test tag so concurrent tests never see each other's rows.

// --- Test Context and Setup ---

struct DbTestContext {
    pool: PgPool,
    tag: String,
}

impl DbTestContext {
    async fn setup() -> Self {
        dotenv::dotenv().ok();

        let db_url = std::env::var("DATABASE_URL")
            .expect("DATABASE_URL must be set to run integration tests");

        let pool = PgPool::connect(&db_url)
            .await
            .expect("Failed to connect to database for integration tests.");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Failed to run database migrations.");

        DbTestContext {
            pool,
            tag: Uuid::new_v4().simple().to_string(),
        }
    }

    fn repository(&self) -> PostgresRepository {
        PostgresRepository::new(self.pool.clone())
    }

    fn category(&self, name: &str) -> CategoryFields {
        CategoryFields {
            name: format!("{} {}", name, self.tag),
            description: format!("a category for {} items", name),
        }
    }

    fn item(&self, name: &str, mut categories: Vec<Uuid>) -> ItemFields {
        categories.sort();
        ItemFields {
            name: format!("{} {}", name, self.tag),
            description: format!("A nice {}", name),
            price: 19.99,
            stock: 3,
            categories,
            image: PLACEHOLDER_IMAGE.to_string(),
        }
    }
}

// --- Tests ---

#[test]
#[ignore = "requires DATABASE_URL"]
async fn test_category_insert_update_delete() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();

    let created = repo.save_category(None, ctx.category("Books")).await.unwrap();
    assert_eq!(
        repo.find_category(created.id).await.unwrap(),
        Some(created.clone())
    );

    let updated = repo
        .save_category(Some(created.id), ctx.category("Novels"))
        .await
        .unwrap();
    assert_eq!(updated.id, created.id);
    assert_eq!(updated.created_at, created.created_at);
    assert!(updated.name.starts_with("Novels"));

    repo.delete_category(created.id).await.unwrap();
    assert!(repo.find_category(created.id).await.unwrap().is_none());
}

#[test]
#[ignore = "requires DATABASE_URL"]
async fn test_missing_rows_are_not_found() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let id = Uuid::new_v4();

    let err = repo
        .save_category(Some(id), ctx.category("Ghost"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RepositoryError::NotFound {
            kind: EntityKind::Category,
            ..
        }
    ));

    let err = repo.delete_item(id).await.unwrap_err();
    assert!(matches!(
        err,
        RepositoryError::NotFound {
            kind: EntityKind::Item,
            ..
        }
    ));
}

#[test]
#[ignore = "requires DATABASE_URL"]
async fn test_listing_is_byte_ordered() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    for name in ["apple", "Zebra", "Mango"] {
        repo.save_category(None, ctx.category(name)).await.unwrap();
    }

    let names: Vec<String> = repo
        .list_categories()
        .await
        .unwrap()
        .into_iter()
        .filter(|c| c.name.ends_with(&ctx.tag))
        .map(|c| c.name.split(' ').next().unwrap_or_default().to_string())
        .collect();

    assert_eq!(names, vec!["Mango", "Zebra", "apple"]);
}

#[test]
#[ignore = "requires DATABASE_URL"]
async fn test_item_category_array_round_trips() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let a = repo.save_category(None, ctx.category("A")).await.unwrap();
    let b = repo.save_category(None, ctx.category("B")).await.unwrap();

    let both = repo.save_item(None, ctx.item("Both", vec![a.id, b.id])).await.unwrap();
    let only_b = repo.save_item(None, ctx.item("OnlyB", vec![b.id])).await.unwrap();

    let in_a = repo.find_items(ItemFilter::InCategory(a.id)).await.unwrap();
    assert_eq!(in_a, vec![both.clone()]);

    let in_b = repo.find_items(ItemFilter::InCategory(b.id)).await.unwrap();
    assert_eq!(in_b.len(), 2);

    let found = repo
        .find_categories(CategoryFilter::Ids(both.categories.clone()))
        .await
        .unwrap();
    assert_eq!(found.len(), 2);

    repo.delete_item(both.id).await.unwrap();
    repo.delete_item(only_b.id).await.unwrap();
    repo.delete_category(a.id).await.unwrap();
    repo.delete_category(b.id).await.unwrap();
}

#[test]
#[ignore = "requires DATABASE_URL"]
async fn test_unsorted_category_list_is_stored_sorted() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let mut ids = Vec::new();
    for name in ["A", "B", "C"] {
        ids.push(repo.save_category(None, ctx.category(name)).await.unwrap().id);
    }
    ids.sort();
    let mut fields = ctx.item("Everywhere", vec![]);
    fields.categories = ids.iter().rev().copied().chain([ids[0]]).collect();

    let saved = repo.save_item(None, fields).await.unwrap();
    assert_eq!(saved.categories, ids);
    for id in &ids {
        let found = repo.find_items(ItemFilter::InCategory(*id)).await.unwrap();
        assert_eq!(found, vec![saved.clone()]);
    }

    repo.delete_item(saved.id).await.unwrap();
    for id in ids {
        repo.delete_category(id).await.unwrap();
    }
}

#[test]
#[ignore = "requires DATABASE_URL"]
async fn test_schema_rejects_negative_stock() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let a = repo.save_category(None, ctx.category("A")).await.unwrap();
    let mut fields = ctx.item("Broken", vec![a.id]);
    fields.stock = -1;

    let err = repo.save_item(None, fields).await.unwrap_err();

    assert!(matches!(err, RepositoryError::Database(_)));
    repo.delete_category(a.id).await.unwrap();
}
