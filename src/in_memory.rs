use std::{
    collections::HashMap,
    sync::atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    models::{Category, CategoryFields, EntityKind, Item, ItemFields},
    repository::{
        CategoryFilter, ItemFilter, RepoResult, Repository, RepositoryError, canonical_categories,
    },
};

/// InMemoryRepository
///
/// `Repository` over two hash maps behind a `tokio` `RwLock`. Used when the
/// service runs locally without `DATABASE_URL`, and as the storage of the
/// service and handler tests.
///
/// Every save/delete call (successful or not) bumps a write counter so tests
/// can assert that a rejected operation never reached storage.
#[derive(Default)]
pub struct InMemoryRepository {
    store: RwLock<Store>,
    writes: AtomicUsize,
}

#[derive(Default)]
struct Store {
    categories: HashMap<Uuid, Category>,
    items: HashMap<Uuid, Item>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of save/delete calls received so far.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

fn sorted_categories(mut categories: Vec<Category>) -> Vec<Category> {
    categories.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
    categories
}

fn sorted_items(mut items: Vec<Item>) -> Vec<Item> {
    items.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
    items
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn list_categories(&self) -> RepoResult<Vec<Category>> {
        let store = self.store.read().await;
        Ok(sorted_categories(store.categories.values().cloned().collect()))
    }

    async fn find_category(&self, id: Uuid) -> RepoResult<Option<Category>> {
        Ok(self.store.read().await.categories.get(&id).cloned())
    }

    async fn find_categories(&self, filter: CategoryFilter) -> RepoResult<Vec<Category>> {
        let CategoryFilter::Ids(ids) = filter;
        let store = self.store.read().await;
        Ok(sorted_categories(
            ids.iter()
                .filter_map(|id| store.categories.get(id).cloned())
                .collect(),
        ))
    }

    async fn save_category(
        &self,
        id: Option<Uuid>,
        fields: CategoryFields,
    ) -> RepoResult<Category> {
        self.record_write();
        let mut store = self.store.write().await;
        let now = Utc::now();
        let category = match id {
            None => Category {
                id: Uuid::new_v4(),
                name: fields.name,
                description: fields.description,
                created_at: now,
                updated_at: now,
            },
            Some(id) => {
                let existing = store.categories.get(&id).ok_or(RepositoryError::NotFound {
                    kind: EntityKind::Category,
                    id,
                })?;
                Category {
                    id,
                    name: fields.name,
                    description: fields.description,
                    created_at: existing.created_at,
                    updated_at: now,
                }
            }
        };
        store.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn delete_category(&self, id: Uuid) -> RepoResult<()> {
        self.record_write();
        self.store
            .write()
            .await
            .categories
            .remove(&id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound {
                kind: EntityKind::Category,
                id,
            })
    }

    async fn list_items(&self) -> RepoResult<Vec<Item>> {
        let store = self.store.read().await;
        Ok(sorted_items(store.items.values().cloned().collect()))
    }

    async fn find_item(&self, id: Uuid) -> RepoResult<Option<Item>> {
        Ok(self.store.read().await.items.get(&id).cloned())
    }

    async fn find_items(&self, filter: ItemFilter) -> RepoResult<Vec<Item>> {
        let ItemFilter::InCategory(category) = filter;
        let store = self.store.read().await;
        Ok(sorted_items(
            store
                .items
                .values()
                .filter(|item| item.references(category))
                .cloned()
                .collect(),
        ))
    }

    async fn save_item(&self, id: Option<Uuid>, fields: ItemFields) -> RepoResult<Item> {
        self.record_write();
        let mut store = self.store.write().await;
        let now = Utc::now();
        let (id, created_at) = match id {
            None => (Uuid::new_v4(), now),
            Some(id) => {
                let existing = store.items.get(&id).ok_or(RepositoryError::NotFound {
                    kind: EntityKind::Item,
                    id,
                })?;
                (id, existing.created_at)
            }
        };
        let item = Item {
            id,
            name: fields.name,
            description: fields.description,
            price: fields.price,
            stock: fields.stock,
            categories: canonical_categories(fields.categories),
            image: fields.image,
            created_at,
            updated_at: now,
        };
        store.items.insert(id, item.clone());
        Ok(item)
    }

    async fn delete_item(&self, id: Uuid) -> RepoResult<()> {
        self.record_write();
        self.store
            .write()
            .await
            .items
            .remove(&id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound {
                kind: EntityKind::Item,
                id,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category_fields(name: &str) -> CategoryFields {
        CategoryFields {
            name: name.to_string(),
            description: format!("a category for {} items", name),
        }
    }

    #[tokio::test]
    async fn categories_list_in_byte_order() {
        let repo = InMemoryRepository::new();
        for name in ["apple", "Zebra", "Mango", "banana"] {
            repo.save_category(None, category_fields(name)).await.unwrap();
        }

        let names: Vec<String> = repo
            .list_categories()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();

        assert_eq!(names, vec!["Mango", "Zebra", "apple", "banana"]);
    }

    #[tokio::test]
    async fn update_keeps_identity_and_creation_time() {
        let repo = InMemoryRepository::new();
        let created = repo.save_category(None, category_fields("Toys")).await.unwrap();

        let updated = repo
            .save_category(Some(created.id), category_fields("Games"))
            .await
            .unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(updated.name, "Games");
        assert_eq!(repo.list_categories().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn missing_rows_report_not_found() {
        let repo = InMemoryRepository::new();
        let id = Uuid::new_v4();

        let err = repo
            .save_category(Some(id), category_fields("Ghost"))
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
        assert_eq!(repo.writes(), 2);
    }

    #[tokio::test]
    async fn items_filter_by_category() {
        let repo = InMemoryRepository::new();
        let a = repo.save_category(None, category_fields("A")).await.unwrap();
        let b = repo.save_category(None, category_fields("B")).await.unwrap();
        let fields = |name: &str, mut categories: Vec<Uuid>| {
            categories.sort();
            ItemFields {
                name: name.to_string(),
                description: "desc".to_string(),
                price: 1.0,
                stock: 1,
                categories,
                image: crate::models::PLACEHOLDER_IMAGE.to_string(),
            }
        };
        repo.save_item(None, fields("Only A", vec![a.id])).await.unwrap();
        repo.save_item(None, fields("Both", vec![a.id, b.id])).await.unwrap();

        let in_a = repo.find_items(ItemFilter::InCategory(a.id)).await.unwrap();
        let in_b = repo.find_items(ItemFilter::InCategory(b.id)).await.unwrap();

        assert_eq!(in_a.len(), 2);
        assert_eq!(in_a[0].name, "Both");
        assert_eq!(in_b.len(), 1);
    }

    #[tokio::test]
    async fn items_are_found_whatever_the_submitted_category_order() {
        let repo = InMemoryRepository::new();
        let mut ids = Vec::new();
        for name in ["A", "B", "C", "D", "E"] {
            ids.push(repo.save_category(None, category_fields(name)).await.unwrap().id);
        }
        ids.sort();
        let mut descending = ids.clone();
        descending.reverse();
        descending.push(ids[0]);

        let saved = repo
            .save_item(
                None,
                ItemFields {
                    name: "Everywhere".to_string(),
                    description: "desc".to_string(),
                    price: 1.0,
                    stock: 1,
                    categories: descending,
                    image: crate::models::PLACEHOLDER_IMAGE.to_string(),
                },
            )
            .await
            .unwrap();

        assert_eq!(saved.categories, ids);
        for id in ids {
            let found = repo.find_items(ItemFilter::InCategory(id)).await.unwrap();
            assert_eq!(found, vec![saved.clone()]);
        }
    }

    #[tokio::test]
    async fn find_categories_skips_unknown_ids() {
        let repo = InMemoryRepository::new();
        let a = repo.save_category(None, category_fields("A")).await.unwrap();
        let found = repo
            .find_categories(CategoryFilter::Ids(vec![a.id, Uuid::new_v4()]))
            .await
            .unwrap();
        assert_eq!(found, vec![a]);
    }
}
