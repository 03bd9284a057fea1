use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

/// Image used when an Item is submitted without one.
pub const PLACEHOLDER_IMAGE: &str = "https://placehold.co/800x600/343434/fff/png";

// --- Persisted Entities ---

/// Category
///
/// A named grouping of Items, stored in the `categories` table.
/// Items point at Categories (never the other way round), so a Category row
/// carries no reference list of its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[ts(export)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

impl Category {
    /// Canonical reference path, derived from the id.
    pub fn url(&self) -> String {
        category_url(self.id)
    }
}

/// Item
///
/// A catalog entry from the `items` table.
///
/// `categories` is kept sorted and de-duplicated, and is never empty for a
/// persisted Item: every entry must name an existing Category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[ts(export)]
pub struct Item {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub stock: i32,
    pub categories: Vec<Uuid>,
    pub image: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

impl Item {
    pub fn url(&self) -> String {
        item_url(self.id)
    }

    pub fn references(&self, category: Uuid) -> bool {
        self.categories.contains(&category)
    }
}

pub fn category_url(id: Uuid) -> String {
    format!("/catalog/category/{}", id)
}

pub fn item_url(id: Uuid) -> String {
    format!("/catalog/item/{}", id)
}

/// EntityKind
///
/// Names the two persisted object kinds, used when a repository reports
/// a missing row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Category,
    Item,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Category => f.write_str("category"),
            EntityKind::Item => f.write_str("item"),
        }
    }
}

// --- Validated Field Sets (Repository Input) ---

/// CategoryFields
///
/// The fully validated, trimmed values of a Category. The repository only
/// accepts this type, so nothing half-checked can reach storage.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryFields {
    pub name: String,
    pub description: String,
}

/// ItemFields
///
/// The fully validated values of an Item. `categories` is normalized by the
/// pipeline; `ItemService` checks it is non-empty and fully resolvable before
/// handing the set to the repository.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemFields {
    pub name: String,
    pub description: String,
    pub price: f64,
    pub stock: i32,
    pub categories: Vec<Uuid>,
    pub image: String,
}

impl ItemFields {
    /// Copies the stored values of `item` minus one category reference.
    /// Used by the category delete cascade.
    pub fn without_category(item: &Item, category: Uuid) -> Self {
        Self {
            name: item.name.clone(),
            description: item.description.clone(),
            price: item.price,
            stock: item.stock,
            categories: item
                .categories
                .iter()
                .copied()
                .filter(|id| *id != category)
                .collect(),
            image: item.image.clone(),
        }
    }
}

// --- Form Submissions (Input Schemas) ---

/// CategoryForm
///
/// Payload for category create/update. Values are kept exactly as typed so a
/// rejected submission can be shown back to the user unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CategoryForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Admin credential. Never echoed back.
    #[serde(default, skip_serializing)]
    pub password: String,
}

/// CategoryRefs
///
/// The `categories` field of an item form as it arrives: a lone value when a
/// single checkbox is ticked, or a list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum CategoryRefs {
    One(String),
    Many(Vec<String>),
}

impl CategoryRefs {
    pub fn values(&self) -> &[String] {
        match self {
            CategoryRefs::One(value) => std::slice::from_ref(value),
            CategoryRefs::Many(values) => values,
        }
    }
}

/// ItemForm
///
/// Payload for item create/update. `price` and `stock` stay text until the
/// validation pipeline parses them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ItemForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "text_or_number")]
    pub price: String,
    #[serde(default, deserialize_with = "text_or_number")]
    pub stock: String,
    #[serde(default, alias = "category", skip_serializing_if = "Option::is_none")]
    pub categories: Option<CategoryRefs>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing)]
    pub password: String,
}

/// Accepts `"12"` as well as `12`, keeping the value as text for the pipeline.
/// `null` and booleans become empty text so the pipeline reports the field as
/// required instead of the whole body failing to parse.
fn text_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Whole(i64),
        Huge(u64),
        Number(f64),
        Flag(bool),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Text(text)) => text,
        Some(Raw::Whole(n)) => n.to_string(),
        Some(Raw::Huge(n)) => n.to_string(),
        Some(Raw::Number(n)) => n.to_string(),
        Some(Raw::Flag(_)) | None => String::new(),
    })
}

/// DeleteForm
///
/// Confirmation payload for deletes; carries only the admin credential.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DeleteForm {
    #[serde(default, skip_serializing)]
    pub password: String,
}

// --- Read Models (Output Schemas) ---

/// CategoryDetail
///
/// A Category together with every Item that references it.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CategoryDetail {
    pub category: Category,
    pub items: Vec<Item>,
}

/// CategoryDeletePlan
///
/// Preview of a category delete: `affected` Items lose the reference,
/// `dangling` Items would be left with no category and block the delete.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CategoryDeletePlan {
    pub category: Category,
    pub affected: Vec<Item>,
    pub dangling: Vec<Item>,
}

impl CategoryDeletePlan {
    pub fn new(category: Category, items: Vec<Item>) -> Self {
        let (dangling, affected) = items
            .into_iter()
            .partition(|item| item.categories.iter().all(|id| *id == category.id));
        Self {
            category,
            affected,
            dangling,
        }
    }

    pub fn is_blocked(&self) -> bool {
        !self.dangling.is_empty()
    }
}

/// ItemDetail
///
/// An Item with its category references resolved to full Categories.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ItemDetail {
    pub item: Item,
    pub categories: Vec<Category>,
}

/// CategoryOption
///
/// One checkbox of the item form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CategoryOption {
    pub category: Category,
    pub selected: bool,
}

/// ItemFormView
///
/// View model for the item create/update form: every Category, each flagged
/// `selected` when the edited Item references it. Built fresh per request and
/// never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ItemFormView {
    pub categories: Vec<CategoryOption>,
}

impl ItemFormView {
    pub fn project(categories: Vec<Category>, selected: &[Uuid]) -> Self {
        let categories = categories
            .into_iter()
            .map(|category| CategoryOption {
                selected: selected.contains(&category.id),
                category,
            })
            .collect();
        Self { categories }
    }
}

/// ItemEditView
///
/// Pre-filled state for the item update form.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ItemEditView {
    pub item: Item,
    pub form: ItemFormView,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(name: &str) -> Category {
        let now = Utc::now();
        Category {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: format!("a category for {} items", name),
            created_at: now,
            updated_at: now,
        }
    }

    fn item_in(categories: &[Uuid]) -> Item {
        let now = Utc::now();
        let mut categories = categories.to_vec();
        categories.sort();
        Item {
            id: Uuid::new_v4(),
            name: "Chair".to_string(),
            description: "A comfortable chair".to_string(),
            price: 150.0,
            stock: 8,
            categories,
            image: PLACEHOLDER_IMAGE.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn urls_are_derived_from_ids() {
        let c = category("Books");
        assert_eq!(c.url(), format!("/catalog/category/{}", c.id));
        let i = item_in(&[c.id]);
        assert_eq!(i.url(), format!("/catalog/item/{}", i.id));
    }

    #[test]
    fn form_view_selects_exactly_the_referenced_categories() {
        let a = category("Books");
        let b = category("Tools");
        let c = category("Toys");
        let item = item_in(&[a.id, c.id]);

        let view = ItemFormView::project(vec![a.clone(), b.clone(), c.clone()], &item.categories);

        let flags: Vec<(String, bool)> = view
            .categories
            .iter()
            .map(|o| (o.category.name.clone(), o.selected))
            .collect();
        assert_eq!(
            flags,
            vec![
                ("Books".to_string(), true),
                ("Tools".to_string(), false),
                ("Toys".to_string(), true),
            ]
        );
    }

    #[test]
    fn form_view_without_item_selects_nothing() {
        let view = ItemFormView::project(vec![category("Books"), category("Toys")], &[]);
        assert!(view.categories.iter().all(|o| !o.selected));
        assert_eq!(view.categories.len(), 2);
    }

    #[test]
    fn without_category_strips_only_that_reference() {
        let c = Uuid::new_v4();
        let d = Uuid::new_v4();
        let item = item_in(&[c, d]);
        let fields = ItemFields::without_category(&item, c);
        assert_eq!(fields.categories, vec![d]);
        assert_eq!(fields.name, item.name);
        assert_eq!(fields.price, item.price);
    }

    #[test]
    fn delete_plan_separates_dangling_items() {
        let c = category("Other");
        let d = Uuid::new_v4();
        let only_c = item_in(&[c.id]);
        let c_and_d = item_in(&[c.id, d]);

        let plan = CategoryDeletePlan::new(c, vec![only_c.clone(), c_and_d.clone()]);

        assert!(plan.is_blocked());
        assert_eq!(plan.dangling, vec![only_c]);
        assert_eq!(plan.affected, vec![c_and_d]);
    }

    #[test]
    fn item_form_accepts_single_or_many_category_values() {
        let single: ItemForm = serde_json::from_str(r#"{"category": "abc"}"#).unwrap();
        assert_eq!(single.categories, Some(CategoryRefs::One("abc".to_string())));

        let many: ItemForm = serde_json::from_str(r#"{"categories": ["a", "b"]}"#).unwrap();
        assert_eq!(
            many.categories.as_ref().map(CategoryRefs::values),
            Some(&["a".to_string(), "b".to_string()][..])
        );

        let absent: ItemForm = serde_json::from_str(r#"{"name": "Lamp"}"#).unwrap();
        assert!(absent.categories.is_none());
    }

    #[test]
    fn item_form_accepts_numbers_as_text() {
        let form: ItemForm = serde_json::from_str(r#"{"price": 19.5, "stock": 3}"#).unwrap();
        assert_eq!(form.price, "19.5");
        assert_eq!(form.stock, "3");

        let typed: ItemForm = serde_json::from_str(r#"{"price": "abc"}"#).unwrap();
        assert_eq!(typed.price, "abc");
    }

    #[test]
    fn item_form_reads_null_and_flags_as_blank() {
        let form: ItemForm =
            serde_json::from_str(r#"{"name": "Lamp", "price": null, "stock": true}"#).unwrap();
        assert_eq!(form.name, "Lamp");
        assert!(form.price.is_empty());
        assert!(form.stock.is_empty());

        let huge: ItemForm = serde_json::from_str(r#"{"stock": 18446744073709551615}"#).unwrap();
        assert_eq!(huge.stock, "18446744073709551615");
    }

    #[test]
    fn references_ignores_list_order() {
        let ids: Vec<Uuid> = (0..5).map(|_| Uuid::new_v4()).collect();
        let mut item = item_in(&ids);
        item.categories.reverse();
        for id in &ids {
            assert!(item.references(*id));
        }
        assert!(!item.references(Uuid::new_v4()));
    }

    #[test]
    fn password_is_never_serialized() {
        let form = CategoryForm {
            name: "Books".to_string(),
            description: "Reading".to_string(),
            password: "hunter2".to_string(),
        };
        let json = serde_json::to_string(&form).unwrap();
        assert!(!json.contains("hunter2"));
        assert!(!json.contains("password"));
    }
}
