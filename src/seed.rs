use thiserror::Error;

use crate::{
    error::{CategoryError, ItemError},
    models::{CategoryForm, CategoryRefs, ItemForm},
    services::{CategoryService, ItemService},
};

/// The demo categories, in creation order.
pub const DEMO_CATEGORIES: [&str; 8] = [
    "Furniture",
    "Electronics",
    "Clothing",
    "Toys",
    "Books",
    "Tools",
    "Appliances",
    "Other",
];

/// (name, description, indexes into `DEMO_CATEGORIES`, price, stock)
const DEMO_ITEMS: [(&str, &str, [usize; 2], u32, u32); 17] = [
    ("Chair", "A comfortable chair", [0, 2], 150, 8),
    ("Table", "A sturdy table", [0, 3], 250, 4),
    ("Couch", "A comfy couch", [0, 3], 350, 1),
    ("Lamp", "A bright lamp", [0, 4], 60, 15),
    ("TV", "A big TV", [1, 4], 600, 2),
    ("Radio", "A small radio", [1, 5], 60, 8),
    ("Computer", "A fast computer", [1, 5], 1200, 1),
    ("Phone", "A smart phone", [1, 6], 600, 4),
    ("Shirt", "A nice shirt", [2, 7], 60, 8),
    ("Pants", "A nice pair of pants", [2, 7], 60, 8),
    ("Dress", "A nice dress", [2, 7], 60, 8),
    ("Hat", "A nice hat", [2, 7], 60, 8),
    ("Socks", "A nice pair of socks", [2, 7], 60, 8),
    ("Shoes", "A nice pair of shoes", [2, 7], 60, 8),
    ("Ball", "A nice ball", [3, 7], 60, 8),
    ("Doll", "A nice doll", [3, 7], 60, 8),
    ("Truck", "A nice truck", [3, 7], 60, 8),
];

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("seeding categories failed: {0}")]
    Category(#[from] CategoryError),

    #[error("seeding items failed: {0}")]
    Item(#[from] ItemError),
}

/// SeedSummary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub categories: usize,
    pub items: usize,
}

/// populate
///
/// Creates the demo catalog through the regular services, so every record
/// passes the same validation and admin check as a user submission. Does
/// not clear anything first.
pub async fn populate(
    categories: &CategoryService,
    items: &ItemService,
    password: &str,
) -> Result<SeedSummary, SeedError> {
    let mut ids = Vec::with_capacity(DEMO_CATEGORIES.len());
    for name in DEMO_CATEGORIES {
        let category = categories
            .create(CategoryForm {
                name: name.to_string(),
                description: format!("a category for {} items", name),
                password: password.to_string(),
            })
            .await?;
        tracing::debug!(%name, "added category");
        ids.push(category.id);
    }

    for (name, description, picks, price, stock) in DEMO_ITEMS {
        items
            .create(ItemForm {
                name: name.to_string(),
                description: description.to_string(),
                price: price.to_string(),
                stock: stock.to_string(),
                categories: Some(CategoryRefs::Many(
                    picks.iter().map(|i| ids[*i].to_string()).collect(),
                )),
                image: None,
                password: password.to_string(),
            })
            .await?;
        tracing::debug!(%name, "added item");
    }

    let summary = SeedSummary {
        categories: ids.len(),
        items: DEMO_ITEMS.len(),
    };
    tracing::info!(
        categories = summary.categories,
        items = summary.items,
        "demo catalog seeded"
    );
    Ok(summary)
}
