/// Catalog use cases. Handlers call these and never touch the repository
/// directly.
pub mod category;
pub mod item;

pub use category::CategoryService;
pub use item::ItemService;
