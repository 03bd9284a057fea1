use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::AdminGate,
    error::{ItemError, ItemResult},
    models::{DeleteForm, Item, ItemDetail, ItemEditView, ItemFields, ItemForm, ItemFormView},
    repository::{CategoryFilter, RepositoryError, RepositoryState},
    validation::{self, Attempted, FailureKind, Field, FieldError, ValidationFailure},
};

/// ItemService
///
/// Item use cases, plus the category-picker view model for the item forms.
#[derive(Clone)]
pub struct ItemService {
    repo: RepositoryState,
    gate: AdminGate,
}

impl ItemService {
    pub fn new(repo: RepositoryState, gate: AdminGate) -> Self {
        Self { repo, gate }
    }

    /// All items, ascending by name.
    #[instrument(skip(self))]
    pub async fn list(&self) -> ItemResult<Vec<Item>> {
        Ok(self.repo.list_items().await?)
    }

    /// detail
    ///
    /// The Item with its category references resolved, sorted by name.
    #[instrument(skip(self))]
    pub async fn detail(&self, id: Uuid) -> ItemResult<ItemDetail> {
        let item = self.find(id).await?;
        let categories = self
            .repo
            .find_categories(CategoryFilter::Ids(item.categories.clone()))
            .await?;
        Ok(ItemDetail { item, categories })
    }

    #[instrument(skip(self, form), fields(name = %form.name))]
    pub async fn create(&self, form: ItemForm) -> ItemResult<Item> {
        let fields = self.accept(form).await?;
        let item = self.repo.save_item(None, fields).await?;
        tracing::info!(id = %item.id, "item created");
        Ok(item)
    }

    /// update
    ///
    /// Same checks as `create`; the id is preserved and every field is
    /// overwritten.
    #[instrument(skip(self, form))]
    pub async fn update(&self, id: Uuid, form: ItemForm) -> ItemResult<Item> {
        let fields = self.accept(form).await?;
        match self.repo.save_item(Some(id), fields).await {
            Ok(item) => {
                tracing::info!(id = %item.id, "item updated");
                Ok(item)
            }
            Err(RepositoryError::NotFound { .. }) => Err(ItemError::NotFound(id)),
            Err(err) => Err(err.into()),
        }
    }

    /// delete
    ///
    /// Items are leaves: once authorized, removal is unconditional.
    #[instrument(skip(self, form))]
    pub async fn delete(&self, id: Uuid, form: DeleteForm) -> ItemResult<()> {
        if let Err(errors) = validation::validate_confirmation(&form, &self.gate) {
            return Err(ItemError::Invalid(ValidationFailure::new(
                Attempted::Confirmation(form),
                errors,
            )));
        }
        match self.repo.delete_item(id).await {
            Ok(()) => {
                tracing::info!(%id, "item deleted");
                Ok(())
            }
            Err(RepositoryError::NotFound { .. }) => Err(ItemError::NotFound(id)),
            Err(err) => Err(err.into()),
        }
    }

    /// form_view_model
    ///
    /// Every Category as a checkbox, checked when `item` references it. With no
    /// item (the create form) nothing is checked.
    #[instrument(skip(self, item))]
    pub async fn form_view_model(&self, item: Option<&Item>) -> ItemResult<ItemFormView> {
        let selected = item.map(|item| item.categories.as_slice()).unwrap_or(&[]);
        self.form_view_model_for(selected).await
    }

    /// form_view_model_for
    ///
    /// Same projection driven by an explicit selection, used to redisplay a
    /// rejected submission with the user's picks still checked.
    pub async fn form_view_model_for(&self, selected: &[Uuid]) -> ItemResult<ItemFormView> {
        let categories = self.repo.list_categories().await?;
        Ok(ItemFormView::project(categories, selected))
    }

    /// edit_view
    ///
    /// The stored Item together with its pre-checked form.
    #[instrument(skip(self))]
    pub async fn edit_view(&self, id: Uuid) -> ItemResult<ItemEditView> {
        let item = self.find(id).await?;
        let form = self.form_view_model(Some(&item)).await?;
        Ok(ItemEditView { item, form })
    }

    /// Plain lookup, used by the delete confirmation.
    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> ItemResult<Item> {
        self.find(id).await
    }

    async fn find(&self, id: Uuid) -> ItemResult<Item> {
        self.repo
            .find_item(id)
            .await?
            .ok_or(ItemError::NotFound(id))
    }

    /// Runs the pipeline, then requires at least one reference and that every
    /// reference names an existing Category.
    async fn accept(&self, form: ItemForm) -> ItemResult<ItemFields> {
        let refs = validation::normalize_category_refs(form.categories.as_ref());
        let fields = match validation::validate_item(&form, &refs, &self.gate) {
            Ok(fields) => fields,
            Err(errors) => return Err(rejected(form, errors)),
        };

        if fields.categories.is_empty() {
            return Err(rejected(
                form,
                vec![FieldError::new(
                    Field::Categories,
                    FailureKind::NoCategories,
                    "Item category required",
                )],
            ));
        }

        let found = self
            .repo
            .find_categories(CategoryFilter::Ids(fields.categories.clone()))
            .await?;
        let unresolved: Vec<FieldError> = fields
            .categories
            .iter()
            .filter(|id| !found.iter().any(|c| c.id == **id))
            .map(|id| {
                FieldError::new(
                    Field::Categories,
                    FailureKind::UnresolvedCategory,
                    format!("Category {} does not exist", id),
                )
            })
            .collect();
        if !unresolved.is_empty() {
            return Err(rejected(form, unresolved));
        }

        Ok(fields)
    }
}

fn rejected(form: ItemForm, errors: Vec<FieldError>) -> ItemError {
    ItemError::Invalid(ValidationFailure::new(Attempted::Item(form), errors))
}
