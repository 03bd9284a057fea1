use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::AdminGate,
    error::{CategoryError, CategoryResult},
    models::{Category, CategoryDeletePlan, CategoryDetail, CategoryForm, DeleteForm, ItemFields},
    repository::{ItemFilter, RepositoryError, RepositoryState},
    validation::{self, Attempted, ValidationFailure},
};

/// CategoryService
///
/// Category use cases. Every mutation passes the admin gate and the
/// validation pipeline before the repository is touched.
#[derive(Clone)]
pub struct CategoryService {
    repo: RepositoryState,
    gate: AdminGate,
}

impl CategoryService {
    pub fn new(repo: RepositoryState, gate: AdminGate) -> Self {
        Self { repo, gate }
    }

    /// All categories, ascending by name.
    #[instrument(skip(self))]
    pub async fn list(&self) -> CategoryResult<Vec<Category>> {
        Ok(self.repo.list_categories().await?)
    }

    /// detail
    ///
    /// The Category and the Items referencing it, read concurrently.
    #[instrument(skip(self))]
    pub async fn detail(&self, id: Uuid) -> CategoryResult<CategoryDetail> {
        let (category, items) = tokio::try_join!(
            self.repo.find_category(id),
            self.repo.find_items(ItemFilter::InCategory(id)),
        )?;
        let category = category.ok_or(CategoryError::NotFound(id))?;
        Ok(CategoryDetail { category, items })
    }

    /// Plain lookup, used to pre-fill the update form.
    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> CategoryResult<Category> {
        self.repo
            .find_category(id)
            .await?
            .ok_or(CategoryError::NotFound(id))
    }

    #[instrument(skip(self, form), fields(name = %form.name))]
    pub async fn create(&self, form: CategoryForm) -> CategoryResult<Category> {
        let fields = match validation::validate_category(&form, &self.gate) {
            Ok(fields) => fields,
            Err(errors) => return Err(rejected(form, errors)),
        };
        let category = self.repo.save_category(None, fields).await?;
        tracing::info!(id = %category.id, "category created");
        Ok(category)
    }

    /// update
    ///
    /// Overwrites every field of an existing Category; the id is preserved.
    #[instrument(skip(self, form))]
    pub async fn update(&self, id: Uuid, form: CategoryForm) -> CategoryResult<Category> {
        let fields = match validation::validate_category(&form, &self.gate) {
            Ok(fields) => fields,
            Err(errors) => return Err(rejected(form, errors)),
        };
        match self.repo.save_category(Some(id), fields).await {
            Ok(category) => {
                tracing::info!(id = %category.id, "category updated");
                Ok(category)
            }
            Err(RepositoryError::NotFound { .. }) => Err(CategoryError::NotFound(id)),
            Err(err) => Err(err.into()),
        }
    }

    /// delete_plan
    ///
    /// Read-only preview of `delete`: which Items would lose the reference and
    /// which would be left with no category at all.
    #[instrument(skip(self))]
    pub async fn delete_plan(&self, id: Uuid) -> CategoryResult<CategoryDeletePlan> {
        let CategoryDetail { category, items } = self.detail(id).await?;
        Ok(CategoryDeletePlan::new(category, items))
    }

    /// delete
    ///
    /// Removes the Category after stripping it from every Item that references
    /// it. Refused with `Blocked` while any Item has it as its only category;
    /// nothing is written in that case.
    ///
    /// Item writes are awaited one at a time and the Category is deleted only
    /// after all of them succeeded. A failed write aborts the operation with
    /// the Category still present and the remaining Items untouched.
    #[instrument(skip(self, form))]
    pub async fn delete(&self, id: Uuid, form: DeleteForm) -> CategoryResult<()> {
        if let Err(errors) = validation::validate_confirmation(&form, &self.gate) {
            return Err(CategoryError::Invalid(ValidationFailure::new(
                Attempted::Confirmation(form),
                errors,
            )));
        }

        let plan = self.delete_plan(id).await?;
        if plan.is_blocked() {
            tracing::info!(
                dangling = plan.dangling.len(),
                "category delete blocked by items with no other category"
            );
            return Err(CategoryError::Blocked {
                category: plan.category,
                dangling: plan.dangling,
            });
        }

        for item in &plan.affected {
            let fields = ItemFields::without_category(item, id);
            self.repo
                .save_item(Some(item.id), fields)
                .await
                .inspect_err(|e| {
                    tracing::error!(item = %item.id, "cascade aborted: {}", e);
                })?;
        }

        match self.repo.delete_category(id).await {
            Ok(()) => {
                tracing::info!(affected = plan.affected.len(), "category deleted");
                Ok(())
            }
            Err(RepositoryError::NotFound { .. }) => Err(CategoryError::NotFound(id)),
            Err(err) => Err(err.into()),
        }
    }
}

fn rejected(form: CategoryForm, errors: Vec<validation::FieldError>) -> CategoryError {
    CategoryError::Invalid(ValidationFailure::new(Attempted::Category(form), errors))
}
