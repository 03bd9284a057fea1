use std::{fmt, num::IntErrorKind, str::FromStr};

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::{
    auth::AdminGate,
    models::{CategoryForm, CategoryRefs, DeleteForm, ItemForm, PLACEHOLDER_IMAGE},
    models::{CategoryFields, ItemFields},
};

// --- Failure Reporting ---

/// Field
///
/// The form fields a failure can be attributed to. The declaration order is
/// the order failures are reported in.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum Field {
    Name,
    Description,
    Price,
    Stock,
    Categories,
    Image,
    Password,
}

impl Field {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "name" => Some(Field::Name),
            "description" => Some(Field::Description),
            "price" => Some(Field::Price),
            "stock" => Some(Field::Stock),
            "categories" => Some(Field::Categories),
            "image" => Some(Field::Image),
            "password" => Some(Field::Password),
            _ => None,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Name => "name",
            Field::Description => "description",
            Field::Price => "price",
            Field::Stock => "stock",
            Field::Categories => "categories",
            Field::Image => "image",
            Field::Password => "password",
        };
        f.write_str(name)
    }
}

/// FailureKind
///
/// Why a field was rejected. `NoCategories` and `UnresolvedCategory` come from
/// the item business check in `ItemService`, after the pipeline has passed;
/// `Malformed` on `categories` means a reference was not a valid id at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum FailureKind {
    Required,
    Malformed,
    OutOfRange,
    NoCategories,
    UnresolvedCategory,
    Unauthorized,
}

/// FieldError
///
/// One violated rule, attributed to one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct FieldError {
    pub field: Field,
    pub kind: FailureKind,
    pub message: String,
}

impl FieldError {
    pub fn new(field: Field, kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            field,
            kind,
            message: message.into(),
        }
    }
}

/// Attempted
///
/// The submission that was rejected, exactly as it was received.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(tag = "kind", content = "values", rename_all = "snake_case")]
pub enum Attempted {
    Category(CategoryForm),
    Item(ItemForm),
    Confirmation(DeleteForm),
}

/// ValidationFailure
///
/// A recoverable rejection: the attempted submission plus one message per
/// violated rule. Handlers answer with the same form and these messages.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ValidationFailure {
    pub attempted: Attempted,
    pub errors: Vec<FieldError>,
}

impl ValidationFailure {
    pub fn new(attempted: Attempted, errors: Vec<FieldError>) -> Self {
        Self { attempted, errors }
    }

    /// Fields carrying at least one error, in report order.
    pub fn fields(&self) -> Vec<Field> {
        let mut fields: Vec<Field> = self.errors.iter().map(|e| e.field).collect();
        fields.dedup();
        fields
    }

    pub fn flags(&self, field: Field) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    pub fn has_kind(&self, kind: FailureKind) -> bool {
        self.errors.iter().any(|e| e.kind == kind)
    }
}

// --- Drafts (trimmed/parsed values checked by `validator`) ---

#[derive(Debug, Validate)]
struct CategoryDraft {
    #[validate(length(min = 1, message = "Category name required"))]
    name: String,
    #[validate(length(min = 1, message = "Category description required"))]
    description: String,
}

#[derive(Debug, Validate)]
struct ItemDraft {
    #[validate(length(min = 1, message = "Item name required"))]
    name: String,
    #[validate(length(min = 1, message = "Item description required"))]
    description: String,
    #[validate(range(min = 0.0, message = "Item price must not be negative"))]
    price: Option<f64>,
    #[validate(range(min = 0, message = "Item stock must not be negative"))]
    stock: Option<i32>,
    #[validate(url(message = "Item image must be a valid URL"))]
    image: Option<String>,
}

// --- Category References ---

/// NormalizedRefs
///
/// The `categories` field reduced to a sorted, de-duplicated id set, plus
/// every submitted value that was not a valid id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedRefs {
    pub ids: Vec<Uuid>,
    pub malformed: Vec<String>,
}

/// normalize_category_refs
///
/// Accepts a single value, a list, or nothing. Blank entries are dropped and
/// an absent field is the empty set. Applying it to its own output yields the
/// same set.
pub fn normalize_category_refs(refs: Option<&CategoryRefs>) -> NormalizedRefs {
    let mut normalized = NormalizedRefs::default();
    let values = refs.map(CategoryRefs::values).unwrap_or_default();

    for value in values.iter().map(|v| v.trim()).filter(|v| !v.is_empty()) {
        match Uuid::parse_str(value) {
            Ok(id) => normalized.ids.push(id),
            Err(_) => normalized.malformed.push(value.to_string()),
        }
    }

    normalized.ids.sort();
    normalized.ids.dedup();
    normalized
}

// --- Pipelines ---

/// validate_category
///
/// Runs every category rule plus the admin check and returns either the
/// trimmed field set or all violations.
pub fn validate_category(
    form: &CategoryForm,
    gate: &AdminGate,
) -> Result<CategoryFields, Vec<FieldError>> {
    let draft = CategoryDraft {
        name: form.name.trim().to_string(),
        description: form.description.trim().to_string(),
    };

    let mut errors = Vec::new();
    collect(draft.validate(), &mut errors);
    errors.extend(gate.check(&form.password));

    finish(errors, || CategoryFields {
        name: draft.name,
        description: draft.description,
    })
}

/// validate_item
///
/// Runs every item rule plus the admin check. `categories` in the result may
/// be empty: requiring at least one existing Category is left to
/// `ItemService`, which reports it with its own failure kinds.
pub fn validate_item(
    form: &ItemForm,
    refs: &NormalizedRefs,
    gate: &AdminGate,
) -> Result<ItemFields, Vec<FieldError>> {
    let mut errors = Vec::new();

    // "NaN" and "inf" parse as f64 but would slip past the range rule.
    let mut price = parse_field::<f64>(&form.price, Field::Price, "Item price", &mut errors);
    if price.is_some_and(|p| !p.is_finite()) {
        price = None;
        errors.push(FieldError::new(
            Field::Price,
            FailureKind::Malformed,
            "Item price must be a number",
        ));
    }
    // Whole numbers past the i32 bounds are out of range, not malformed.
    let stock = match form.stock.trim().parse::<i32>().map_err(|e| e.kind().clone()) {
        Err(IntErrorKind::PosOverflow) => {
            errors.push(FieldError::new(
                Field::Stock,
                FailureKind::OutOfRange,
                "Item stock is too large",
            ));
            None
        }
        Err(IntErrorKind::NegOverflow) => {
            errors.push(FieldError::new(
                Field::Stock,
                FailureKind::OutOfRange,
                "Item stock must not be negative",
            ));
            None
        }
        _ => parse_field::<i32>(&form.stock, Field::Stock, "Item stock", &mut errors),
    };

    let draft = ItemDraft {
        name: form.name.trim().to_string(),
        description: form.description.trim().to_string(),
        price,
        stock,
        image: form
            .image
            .as_deref()
            .map(str::trim)
            .filter(|image| !image.is_empty())
            .map(str::to_string),
    };

    collect(draft.validate(), &mut errors);

    for value in &refs.malformed {
        errors.push(FieldError::new(
            Field::Categories,
            FailureKind::Malformed,
            format!("Malformed category reference '{}'", value),
        ));
    }

    errors.extend(gate.check(&form.password));

    finish(errors, || ItemFields {
        name: draft.name,
        description: draft.description,
        price: draft.price.unwrap_or_default(),
        stock: draft.stock.unwrap_or_default(),
        categories: refs.ids.clone(),
        image: draft
            .image
            .unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string()),
    })
}

/// validate_confirmation
///
/// Deletes carry no entity fields; only the admin check applies.
pub fn validate_confirmation(form: &DeleteForm, gate: &AdminGate) -> Result<(), Vec<FieldError>> {
    match gate.check(&form.password) {
        Some(error) => Err(vec![error]),
        None => Ok(()),
    }
}

/// Parses a numeric text field. Blank input is `Required`, anything that does
/// not parse is `Malformed`; both leave the draft value unset so the range
/// rule is skipped.
fn parse_field<T: FromStr>(
    raw: &str,
    field: Field,
    label: &str,
    errors: &mut Vec<FieldError>,
) -> Option<T> {
    let raw = raw.trim();
    if raw.is_empty() {
        errors.push(FieldError::new(
            field,
            FailureKind::Required,
            format!("{} required", label),
        ));
        return None;
    }
    match raw.parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            let expected = match field {
                Field::Stock => "a whole number",
                _ => "a number",
            };
            errors.push(FieldError::new(
                field,
                FailureKind::Malformed,
                format!("{} must be {}", label, expected),
            ));
            None
        }
    }
}

fn collect(result: Result<(), ValidationErrors>, errors: &mut Vec<FieldError>) {
    let Err(report) = result else {
        return;
    };
    for (name, failures) in report.field_errors() {
        let Some(field) = Field::from_name(&name) else {
            continue;
        };
        for failure in failures {
            let kind = match &*failure.code {
                "length" => FailureKind::Required,
                "range" => FailureKind::OutOfRange,
                _ => FailureKind::Malformed,
            };
            let message = failure
                .message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| format!("Invalid {}", field));
            errors.push(FieldError::new(field, kind, message));
        }
    }
}

fn finish<T>(mut errors: Vec<FieldError>, build: impl FnOnce() -> T) -> Result<T, Vec<FieldError>> {
    if errors.is_empty() {
        Ok(build())
    } else {
        errors.sort_by_key(|e| e.field);
        Err(errors)
    }
}
