/// Router Module Index
///
/// Splits the catalog routes by who may use them. Reads are open to everyone;
/// mutations check the admin password carried in the request body inside the
/// services, so no router layer is needed for them.

/// Read-only routes: listings, details, and form view models.
pub mod public;

/// Create, update, and delete routes for both entities.
pub mod admin;
