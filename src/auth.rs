use std::sync::Arc;

use crate::validation::{FailureKind, Field, FieldError};

/// Message attached to the `password` field when the admin check fails.
pub const INCORRECT_PASSWORD: &str = "Incorrect password";

/// Authorization
///
/// Outcome of checking a submitted admin credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authorization {
    Authorized,
    Unauthorized,
}

/// AdminGate
///
/// Guards every catalog mutation. The admin secret is handed in once at
/// construction (from `AppConfig`) and stays constant for the life of the
/// process; nothing here reads the environment.
///
/// A rejected credential is not an error: it surfaces as a `FieldError` on the
/// `password` field so the caller can redisplay the submitted form with only
/// that field flagged.
#[derive(Clone)]
pub struct AdminGate {
    secret: Arc<str>,
}

impl AdminGate {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: Arc::from(secret.into()),
        }
    }

    /// authorize
    ///
    /// Compares `submitted` with the configured secret. An empty configured
    /// secret authorizes nothing.
    pub fn authorize(&self, submitted: &str) -> Authorization {
        if !self.secret.is_empty() && submitted == &*self.secret {
            Authorization::Authorized
        } else {
            Authorization::Unauthorized
        }
    }

    /// check
    ///
    /// `authorize` expressed as a pipeline step: `None` when authorized,
    /// otherwise the credential field failure.
    pub fn check(&self, submitted: &str) -> Option<FieldError> {
        match self.authorize(submitted) {
            Authorization::Authorized => None,
            Authorization::Unauthorized => {
                tracing::warn!("admin credential rejected");
                Some(FieldError::new(
                    Field::Password,
                    FailureKind::Unauthorized,
                    INCORRECT_PASSWORD,
                ))
            }
        }
    }
}

impl std::fmt::Debug for AdminGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminGate").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_secret_is_authorized() {
        let gate = AdminGate::new("s3cret");
        assert_eq!(gate.authorize("s3cret"), Authorization::Authorized);
        assert!(gate.check("s3cret").is_none());
    }

    #[test]
    fn wrong_secret_flags_the_password_field() {
        let gate = AdminGate::new("s3cret");
        assert_eq!(gate.authorize("S3CRET"), Authorization::Unauthorized);

        let error = gate.check("nope").expect("rejected credential");
        assert_eq!(error.field, Field::Password);
        assert_eq!(error.kind, FailureKind::Unauthorized);
        assert_eq!(error.message, INCORRECT_PASSWORD);
    }

    #[test]
    fn empty_configured_secret_authorizes_nothing() {
        let gate = AdminGate::new("");
        assert_eq!(gate.authorize(""), Authorization::Unauthorized);
    }

    #[test]
    fn debug_output_hides_the_secret() {
        let gate = AdminGate::new("s3cret");
        assert!(!format!("{:?}", gate).contains("s3cret"));
    }
}
