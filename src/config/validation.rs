//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Backend ids must be unique and usable as a single path segment. Any
//!   other character is reachable once percent-encoded
//! - Keypairs must name a provider
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: (&[BackendSpec], &Keypairs) → Result<(), Vec<ValidationError>>
//! - Runs before the configuration context is accepted into the system

use std::collections::HashSet;

use thiserror::Error;

use crate::config::schema::{BackendSpec, Keypairs};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("backend #{index} has an empty id")]
    EmptyBackendId { index: usize },

    #[error("backend id `{id}` is not a single path segment")]
    InvalidBackendId { id: String },

    #[error("backend id `{id}` is defined more than once")]
    DuplicateBackendId { id: String },

    #[error("backend `{id}` has an empty provider")]
    EmptyProvider { id: String },

    #[error("keypair registered for an empty provider id")]
    EmptyKeypairProvider,
}

/// Validate backend definitions and keypairs together.
pub fn validate_settings(
    backends: &[BackendSpec],
    keypairs: &Keypairs,
) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    for (index, backend) in backends.iter().enumerate() {
        if backend.id.is_empty() {
            errors.push(ValidationError::EmptyBackendId { index });
            continue;
        }
        if backend.id.contains('/') || backend.id.chars().any(char::is_whitespace) {
            errors.push(ValidationError::InvalidBackendId {
                id: backend.id.clone(),
            });
        }
        if !seen.insert(backend.id.as_str()) {
            errors.push(ValidationError::DuplicateBackendId {
                id: backend.id.clone(),
            });
        }
        if backend.provider.is_empty() {
            errors.push(ValidationError::EmptyProvider {
                id: backend.id.clone(),
            });
        }
    }

    if keypairs.keys().any(|provider| provider.is_empty()) {
        errors.push(ValidationError::EmptyKeypairProvider);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::Keypair;

    #[test]
    fn test_valid_settings_pass() {
        let backends = vec![BackendSpec::new("aws1", "ec2"), BackendSpec::new("rs1", "rackspace")];
        assert!(validate_settings(&backends, &Keypairs::new()).is_ok());
    }

    #[test]
    fn test_non_ascii_backend_id_is_valid() {
        let backends = vec![BackendSpec::new("café", "ec2"), BackendSpec::new("eu-west:1", "ec2")];
        assert!(validate_settings(&backends, &Keypairs::new()).is_ok());
    }

    #[test]
    fn test_reports_every_problem() {
        let backends = vec![
            BackendSpec::new("aws1", "ec2"),
            BackendSpec::new("aws1", "ec2"),
            BackendSpec::new("a/b", ""),
            BackendSpec::new("", "ec2"),
        ];
        let mut keypairs = Keypairs::new();
        keypairs.insert(String::new(), Keypair::new("pub", "priv"));

        let errors = validate_settings(&backends, &keypairs).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::DuplicateBackendId { id: "aws1".into() },
                ValidationError::InvalidBackendId { id: "a/b".into() },
                ValidationError::EmptyProvider { id: "a/b".into() },
                ValidationError::EmptyBackendId { index: 3 },
                ValidationError::EmptyKeypairProvider,
            ]
        );
    }
}
