//! Provider layer: addressing, routing/validation and change notification.
//!
//! # Responsibility
//! - Present `pets` (collection) and `pets/{id}` (item) addresses.
//! - Keep callers decoupled from SQL and selection details.
//!
//! # Invariants
//! - Every operation on an unknown address fails with `InvalidAddress`.
//! - Errors surface synchronously and are never retried.

use crate::model::pet::PetValidationError;
use crate::repo::pet_repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod address;
pub mod notify;
pub mod pet_provider;

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Error surfaced by provider operations.
#[derive(Debug)]
pub enum ProviderError {
    /// Address resolved to neither the collection nor an item.
    InvalidAddress(String),
    /// Payload broke a pet invariant; nothing was written.
    Validation(PetValidationError),
    /// Underlying storage call failed.
    Storage(RepoError),
}

impl Display for ProviderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidAddress(raw) => write!(f, "invalid address: `{raw}`"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::Storage(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ProviderError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidAddress(_) => None,
            Self::Validation(err) => Some(err),
            Self::Storage(err) => Some(err),
        }
    }
}

impl From<PetValidationError> for ProviderError {
    fn from(value: PetValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for ProviderError {
    fn from(value: RepoError) -> Self {
        Self::Storage(value)
    }
}
