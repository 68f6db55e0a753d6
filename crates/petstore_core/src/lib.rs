//! Core data-access layer for the pet store.
//! This crate is the single source of truth for pet invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod provider;
pub mod repo;

pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::pet::{
    is_valid_gender, Gender, Pet, PetColumn, PetId, PetValidationError, PetValues, GENDER_FEMALE,
    GENDER_MALE, GENDER_UNKNOWN,
};
pub use provider::address::{PetAddress, PetContentType};
pub use provider::notify::{ChangeNotifier, ChangeObserver, SubscriptionHandle};
pub use provider::pet_provider::PetProvider;
pub use provider::{ProviderError, ProviderResult};
pub use repo::pet_repo::{
    PetCursor, PetQuery, PetRepository, PetRow, PetRows, RepoError, RepoResult, Selection,
    SqlitePetRepository,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
