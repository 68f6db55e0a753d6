//! Pet provider: address routing, payload validation and change signals.
//!
//! # Responsibility
//! - Route collection/item addresses onto repository calls.
//! - Enforce pet invariants before any write reaches storage.
//! - Notify observers after writes that changed data.
//!
//! # Invariants
//! - Validation failures leave storage untouched.
//! - Item addresses always override caller-supplied selections.
//! - `insert` always notifies; `update`/`delete` notify iff rows changed.

use crate::model::pet::{PetValidationError, PetValues};
use crate::provider::address::{PetAddress, PetContentType};
use crate::provider::notify::{ChangeNotifier, ChangeObserver, SubscriptionHandle};
use crate::provider::{ProviderError, ProviderResult};
use crate::repo::pet_repo::{PetCursor, PetQuery, PetRepository, Selection};
use log::{info, warn};
use std::sync::Arc;

/// Content-provider style facade over a pet repository.
pub struct PetProvider<R: PetRepository> {
    repo: R,
    notifier: ChangeNotifier,
}

impl<R: PetRepository> PetProvider<R> {
    /// Creates a provider that owns `repo` and a fresh notification channel.
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            notifier: ChangeNotifier::new(),
        }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn notifier(&self) -> &ChangeNotifier {
        &self.notifier
    }

    /// Registers `observer` for changes visible at `address`.
    pub fn subscribe(
        &self,
        address: PetAddress,
        observer: Arc<dyn ChangeObserver>,
    ) -> SubscriptionHandle {
        self.notifier.subscribe(address, observer)
    }

    pub fn unsubscribe(&self, handle: SubscriptionHandle) -> bool {
        self.notifier.unsubscribe(handle)
    }

    /// Opens a cursor over the rows reachable at `address`.
    ///
    /// For item addresses the selection is replaced by `_id = <id>`; the
    /// caller's selection is ignored. Projection and sort order always apply.
    pub fn query(
        &self,
        address: &PetAddress,
        query: &PetQuery,
    ) -> ProviderResult<PetCursor<'_>> {
        let cursor = match address {
            PetAddress::Collection => self.repo.query(query)?,
            PetAddress::Item(id) => {
                let scoped = PetQuery {
                    selection: Some(Selection::by_id(*id)),
                    ..query.clone()
                };
                self.repo.query(&scoped)?
            }
            PetAddress::Unknown(raw) => return Err(invalid_address("query", raw)),
        };
        Ok(cursor)
    }

    /// Reports whether `address` names the collection or one item.
    pub fn get_type(&self, address: &PetAddress) -> ProviderResult<PetContentType> {
        match address {
            PetAddress::Collection => Ok(PetContentType::Collection),
            PetAddress::Item(_) => Ok(PetContentType::Item),
            PetAddress::Unknown(raw) => Err(invalid_address("get_type", raw)),
        }
    }

    /// Creates one pet and returns its item address.
    ///
    /// # Contract
    /// - Only the collection address accepts inserts.
    /// - `name` and `gender` are required; `weight` defaults to 0.
    /// - Notifies the collection address on success.
    pub fn insert(
        &self,
        address: &PetAddress,
        values: &PetValues,
    ) -> ProviderResult<PetAddress> {
        match address {
            PetAddress::Collection => {}
            other => return Err(invalid_address("insert", &other.to_string())),
        }

        values
            .validate_for_insert()
            .map_err(|err| rejected("insert", err))?;

        let id = self.repo.insert(values)?;
        info!("event=pet_insert module=provider status=ok id={id}");
        self.notifier.notify(address);
        Ok(PetAddress::Item(id))
    }

    /// Deletes the rows reachable at `address`.
    ///
    /// A collection address with no selection deletes every pet.
    pub fn delete(
        &self,
        address: &PetAddress,
        selection: Option<&Selection>,
    ) -> ProviderResult<usize> {
        let deleted = match address {
            PetAddress::Collection => self.repo.delete(selection)?,
            PetAddress::Item(id) => self.repo.delete(Some(&Selection::by_id(*id)))?,
            PetAddress::Unknown(raw) => return Err(invalid_address("delete", raw)),
        };

        info!("event=pet_delete module=provider status=ok address={address} rows={deleted}");
        if deleted > 0 {
            self.notifier.notify(address);
        }
        Ok(deleted)
    }

    /// Applies a partial update to the rows reachable at `address`.
    ///
    /// Only fields present in `values` are validated and written.
    pub fn update(
        &self,
        address: &PetAddress,
        values: &PetValues,
        selection: Option<&Selection>,
    ) -> ProviderResult<usize> {
        let item_selection;
        let selection = match address {
            PetAddress::Collection => selection,
            PetAddress::Item(id) => {
                item_selection = Selection::by_id(*id);
                Some(&item_selection)
            }
            PetAddress::Unknown(raw) => return Err(invalid_address("update", raw)),
        };

        values
            .validate_for_update()
            .map_err(|err| rejected("update", err))?;

        let updated = self.repo.update(values, selection)?;
        info!("event=pet_update module=provider status=ok address={address} rows={updated}");
        if updated > 0 {
            self.notifier.notify(address);
        }
        Ok(updated)
    }
}

fn invalid_address(operation: &str, raw: &str) -> ProviderError {
    warn!("event=pet_{operation} module=provider status=rejected error_code=invalid_address");
    ProviderError::InvalidAddress(raw.to_string())
}

fn rejected(operation: &str, err: PetValidationError) -> ProviderError {
    warn!(
        "event=pet_{operation} module=provider status=rejected error_code=validation field={}",
        err.field()
    );
    ProviderError::Validation(err)
}
