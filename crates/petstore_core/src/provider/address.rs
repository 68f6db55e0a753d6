//! Resource addressing for the pet provider.
//!
//! # Responsibility
//! - Classify raw addresses into collection/item/unknown.
//! - Compose item addresses and content URIs.
//!
//! # Invariants
//! - Classification is pure: no I/O, no shared state.
//! - Only `pets` and `pets/{id}` (with `{id}` a non-negative `i64`) resolve.

use crate::model::pet::PetId;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt::{Display, Formatter};

/// Authority segment of the `content://` URI form.
pub const CONTENT_AUTHORITY: &str = "petstore";
/// Path segment for the pet collection.
pub const PATH_PETS: &str = "pets";

pub const CONTENT_LIST_TYPE: &str = "vnd.petstore.dir/pets";
pub const CONTENT_ITEM_TYPE: &str = "vnd.petstore.item/pets";

// Accepts `pets`, `/pets`, `content://petstore/pets`, each optionally with `/{id}`.
static ADDRESS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:content://petstore/|/)?pets(?:/([0-9]+))?$").expect("valid address regex")
});

/// Classified provider address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PetAddress {
    /// Every pet record.
    Collection,
    /// Exactly one pet record by id.
    Item(PetId),
    /// Anything else; every provider operation rejects it.
    Unknown(String),
}

impl PetAddress {
    /// Classifies a raw address string.
    pub fn resolve(raw: &str) -> Self {
        let Some(captures) = ADDRESS_RE.captures(raw) else {
            return Self::Unknown(raw.to_string());
        };

        match captures.get(1) {
            None => Self::Collection,
            Some(id) => match id.as_str().parse::<PetId>() {
                Ok(id) => Self::Item(id),
                Err(_) => Self::Unknown(raw.to_string()),
            },
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown(_))
    }

    /// Returns the item id for `Item` addresses.
    pub fn id(&self) -> Option<PetId> {
        match self {
            Self::Item(id) => Some(*id),
            _ => None,
        }
    }

    /// Full `content://` form; `None` for unknown addresses.
    pub fn content_uri(&self) -> Option<String> {
        match self {
            Self::Unknown(_) => None,
            valid => Some(format!("content://{CONTENT_AUTHORITY}/{valid}")),
        }
    }

    /// Whether a change at `changed` is visible to a subscriber at `self`.
    ///
    /// Collection subscribers see every change; item subscribers see their
    /// own item and collection-wide changes.
    pub fn observes(&self, changed: &PetAddress) -> bool {
        match (self, changed) {
            (Self::Collection, Self::Collection | Self::Item(_)) => true,
            (Self::Item(_), Self::Collection) => true,
            (Self::Item(subscribed), Self::Item(changed)) => subscribed == changed,
            _ => false,
        }
    }
}

impl Display for PetAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Collection => f.write_str(PATH_PETS),
            Self::Item(id) => write!(f, "{PATH_PETS}/{id}"),
            Self::Unknown(raw) => f.write_str(raw),
        }
    }
}

impl From<&str> for PetAddress {
    fn from(value: &str) -> Self {
        Self::resolve(value)
    }
}

/// Content type reported by `get_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PetContentType {
    Collection,
    Item,
}

impl PetContentType {
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Collection => CONTENT_LIST_TYPE,
            Self::Item => CONTENT_ITEM_TYPE,
        }
    }
}
