//! Pet domain model.
//!
//! # Responsibility
//! - Define the canonical pet record and its gender domain.
//! - Define the write payload (`PetValues`) and its validation rules.
//!
//! # Invariants
//! - A stored pet always has a non-empty `name`.
//! - `gender` is always one of `Unknown|Male|Female` (codes 0, 1, 2).
//! - `weight` is never negative.
//! - `id` is assigned by storage and never carried by a write payload.

use rusqlite::types::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Storage-assigned row identifier.
pub type PetId = i64;

pub const GENDER_UNKNOWN: i64 = 0;
pub const GENDER_MALE: i64 = 1;
pub const GENDER_FEMALE: i64 = 2;

/// Returns whether `value` is a member of the gender domain.
pub fn is_valid_gender(value: i64) -> bool {
    matches!(value, GENDER_UNKNOWN | GENDER_MALE | GENDER_FEMALE)
}

/// Gender domain for a pet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Unknown,
    Male,
    Female,
}

impl Gender {
    /// Returns the persisted integer code.
    pub fn code(self) -> i64 {
        match self {
            Self::Unknown => GENDER_UNKNOWN,
            Self::Male => GENDER_MALE,
            Self::Female => GENDER_FEMALE,
        }
    }

    /// Maps a persisted integer code back to the domain.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            GENDER_UNKNOWN => Some(Self::Unknown),
            GENDER_MALE => Some(Self::Male),
            GENDER_FEMALE => Some(Self::Female),
            _ => None,
        }
    }
}

/// Column identifiers of the `pets` table.
///
/// Ordering follows the physical column order, so `PetColumn::ALL` doubles as
/// the default projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PetColumn {
    Id,
    Name,
    Breed,
    Gender,
    Weight,
}

impl PetColumn {
    pub const ALL: [PetColumn; 5] = [
        PetColumn::Id,
        PetColumn::Name,
        PetColumn::Breed,
        PetColumn::Gender,
        PetColumn::Weight,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Id => "_id",
            Self::Name => "name",
            Self::Breed => "breed",
            Self::Gender => "gender",
            Self::Weight => "weight",
        }
    }
}

impl Display for PetColumn {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One fully materialized pet row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pet {
    pub id: PetId,
    pub name: String,
    pub breed: Option<String>,
    pub gender: Gender,
    /// Never negative; same integer width as the payload value.
    pub weight: i64,
}

/// Write payload for insert/update, keyed by column.
///
/// Tracks field *presence* separately from nullness: a column that was never
/// put is absent, while `put_null` marks it present with an SQL `NULL`.
/// `_id` is not writable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PetValues {
    values: BTreeMap<PetColumn, Value>,
}

impl PetValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.values.insert(PetColumn::Name, Value::Text(name.into()));
        self
    }

    pub fn breed(mut self, breed: impl Into<String>) -> Self {
        self.values.insert(PetColumn::Breed, Value::Text(breed.into()));
        self
    }

    /// Sets a raw gender code; out-of-domain codes are caught by validation.
    pub fn gender(mut self, code: i64) -> Self {
        self.values.insert(PetColumn::Gender, Value::Integer(code));
        self
    }

    pub fn weight(mut self, weight: i64) -> Self {
        self.values.insert(PetColumn::Weight, Value::Integer(weight));
        self
    }

    /// Marks `column` present with an SQL `NULL`. Ignored for `_id`.
    pub fn put_null(mut self, column: PetColumn) -> Self {
        if column != PetColumn::Id {
            self.values.insert(column, Value::Null);
        }
        self
    }

    pub fn contains(&self, column: PetColumn) -> bool {
        self.values.contains_key(&column)
    }

    pub fn get(&self, column: PetColumn) -> Option<&Value> {
        self.values.get(&column)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Iterates present columns in physical column order.
    pub fn iter(&self) -> impl Iterator<Item = (PetColumn, &Value)> {
        self.values.iter().map(|(column, value)| (*column, value))
    }

    /// Validates a payload for creating a new pet.
    ///
    /// # Contract
    /// - `name` must be present, text and non-empty.
    /// - `gender` must be present and in the gender domain.
    /// - `weight` is optional; when present it must be an integer `>= 0`.
    pub fn validate_for_insert(&self) -> Result<(), PetValidationError> {
        check_name(self.get(PetColumn::Name))?;
        check_gender(self.get(PetColumn::Gender))?;
        if let Some(weight) = self.get(PetColumn::Weight) {
            check_weight(weight)?;
        }
        Ok(())
    }

    /// Validates a partial payload for updating existing pets.
    ///
    /// Each rule only runs when its column is present in the payload.
    pub fn validate_for_update(&self) -> Result<(), PetValidationError> {
        if let Some(name) = self.get(PetColumn::Name) {
            check_name(Some(name))?;
        }
        if let Some(gender) = self.get(PetColumn::Gender) {
            check_gender(Some(gender))?;
        }
        if let Some(weight) = self.get(PetColumn::Weight) {
            check_weight(weight)?;
        }
        Ok(())
    }
}

impl From<&Pet> for PetValues {
    fn from(pet: &Pet) -> Self {
        let values = PetValues::new()
            .name(pet.name.as_str())
            .gender(pet.gender.code())
            .weight(pet.weight);
        match pet.breed.as_deref() {
            Some(breed) => values.breed(breed),
            None => values.put_null(PetColumn::Breed),
        }
    }
}

/// Payload rejected before reaching storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PetValidationError {
    NameRequired,
    InvalidGender,
    InvalidWeight,
}

impl PetValidationError {
    /// Column that failed validation.
    pub fn field(self) -> PetColumn {
        match self {
            Self::NameRequired => PetColumn::Name,
            Self::InvalidGender => PetColumn::Gender,
            Self::InvalidWeight => PetColumn::Weight,
        }
    }

    pub fn reason(self) -> &'static str {
        match self {
            Self::NameRequired => "name required",
            Self::InvalidGender => "invalid gender",
            Self::InvalidWeight => "invalid weight",
        }
    }
}

impl Display for PetValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field(), self.reason())
    }
}

impl Error for PetValidationError {}

fn check_name(value: Option<&Value>) -> Result<(), PetValidationError> {
    match value {
        Some(Value::Text(name)) if !name.is_empty() => Ok(()),
        _ => Err(PetValidationError::NameRequired),
    }
}

fn check_gender(value: Option<&Value>) -> Result<(), PetValidationError> {
    match value {
        Some(Value::Integer(code)) if is_valid_gender(*code) => Ok(()),
        _ => Err(PetValidationError::InvalidGender),
    }
}

// Explicit NULL is rejected: the column is NOT NULL and the default only
// applies when the field is omitted.
fn check_weight(value: &Value) -> Result<(), PetValidationError> {
    match value {
        Value::Integer(weight) if *weight >= 0 => Ok(()),
        _ => Err(PetValidationError::InvalidWeight),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        is_valid_gender, Gender, Pet, PetColumn, PetValidationError, PetValues, GENDER_FEMALE,
    };

    #[test]
    fn gender_domain_is_zero_to_two() {
        assert!(is_valid_gender(0));
        assert!(is_valid_gender(1));
        assert!(is_valid_gender(2));
        assert!(!is_valid_gender(-1));
        assert!(!is_valid_gender(3));
        assert_eq!(Gender::from_code(GENDER_FEMALE), Some(Gender::Female));
        assert_eq!(Gender::Male.code(), 1);
    }

    #[test]
    fn insert_requires_name_and_gender() {
        let missing_name = PetValues::new().gender(1);
        assert_eq!(
            missing_name.validate_for_insert(),
            Err(PetValidationError::NameRequired)
        );

        let empty_name = PetValues::new().name("").gender(1);
        assert_eq!(
            empty_name.validate_for_insert(),
            Err(PetValidationError::NameRequired)
        );

        let whitespace_name = PetValues::new().name("   ").gender(1);
        assert_eq!(whitespace_name.validate_for_insert(), Ok(()));

        let missing_gender = PetValues::new().name("Rex");
        assert_eq!(
            missing_gender.validate_for_insert(),
            Err(PetValidationError::InvalidGender)
        );

        let ok = PetValues::new().name("Rex").gender(0);
        assert_eq!(ok.validate_for_insert(), Ok(()));
    }

    #[test]
    fn insert_rejects_null_or_negative_weight() {
        let negative = PetValues::new().name("Rex").gender(1).weight(-3);
        assert_eq!(
            negative.validate_for_insert(),
            Err(PetValidationError::InvalidWeight)
        );

        let null_weight = PetValues::new()
            .name("Rex")
            .gender(1)
            .put_null(PetColumn::Weight);
        assert_eq!(
            null_weight.validate_for_insert(),
            Err(PetValidationError::InvalidWeight)
        );
    }

    #[test]
    fn update_only_checks_present_fields() {
        assert_eq!(PetValues::new().breed("Terrier").validate_for_update(), Ok(()));
        assert_eq!(
            PetValues::new().gender(9).validate_for_update(),
            Err(PetValidationError::InvalidGender)
        );
        assert_eq!(
            PetValues::new().put_null(PetColumn::Name).validate_for_update(),
            Err(PetValidationError::NameRequired)
        );
    }

    #[test]
    fn put_null_ignores_id_column() {
        let values = PetValues::new().put_null(PetColumn::Id);
        assert!(values.is_empty());
    }

    #[test]
    fn validation_error_exposes_field_and_reason() {
        let err = PetValidationError::InvalidWeight;
        assert_eq!(err.field(), PetColumn::Weight);
        assert_eq!(err.reason(), "invalid weight");
        assert_eq!(err.to_string(), "weight: invalid weight");
    }

    #[test]
    fn values_from_pet_pass_insert_validation() {
        let pet = Pet {
            id: 4,
            name: "Toto".to_string(),
            breed: None,
            gender: Gender::Male,
            weight: 7,
        };
        let values = PetValues::from(&pet);
        assert!(values.contains(PetColumn::Breed));
        assert!(!values.contains(PetColumn::Id));
        assert_eq!(values.validate_for_insert(), Ok(()));
    }
}
