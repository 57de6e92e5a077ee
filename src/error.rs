//! Errors raised by the storage technology models.
//!
//! Functions in this crate return [`anyhow::Result`]. Where the failure belongs to one of the
//! categories below, the underlying error is a [`StorageError`], which callers can recover with
//! [`anyhow::Error::downcast_ref`].
use crate::quantity::Dimension;
use std::error::Error;
use std::fmt;

/// A failure in building or updating a storage technology
#[derive(Debug, Clone, PartialEq)]
pub enum StorageError {
    /// A field was given a value outside its documented domain
    Validation {
        /// The name of the offending field
        field: &'static str,
        /// The constraint which was violated
        constraint: String,
    },
    /// The charge/discharge/efficiency values contradict each other
    InconsistentDesign(String),
    /// The cost index has no entry for the requested year
    MissingIndexYear(u32),
    /// The reference data has no archetype with the requested ID
    MissingArchetype(String),
    /// A quantity was supplied in a unit that cannot be converted to the expected one
    IncompatibleUnit {
        /// The unit the quantity was given in
        unit: String,
        /// The dimension which was expected
        expected: Dimension,
    },
    /// Country and year have not been set
    SceneNotSet,
}

impl StorageError {
    /// Create a [`StorageError::Validation`] for the given field
    pub fn validation(field: &'static str, constraint: impl Into<String>) -> Self {
        Self::Validation {
            field,
            constraint: constraint.into(),
        }
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Validation { field, constraint } => write!(f, "Invalid {field}: {constraint}"),
            Self::InconsistentDesign(msg) => {
                write!(f, "Inconsistent charge/discharge and efficiency values: {msg}")
            }
            Self::MissingIndexYear(year) => write!(f, "No cost index available for year {year}"),
            Self::MissingArchetype(id) => write!(f, "Unknown storage archetype: {id}"),
            Self::IncompatibleUnit { unit, expected } => {
                write!(f, "Unit {unit} is not compatible with dimension {expected}")
            }
            Self::SceneNotSet => write!(
                f,
                "Country and year must be set to perform a techno-economic analysis"
            ),
        }
    }
}

impl Error for StorageError {}
