//! Core data model of the directory.

use serde::{Deserialize, Serialize};

use crate::errors::DirectoryError;

/// One static entry describing a specialist.
///
/// Immutable once loaded. `specialty` is free text and may carry a
/// `"Category - keyword list"` shape.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryRecord {
    pub name: String,
    pub specialty: String,
    pub facility: String,
    pub locality: String,
    /// City used by city-filtered retrieval. `None` when only a locality is known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    pub contact: String,
}

impl DirectoryRecord {
    pub fn new(
        name: impl Into<String>,
        specialty: impl Into<String>,
        facility: impl Into<String>,
        locality: impl Into<String>,
        city: Option<&str>,
        contact: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            specialty: specialty.into(),
            facility: facility.into(),
            locality: locality.into(),
            city: city.map(str::to_string),
            contact: contact.into(),
        }
    }

    /// Rejects records with a blank required field.
    ///
    /// `index` is only used to label the error.
    pub fn validate(&self, index: usize) -> Result<(), DirectoryError> {
        let required = [
            ("name", &self.name),
            ("specialty", &self.specialty),
            ("facility", &self.facility),
            ("locality", &self.locality),
            ("contact", &self.contact),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(DirectoryError::InvalidRecord { index, field });
            }
        }
        if self.city.as_deref().is_some_and(|c| c.trim().is_empty()) {
            return Err(DirectoryError::InvalidRecord {
                index,
                field: "city",
            });
        }
        Ok(())
    }
}
