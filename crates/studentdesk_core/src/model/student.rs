//! Student domain model.
//!
//! # Responsibility
//! - Define `StudentRecord`, the only entity rendered by the dashboard.
//! - Define the closed option sets used by the record form.
//!
//! # Invariants
//! - `id` is unique across the collection and immutable once assigned.
//! - `timestamp` is store-assigned and only used for ordering.
//! - `subject` defaults to an empty string, never `None`.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Opaque store-assigned identifier.
pub type StudentId = String;

/// Avatar shown when a record carries no `img`.
pub const DEFAULT_AVATAR: &str = "/default-profile.png";

/// Canonical student record as materialized from a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRecord {
    pub id: StudentId,
    pub name: String,
    pub email: String,
    /// Serialized as `class` to match the collection schema.
    #[serde(rename = "class")]
    pub class_name: String,
    pub gender: String,
    #[serde(default)]
    pub subject: String,
    /// Phone number.
    pub contact: String,
    pub year_joined: Option<String>,
    pub img: Option<String>,
    /// Unix epoch milliseconds assigned by the store.
    pub timestamp: i64,
}

impl StudentRecord {
    /// Returns the avatar reference, falling back to [`DEFAULT_AVATAR`].
    pub fn avatar(&self) -> &str {
        self.img
            .as_deref()
            .filter(|value| !value.is_empty())
            .unwrap_or(DEFAULT_AVATAR)
    }

    /// Returns every attribute value in text form, `None` for absent ones.
    ///
    /// Used by search matching; order follows the collection schema.
    pub fn attribute_texts(&self) -> [Option<String>; 10] {
        [
            Some(self.id.clone()),
            Some(self.name.clone()),
            Some(self.email.clone()),
            Some(self.class_name.clone()),
            Some(self.gender.clone()),
            Some(self.subject.clone()),
            Some(self.contact.clone()),
            self.year_joined.clone(),
            self.img.clone(),
            Some(self.timestamp.to_string()),
        ]
    }
}

/// Gender options offered by the record form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub const ALL: [Gender; 2] = [Gender::Male, Gender::Female];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
        }
    }

    /// Parses a stored option value; matching is exact like a select input.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "male" => Some(Self::Male),
            "female" => Some(Self::Female),
            _ => None,
        }
    }

    /// Human-facing option label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Male => "Male",
            Self::Female => "Female",
        }
    }
}

impl Display for Gender {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One class option provided by the class roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassRoom {
    #[serde(rename = "class")]
    pub class_name: String,
}

impl ClassRoom {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
        }
    }
}

/// Insertion payload sent to the collection.
///
/// `id` and `timestamp` are absent on purpose: the store assigns both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewStudentDocument {
    pub name: String,
    pub email: String,
    #[serde(rename = "class")]
    pub class_name: String,
    pub gender: Gender,
    pub subject: String,
    pub contact: String,
}
