//! Activity domain types.
//!
//! Activities are immutable interaction log entries attached to a lead. The
//! activity type is an open set: well-known kinds get a variant, anything
//! else is carried through verbatim.

use std::fmt::{Display, Formatter};

use leadflow_core::{AppError, AppResult};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Unique identifier for an activity record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActivityId(i64);

impl ActivityId {
    /// Creates an activity identifier from a persisted key.
    #[must_use]
    pub fn from_i64(value: i64) -> Self {
        Self(value)
    }

    /// Returns the underlying numeric key.
    #[must_use]
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for ActivityId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Kind of logged interaction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ActivityType {
    /// Free-form note.
    Note,
    /// Phone call.
    Call,
    /// In-person or video meeting.
    Meeting,
    /// Email exchange.
    Email,
    /// Any other channel tag, stored verbatim.
    Other(String),
}

impl ActivityType {
    /// Returns the storage string for this activity type.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Note => "note",
            Self::Call => "call",
            Self::Meeting => "meeting",
            Self::Email => "email",
            Self::Other(tag) => tag.as_str(),
        }
    }

    /// Parses a storage string into an activity type.
    ///
    /// Unknown tags are preserved as [`ActivityType::Other`]; only empty tags
    /// are rejected.
    pub fn parse(value: &str) -> AppResult<Self> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(AppError::Validation(
                "activity type must not be empty".to_owned(),
            ));
        }

        Ok(match trimmed {
            "note" => Self::Note,
            "call" => Self::Call,
            "meeting" => Self::Meeting,
            "email" => Self::Email,
            other => Self::Other(other.to_owned()),
        })
    }
}

impl Serialize for ActivityType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ActivityType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Self::parse(value.as_str()).map_err(|error| D::Error::custom(error.to_string()))
    }
}
