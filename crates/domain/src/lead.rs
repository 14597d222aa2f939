//! Lead domain types.

use std::fmt::{Display, Formatter};

use leadflow_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Unique identifier for a lead record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LeadId(i64);

impl LeadId {
    /// Creates a lead identifier from a persisted key.
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

impl Display for LeadId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Pipeline stage of a lead.
///
/// There is no enforced transition graph: any status may follow any other.
/// `Won` and `Lost` are the two closed stages; everything else counts as
/// active pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    /// Freshly captured, not yet worked.
    New,
    /// First outreach made.
    Contacted,
    /// Qualified as a real opportunity.
    Qualified,
    /// Proposal sent.
    Proposal,
    /// Terms under negotiation.
    Negotiation,
    /// Deal closed and won.
    Won,
    /// Deal closed and lost.
    Lost,
}

impl LeadStatus {
    /// All statuses in pipeline order.
    pub const ALL: [Self; 7] = [
        Self::New,
        Self::Contacted,
        Self::Qualified,
        Self::Proposal,
        Self::Negotiation,
        Self::Won,
        Self::Lost,
    ];

    /// Returns the storage string for this status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Contacted => "contacted",
            Self::Qualified => "qualified",
            Self::Proposal => "proposal",
            Self::Negotiation => "negotiation",
            Self::Won => "won",
            Self::Lost => "lost",
        }
    }

    /// Returns the capitalized display label for this status.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::New => "New",
            Self::Contacted => "Contacted",
            Self::Qualified => "Qualified",
            Self::Proposal => "Proposal",
            Self::Negotiation => "Negotiation",
            Self::Won => "Won",
            Self::Lost => "Lost",
        }
    }

    /// Parses a storage string into a status.
    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            "new" => Ok(Self::New),
            "contacted" => Ok(Self::Contacted),
            "qualified" => Ok(Self::Qualified),
            "proposal" => Ok(Self::Proposal),
            "negotiation" => Ok(Self::Negotiation),
            "won" => Ok(Self::Won),
            "lost" => Ok(Self::Lost),
            _ => Err(AppError::Validation(format!(
                "unknown lead status '{value}'"
            ))),
        }
    }

    /// Returns whether the lead is still in the active pipeline.
    #[must_use]
    pub fn is_open(&self) -> bool {
        !matches!(self, Self::Won | Self::Lost)
    }
}

#[cfg(test)]
mod tests {
    use super::LeadStatus;

    #[test]
    fn status_storage_strings_round_trip() {
        for status in LeadStatus::ALL {
            let parsed = LeadStatus::parse(status.as_str());
            assert_eq!(parsed.ok(), Some(status));
        }
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert!(LeadStatus::parse("archived").is_err());
    }

    #[test]
    fn won_and_lost_are_closed() {
        assert!(!LeadStatus::Won.is_open());
        assert!(!LeadStatus::Lost.is_open());
        assert!(LeadStatus::Negotiation.is_open());
    }

    #[test]
    fn status_serializes_as_snake_case() {
        let json = serde_json::to_string(&LeadStatus::Contacted);
        assert_eq!(json.ok().as_deref(), Some("\"contacted\""));
    }
}
