//! Activity ports and application service.
//!
//! Activities are immutable once logged; the only delete path is the cascade
//! that runs when their parent lead is removed.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use leadflow_core::{AppError, AppResult, UserId, UserIdentity};
use leadflow_domain::{ActivityId, ActivityType, LeadId};

use crate::access::{self, LeadVisibility, Operation};
use crate::change_notifier::{ChangeEvent, ChangeNotifier};
use crate::lead_service::LeadRepository;
use crate::user_service::{UserRecord, UserRepository};

// ---------------------------------------------------------------------------
// Ports
// ---------------------------------------------------------------------------

/// Persisted activity row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRecord {
    /// Stable numeric identifier.
    pub id: ActivityId,
    /// Parent lead.
    pub lead_id: LeadId,
    /// Authoring user.
    pub user_id: UserId,
    /// Kind of interaction.
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    /// Short summary line.
    pub subject: String,
    /// Optional free-form notes.
    pub notes: Option<String>,
    /// Creation timestamp; immutable.
    pub created_at: DateTime<Utc>,
}

/// Activity joined with its authoring user.
///
/// Left join: an activity whose author row has been hard-deleted still
/// appears, with `user` absent.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityWithAuthor {
    /// The activity row.
    #[serde(flatten)]
    pub activity: ActivityRecord,
    /// The authoring user, when the row still exists.
    pub user: Option<UserRecord>,
}

/// Fields for a new activity row; referential checks have already run.
#[derive(Debug, Clone)]
pub struct NewActivity {
    /// Parent lead.
    pub lead_id: LeadId,
    /// Authoring user.
    pub user_id: UserId,
    /// Kind of interaction.
    pub activity_type: ActivityType,
    /// Short summary line.
    pub subject: String,
    /// Optional free-form notes.
    pub notes: Option<String>,
}

/// Repository port for activity persistence.
#[async_trait]
pub trait ActivityRepository: Send + Sync {
    /// Inserts a new activity row.
    async fn create(&self, activity: NewActivity) -> AppResult<ActivityRecord>;

    /// Lists activities for one lead joined with their author, newest first.
    async fn list_for_lead(&self, lead_id: LeadId) -> AppResult<Vec<ActivityWithAuthor>>;

    /// Lists activity rows whose parent lead matches the visibility filter.
    /// Used by the aggregation engine.
    async fn list_visible(&self, visibility: LeadVisibility) -> AppResult<Vec<ActivityRecord>>;
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Parameters for logging an interaction. The author is always the caller.
#[derive(Debug, Clone)]
pub struct LogActivity {
    /// Lead the interaction was against.
    pub lead_id: LeadId,
    /// Kind of interaction.
    pub activity_type: ActivityType,
    /// Short summary line.
    pub subject: String,
    /// Optional free-form notes.
    pub notes: Option<String>,
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// Application service for logging and reading activities.
#[derive(Clone)]
pub struct ActivityService {
    activities: Arc<dyn ActivityRepository>,
    leads: Arc<dyn LeadRepository>,
    users: Arc<dyn UserRepository>,
    notifier: Arc<dyn ChangeNotifier>,
}

impl ActivityService {
    /// Creates a new activity service.
    #[must_use]
    pub fn new(
        activities: Arc<dyn ActivityRepository>,
        leads: Arc<dyn LeadRepository>,
        users: Arc<dyn UserRepository>,
        notifier: Arc<dyn ChangeNotifier>,
    ) -> Self {
        Self {
            activities,
            leads,
            users,
            notifier,
        }
    }

    /// Logs an interaction against a lead the caller may see, then
    /// broadcasts `activity_created`.
    pub async fn log(
        &self,
        identity: &UserIdentity,
        input: LogActivity,
    ) -> AppResult<ActivityWithAuthor> {
        access::require(identity, Operation::CreateActivity)?;

        // Existence before ownership: logging against a missing lead is 404.
        let lead = self
            .leads
            .find(input.lead_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("lead {} does not exist", input.lead_id)))?;
        access::require_lead_access(identity, lead.owner_id)?;

        let subject = input.subject.trim().to_owned();
        if subject.is_empty() {
            return Err(AppError::Validation("subject must not be empty".to_owned()));
        }

        let created = self
            .activities
            .create(NewActivity {
                lead_id: input.lead_id,
                user_id: identity.id(),
                activity_type: input.activity_type,
                subject,
                notes: input.notes.filter(|notes| !notes.trim().is_empty()),
            })
            .await?;

        let author = self.users.find_by_id(identity.id()).await?;
        let with_author = ActivityWithAuthor {
            activity: created,
            user: author,
        };

        self.notifier
            .publish(ChangeEvent::ActivityCreated(with_author.clone()));

        Ok(with_author)
    }

    /// Lists the activity history of one visible lead, newest first.
    pub async fn list_for_lead(
        &self,
        identity: &UserIdentity,
        lead_id: LeadId,
    ) -> AppResult<Vec<ActivityWithAuthor>> {
        access::require(identity, Operation::ReadLeadDetail)?;

        let lead = self
            .leads
            .find(lead_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("lead {lead_id} does not exist")))?;
        access::require_lead_access(identity, lead.owner_id)?;

        self.activities.list_for_lead(lead_id).await
    }
}

#[cfg(test)]
mod tests;
