//! Lead ports and application service.
//!
//! The repository applies the row-level visibility filter inside the store so
//! no caller can bypass it; the service enforces the operation policy,
//! ownership checks (existence first, then ownership) and publishes change
//! events after successful writes.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use leadflow_core::{AppError, AppResult, Role, UserId, UserIdentity};
use leadflow_domain::{EmailAddress, LeadId, LeadStatus};

use crate::access::{self, LeadVisibility, Operation};
use crate::activity_service::{ActivityRepository, ActivityWithAuthor};
use crate::change_notifier::{ChangeEvent, ChangeNotifier};
use crate::user_service::{UserRecord, UserRepository};

// ---------------------------------------------------------------------------
// Ports
// ---------------------------------------------------------------------------

/// Persisted lead row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadRecord {
    /// Stable numeric identifier.
    pub id: LeadId,
    /// Prospect company name.
    pub company_name: String,
    /// Primary contact person.
    pub contact_name: String,
    /// Contact email address.
    pub email: String,
    /// Optional contact phone number.
    pub phone: Option<String>,
    /// Pipeline stage.
    pub status: LeadStatus,
    /// Acquisition channel tag.
    pub source: String,
    /// Optional monetary estimate.
    pub value: Option<i64>,
    /// Owning user.
    pub owner_id: UserId,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp; refreshed on every update.
    pub updated_at: DateTime<Utc>,
}

/// Lead joined with its owner.
///
/// The join is a left join: a lead whose owner row has been hard-deleted
/// still appears, with `owner` absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadWithOwner {
    /// The lead row.
    #[serde(flatten)]
    pub lead: LeadRecord,
    /// The owning user, when the row still exists.
    pub owner: Option<UserRecord>,
}

/// Lead joined with its owner and full activity history.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadDetail {
    /// The lead row.
    #[serde(flatten)]
    pub lead: LeadRecord,
    /// The owning user, when the row still exists.
    pub owner: Option<UserRecord>,
    /// Activities against this lead, newest first.
    pub activities: Vec<ActivityWithAuthor>,
}

/// Fields for a new lead row. The owner has already been resolved by the
/// authorization gate.
#[derive(Debug, Clone)]
pub struct NewLead {
    /// Prospect company name.
    pub company_name: String,
    /// Primary contact person.
    pub contact_name: String,
    /// Contact email address.
    pub email: String,
    /// Optional contact phone number.
    pub phone: Option<String>,
    /// Pipeline stage.
    pub status: LeadStatus,
    /// Acquisition channel tag.
    pub source: String,
    /// Optional monetary estimate.
    pub value: Option<i64>,
    /// Owning user.
    pub owner_id: UserId,
}

/// Partial update for a lead; absent fields keep their stored value.
#[derive(Debug, Clone, Default)]
pub struct LeadPatch {
    /// New company name.
    pub company_name: Option<String>,
    /// New contact person.
    pub contact_name: Option<String>,
    /// New contact email address.
    pub email: Option<String>,
    /// New phone number.
    pub phone: Option<String>,
    /// New pipeline stage.
    pub status: Option<LeadStatus>,
    /// New acquisition channel tag.
    pub source: Option<String>,
    /// New monetary estimate.
    pub value: Option<i64>,
    /// New owner.
    pub owner_id: Option<UserId>,
}

/// Repository port for lead persistence.
#[async_trait]
pub trait LeadRepository: Send + Sync {
    /// Lists leads joined with their owner, newest first. The visibility
    /// filter is applied inside the store query.
    async fn list(&self, visibility: LeadVisibility) -> AppResult<Vec<LeadWithOwner>>;

    /// Finds a bare lead row by id.
    async fn find(&self, lead_id: LeadId) -> AppResult<Option<LeadRecord>>;

    /// Finds a lead joined with its owner.
    async fn find_with_owner(&self, lead_id: LeadId) -> AppResult<Option<LeadWithOwner>>;

    /// Inserts a new lead row.
    async fn create(&self, lead: NewLead) -> AppResult<LeadRecord>;

    /// Merges the patch onto the stored row and always refreshes
    /// `updated_at`, even when no semantic field changed. Returns the fresh
    /// row, or `None` when the lead does not exist.
    async fn update(&self, lead_id: LeadId, patch: LeadPatch) -> AppResult<Option<LeadRecord>>;

    /// Deletes the lead row and all activities referencing it as one atomic
    /// unit: either both disappear or neither does.
    async fn delete(&self, lead_id: LeadId) -> AppResult<()>;
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Parameters for creating a lead, before owner resolution.
#[derive(Debug, Clone)]
pub struct CreateLead {
    /// Prospect company name.
    pub company_name: String,
    /// Primary contact person.
    pub contact_name: String,
    /// Contact email address.
    pub email: String,
    /// Optional contact phone number.
    pub phone: Option<String>,
    /// Pipeline stage; defaults to `new` when absent.
    pub status: Option<LeadStatus>,
    /// Acquisition channel tag.
    pub source: String,
    /// Optional monetary estimate.
    pub value: Option<i64>,
    /// Requested owner. Honored for privileged roles, discarded for sales
    /// executives.
    pub owner_id: Option<UserId>,
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// Application service for lead reads and mutations.
#[derive(Clone)]
pub struct LeadService {
    leads: Arc<dyn LeadRepository>,
    activities: Arc<dyn ActivityRepository>,
    users: Arc<dyn UserRepository>,
    notifier: Arc<dyn ChangeNotifier>,
}

impl LeadService {
    /// Creates a new lead service.
    #[must_use]
    pub fn new(
        leads: Arc<dyn LeadRepository>,
        activities: Arc<dyn ActivityRepository>,
        users: Arc<dyn UserRepository>,
        notifier: Arc<dyn ChangeNotifier>,
    ) -> Self {
        Self {
            leads,
            activities,
            users,
            notifier,
        }
    }

    /// Lists the leads visible to the caller, newest first.
    pub async fn list(&self, identity: &UserIdentity) -> AppResult<Vec<LeadWithOwner>> {
        access::require(identity, Operation::ReadLeads)?;
        self.leads.list(access::lead_visibility(identity)).await
    }

    /// Returns one lead with its owner and activity history.
    pub async fn get(&self, identity: &UserIdentity, lead_id: LeadId) -> AppResult<LeadDetail> {
        access::require(identity, Operation::ReadLeadDetail)?;

        let with_owner = self
            .leads
            .find_with_owner(lead_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("lead {lead_id} does not exist")))?;
        access::require_lead_access(identity, with_owner.lead.owner_id)?;

        let activities = self.activities.list_for_lead(lead_id).await?;

        Ok(LeadDetail {
            lead: with_owner.lead,
            owner: with_owner.owner,
            activities,
        })
    }

    /// Creates a lead and broadcasts `lead_created`.
    pub async fn create(
        &self,
        identity: &UserIdentity,
        input: CreateLead,
    ) -> AppResult<LeadWithOwner> {
        access::require(identity, Operation::CreateLead)?;

        let owner_id = access::resolve_new_lead_owner(identity, input.owner_id);
        let owner = self
            .users
            .find_by_id(owner_id)
            .await?
            .ok_or_else(|| AppError::Validation(format!("owner {owner_id} does not exist")))?;

        let new_lead = NewLead {
            company_name: required_text("companyName", input.company_name)?,
            contact_name: required_text("contactName", input.contact_name)?,
            email: EmailAddress::new(input.email)?.into(),
            phone: optional_text(input.phone),
            status: input.status.unwrap_or(LeadStatus::New),
            source: required_text("source", input.source)?,
            value: validated_value(input.value)?,
            owner_id,
        };

        let created = self.leads.create(new_lead).await?;
        let with_owner = LeadWithOwner {
            lead: created,
            owner: Some(owner),
        };

        self.notifier
            .publish(ChangeEvent::LeadCreated(with_owner.clone()));

        Ok(with_owner)
    }

    /// Applies a partial update and broadcasts `lead_updated` with the fresh
    /// post-write state.
    pub async fn update(
        &self,
        identity: &UserIdentity,
        lead_id: LeadId,
        mut patch: LeadPatch,
    ) -> AppResult<LeadWithOwner> {
        access::require(identity, Operation::UpdateLead)?;

        // Existence before ownership: a missing lead is 404 for every role.
        let existing = self
            .leads
            .find(lead_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("lead {lead_id} does not exist")))?;
        access::require_lead_access(identity, existing.owner_id)?;

        // Owner reassignment is a privileged operation; a sales executive's
        // request keeps the lead to themselves.
        if identity.role() == Role::SalesExecutive {
            patch.owner_id = None;
        }
        if let Some(new_owner) = patch.owner_id
            && self.users.find_by_id(new_owner).await?.is_none()
        {
            return Err(AppError::Validation(format!(
                "owner {new_owner} does not exist"
            )));
        }

        let patch = validated_patch(patch)?;
        let updated = self
            .leads
            .update(lead_id, patch)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("lead {lead_id} does not exist")))?;

        let owner = self.users.find_by_id(updated.owner_id).await?;
        let with_owner = LeadWithOwner {
            lead: updated,
            owner,
        };

        self.notifier
            .publish(ChangeEvent::LeadUpdated(with_owner.clone()));

        Ok(with_owner)
    }

    /// Deletes a lead and its activities, then broadcasts `lead_deleted`.
    pub async fn delete(&self, identity: &UserIdentity, lead_id: LeadId) -> AppResult<()> {
        // Existence before privilege: a missing lead is 404 even for roles
        // that could never delete it.
        if self.leads.find(lead_id).await?.is_none() {
            return Err(AppError::NotFound(format!("lead {lead_id} does not exist")));
        }
        access::require(identity, Operation::DeleteLead)?;

        self.leads.delete(lead_id).await?;
        self.notifier.publish(ChangeEvent::LeadDeleted { id: lead_id });

        Ok(())
    }
}

fn required_text(field: &str, value: String) -> AppResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{field} must not be empty")));
    }

    Ok(trimmed.to_owned())
}

fn optional_text(value: Option<String>) -> Option<String> {
    value.and_then(|text| {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_owned())
        }
    })
}

fn validated_value(value: Option<i64>) -> AppResult<Option<i64>> {
    if let Some(amount) = value
        && amount < 0
    {
        return Err(AppError::Validation(
            "value must not be negative".to_owned(),
        ));
    }

    Ok(value)
}

fn validated_patch(patch: LeadPatch) -> AppResult<LeadPatch> {
    Ok(LeadPatch {
        company_name: patch
            .company_name
            .map(|value| required_text("companyName", value))
            .transpose()?,
        contact_name: patch
            .contact_name
            .map(|value| required_text("contactName", value))
            .transpose()?,
        email: patch
            .email
            .map(|value| EmailAddress::new(value).map(String::from))
            .transpose()?,
        phone: optional_text(patch.phone),
        status: patch.status,
        source: patch
            .source
            .map(|value| required_text("source", value))
            .transpose()?,
        value: validated_value(patch.value)?,
        owner_id: patch.owner_id,
    })
}
