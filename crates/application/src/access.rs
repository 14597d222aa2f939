//! Role policy table for the authorization gate.
//!
//! Every role-based allow/deny decision lives in this module so the policy
//! can be audited in one place and unit-tested without HTTP handlers. The
//! services call [`require`] for coarse operation checks, [`lead_visibility`]
//! for the row-level read filter, and [`require_lead_access`] for per-lead
//! ownership checks. Callers must verify existence before ownership so a
//! missing resource always surfaces as `NotFound`, never `Forbidden`.

use leadflow_core::{AppError, AppResult, Role, UserId, UserIdentity};

/// Protected operation checked against the role policy table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// List leads (subject to the visibility filter).
    ReadLeads,
    /// Read one lead with its activity history.
    ReadLeadDetail,
    /// Create a lead.
    CreateLead,
    /// Update a lead.
    UpdateLead,
    /// Delete a lead and its activities.
    DeleteLead,
    /// Log an activity against a lead.
    CreateActivity,
    /// List the user directory.
    ReadUsers,
    /// Read the analytics rollup.
    ReadAnalytics,
}

/// Row-level visibility filter applied to lead reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeadVisibility {
    /// No restriction.
    All,
    /// Restricted to leads owned by one user.
    OwnedBy(UserId),
}

/// Returns whether the role may perform the operation at all.
///
/// Row-level restrictions (own leads only) are expressed separately through
/// [`lead_visibility`] and [`require_lead_access`].
#[must_use]
pub fn role_allows(role: Role, operation: Operation) -> bool {
    match (role, operation) {
        // Every role works with the leads it can see.
        (
            _,
            Operation::ReadLeads
            | Operation::ReadLeadDetail
            | Operation::CreateLead
            | Operation::UpdateLead
            | Operation::CreateActivity,
        ) => true,
        (Role::Admin | Role::Manager, Operation::DeleteLead | Operation::ReadAnalytics) => true,
        (Role::Admin, Operation::ReadUsers) => true,
        (Role::Manager, Operation::ReadUsers) => false,
        (
            Role::SalesExecutive,
            Operation::DeleteLead | Operation::ReadUsers | Operation::ReadAnalytics,
        ) => false,
    }
}

/// Ensures the caller's role may perform the operation.
pub fn require(identity: &UserIdentity, operation: Operation) -> AppResult<()> {
    if role_allows(identity.role(), operation) {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "role '{}' may not perform this operation",
            identity.role().as_str()
        )))
    }
}

/// Returns the row-level visibility filter for the caller's lead reads.
#[must_use]
pub fn lead_visibility(identity: &UserIdentity) -> LeadVisibility {
    match identity.role() {
        Role::Admin | Role::Manager => LeadVisibility::All,
        Role::SalesExecutive => LeadVisibility::OwnedBy(identity.id()),
    }
}

/// Ensures the caller may act on a lead owned by `owner_id`.
///
/// Callers check existence first; this function only decides ownership.
pub fn require_lead_access(identity: &UserIdentity, owner_id: UserId) -> AppResult<()> {
    match lead_visibility(identity) {
        LeadVisibility::All => Ok(()),
        LeadVisibility::OwnedBy(viewer) if viewer == owner_id => Ok(()),
        LeadVisibility::OwnedBy(_) => Err(AppError::Forbidden(
            "this lead belongs to another user".to_owned(),
        )),
    }
}

/// Resolves the stored owner for a new lead.
///
/// A sales executive always becomes the owner; any client-supplied owner is
/// discarded. Privileged roles may assign any owner and default to
/// themselves.
#[must_use]
pub fn resolve_new_lead_owner(identity: &UserIdentity, requested: Option<UserId>) -> UserId {
    match identity.role() {
        Role::Admin | Role::Manager => requested.unwrap_or_else(|| identity.id()),
        Role::SalesExecutive => identity.id(),
    }
}
