use chrono::{DateTime, Utc};
use leadflow_core::{Role, UserId};
use leadflow_domain::{ActivityId, ActivityType, LeadId, LeadStatus};
use serde::{Deserialize, Serialize};

/// Health response payload.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub postgres: &'static str,
}

/// Registration request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password: String,
}

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// API representation of the authenticated session.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityResponse {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub role: Role,
}

/// Sanitized user payload; carries no credential material by construction.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Lead payload with its (possibly absent) owner.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadResponse {
    pub id: LeadId,
    pub company_name: String,
    pub contact_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub status: LeadStatus,
    pub source: String,
    pub value: Option<i64>,
    pub owner_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub owner: Option<UserResponse>,
}

/// Lead payload with owner and full activity history.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadDetailResponse {
    #[serde(flatten)]
    pub lead: LeadResponse,
    pub activities: Vec<ActivityResponse>,
}

/// Activity payload with its (possibly absent) author.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityResponse {
    pub id: ActivityId,
    pub lead_id: LeadId,
    pub user_id: UserId,
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    pub subject: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub user: Option<UserResponse>,
}

/// Lead creation request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLeadRequest {
    pub company_name: String,
    pub contact_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub status: Option<LeadStatus>,
    pub source: String,
    #[serde(default)]
    pub value: Option<i64>,
    /// Honored for privileged roles, ignored for sales executives.
    #[serde(default)]
    pub owner_id: Option<UserId>,
}

/// Partial lead update request body; absent fields keep their stored value.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLeadRequest {
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub contact_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub status: Option<LeadStatus>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub value: Option<i64>,
    #[serde(default)]
    pub owner_id: Option<UserId>,
}

/// Activity creation request body. The author is always the caller.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateActivityRequest {
    pub lead_id: LeadId,
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    pub subject: String,
    #[serde(default)]
    pub notes: Option<String>,
}
