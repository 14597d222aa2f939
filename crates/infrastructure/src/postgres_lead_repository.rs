//! PostgreSQL-backed lead repository.
//!
//! All owner-joined reads are single LEFT JOIN queries so a hard-deleted
//! owner never makes the lead disappear from results. The row-level
//! visibility filter is part of the SQL, not something callers bolt on.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use leadflow_application::{
    LeadPatch, LeadRecord, LeadRepository, LeadVisibility, LeadWithOwner, NewLead, UserRecord,
};
use leadflow_core::{AppError, AppResult, Role, UserId};
use leadflow_domain::{LeadId, LeadStatus};

/// PostgreSQL implementation of the lead repository port.
#[derive(Clone)]
pub struct PostgresLeadRepository {
    pool: PgPool,
}

impl PostgresLeadRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct LeadRow {
    id: i64,
    company_name: String,
    contact_name: String,
    email: String,
    phone: Option<String>,
    status: String,
    source: String,
    value: Option<i64>,
    owner_id: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<LeadRow> for LeadRecord {
    type Error = AppError;

    fn try_from(row: LeadRow) -> AppResult<Self> {
        Ok(Self {
            id: LeadId::from_i64(row.id),
            company_name: row.company_name,
            contact_name: row.contact_name,
            email: row.email,
            phone: row.phone,
            status: LeadStatus::parse(row.status.as_str())
                .map_err(|_| AppError::Internal(format!("corrupt status value '{}'", row.status)))?,
            source: row.source,
            value: row.value,
            owner_id: UserId::from_i64(row.owner_id),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct LeadOwnerRow {
    #[sqlx(flatten)]
    lead: LeadRow,
    owner_user_id: Option<i64>,
    owner_username: Option<String>,
    owner_email: Option<String>,
    owner_full_name: Option<String>,
    owner_role: Option<String>,
    owner_created_at: Option<DateTime<Utc>>,
}

impl TryFrom<LeadOwnerRow> for LeadWithOwner {
    type Error = AppError;

    fn try_from(row: LeadOwnerRow) -> AppResult<Self> {
        // LEFT JOIN: every owner column is NULL when the owner row is gone.
        let owner = match (
            row.owner_user_id,
            row.owner_username,
            row.owner_email,
            row.owner_full_name,
            row.owner_role,
            row.owner_created_at,
        ) {
            (Some(id), Some(username), Some(email), Some(full_name), Some(role), Some(created_at)) => {
                Some(UserRecord {
                    id: UserId::from_i64(id),
                    username,
                    email,
                    full_name,
                    role: Role::parse(role.as_str()).map_err(|_| {
                        AppError::Internal(format!("corrupt role value '{role}'"))
                    })?,
                    created_at,
                })
            }
            _ => None,
        };

        Ok(Self {
            lead: LeadRecord::try_from(row.lead)?,
            owner,
        })
    }
}

const LEAD_COLUMNS: &str = "l.id, l.company_name, l.contact_name, l.email, l.phone, l.status, \
     l.source, l.value, l.owner_id, l.created_at, l.updated_at";

const OWNER_COLUMNS: &str = "u.id AS owner_user_id, u.username AS owner_username, \
     u.email AS owner_email, u.full_name AS owner_full_name, u.role AS owner_role, \
     u.created_at AS owner_created_at";

mod read;
mod write;

#[async_trait]
impl LeadRepository for PostgresLeadRepository {
    async fn list(&self, visibility: LeadVisibility) -> AppResult<Vec<LeadWithOwner>> {
        self.list_impl(visibility).await
    }

    async fn find(&self, lead_id: LeadId) -> AppResult<Option<LeadRecord>> {
        self.find_impl(lead_id).await
    }

    async fn find_with_owner(&self, lead_id: LeadId) -> AppResult<Option<LeadWithOwner>> {
        self.find_with_owner_impl(lead_id).await
    }

    async fn create(&self, lead: NewLead) -> AppResult<LeadRecord> {
        self.create_impl(lead).await
    }

    async fn update(&self, lead_id: LeadId, patch: LeadPatch) -> AppResult<Option<LeadRecord>> {
        self.update_impl(lead_id, patch).await
    }

    async fn delete(&self, lead_id: LeadId) -> AppResult<()> {
        self.delete_impl(lead_id).await
    }
}

#[cfg(test)]
mod tests;
