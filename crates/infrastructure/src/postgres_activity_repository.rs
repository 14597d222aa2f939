//! PostgreSQL-backed activity repository.
//!
//! Author joins are LEFT JOINs: an activity whose author row is gone still
//! shows up, with the author absent.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use leadflow_application::{
    ActivityRecord, ActivityRepository, ActivityWithAuthor, LeadVisibility, NewActivity,
    UserRecord,
};
use leadflow_core::{AppError, AppResult, Role, UserId};
use leadflow_domain::{ActivityId, ActivityType, LeadId};

/// PostgreSQL implementation of the activity repository port.
#[derive(Clone)]
pub struct PostgresActivityRepository {
    pool: PgPool,
}

impl PostgresActivityRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ActivityRow {
    id: i64,
    lead_id: i64,
    user_id: i64,
    activity_type: String,
    subject: String,
    notes: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<ActivityRow> for ActivityRecord {
    type Error = AppError;

    fn try_from(row: ActivityRow) -> AppResult<Self> {
        Ok(Self {
            id: ActivityId::from_i64(row.id),
            lead_id: LeadId::from_i64(row.lead_id),
            user_id: UserId::from_i64(row.user_id),
            activity_type: ActivityType::parse(row.activity_type.as_str()).map_err(|_| {
                AppError::Internal(format!(
                    "corrupt activity type value '{}'",
                    row.activity_type
                ))
            })?,
            subject: row.subject,
            notes: row.notes,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ActivityAuthorRow {
    #[sqlx(flatten)]
    activity: ActivityRow,
    author_user_id: Option<i64>,
    author_username: Option<String>,
    author_email: Option<String>,
    author_full_name: Option<String>,
    author_role: Option<String>,
    author_created_at: Option<DateTime<Utc>>,
}

impl TryFrom<ActivityAuthorRow> for ActivityWithAuthor {
    type Error = AppError;

    fn try_from(row: ActivityAuthorRow) -> AppResult<Self> {
        let user = match (
            row.author_user_id,
            row.author_username,
            row.author_email,
            row.author_full_name,
            row.author_role,
            row.author_created_at,
        ) {
            (Some(id), Some(username), Some(email), Some(full_name), Some(role), Some(created_at)) => {
                Some(UserRecord {
                    id: UserId::from_i64(id),
                    username,
                    email,
                    full_name,
                    role: Role::parse(role.as_str())
                        .map_err(|_| AppError::Internal(format!("corrupt role value '{role}'")))?,
                    created_at,
                })
            }
            _ => None,
        };

        Ok(Self {
            activity: ActivityRecord::try_from(row.activity)?,
            user,
        })
    }
}

const ACTIVITY_COLUMNS: &str =
    "a.id, a.lead_id, a.user_id, a.activity_type, a.subject, a.notes, a.created_at";

const AUTHOR_COLUMNS: &str = "u.id AS author_user_id, u.username AS author_username, \
     u.email AS author_email, u.full_name AS author_full_name, u.role AS author_role, \
     u.created_at AS author_created_at";

#[async_trait]
impl ActivityRepository for PostgresActivityRepository {
    async fn create(&self, activity: NewActivity) -> AppResult<ActivityRecord> {
        let row = sqlx::query_as::<_, ActivityRow>(&format!(
            r#"
            INSERT INTO activities (lead_id, user_id, activity_type, subject, notes)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {ACTIVITY_COLUMNS}
            "#
        ))
        .bind(activity.lead_id.as_i64())
        .bind(activity.user_id.as_i64())
        .bind(activity.activity_type.as_str())
        .bind(activity.subject.as_str())
        .bind(activity.notes.as_deref())
        .fetch_one(&self.pool)
        .await
        .map_err(reference_or_internal)?;

        ActivityRecord::try_from(row)
    }

    async fn list_for_lead(&self, lead_id: LeadId) -> AppResult<Vec<ActivityWithAuthor>> {
        let rows = sqlx::query_as::<_, ActivityAuthorRow>(&format!(
            r#"
            SELECT {ACTIVITY_COLUMNS}, {AUTHOR_COLUMNS}
            FROM activities a
            LEFT JOIN users u ON u.id = a.user_id
            WHERE a.lead_id = $1
            ORDER BY a.created_at DESC, a.id DESC
            "#
        ))
        .bind(lead_id.as_i64())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list activities: {error}")))?;

        rows.into_iter().map(ActivityWithAuthor::try_from).collect()
    }

    async fn list_visible(&self, visibility: LeadVisibility) -> AppResult<Vec<ActivityRecord>> {
        let owner_filter: Option<i64> = match visibility {
            LeadVisibility::All => None,
            LeadVisibility::OwnedBy(owner) => Some(owner.as_i64()),
        };

        let rows = sqlx::query_as::<_, ActivityRow>(&format!(
            r#"
            SELECT {ACTIVITY_COLUMNS}
            FROM activities a
            JOIN leads l ON l.id = a.lead_id
            WHERE ($1::BIGINT IS NULL OR l.owner_id = $1)
            ORDER BY a.created_at DESC, a.id DESC
            "#
        ))
        .bind(owner_filter)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list visible activities: {error}"))
        })?;

        rows.into_iter().map(ActivityRecord::try_from).collect()
    }
}

fn reference_or_internal(error: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(ref database_error) = error
        && database_error.code().as_deref() == Some("23503")
    {
        return AppError::Validation(
            "leadId and userId must reference existing rows".to_owned(),
        );
    }

    AppError::Internal(format!("failed to create activity: {error}"))
}
