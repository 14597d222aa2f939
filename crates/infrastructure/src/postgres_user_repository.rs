//! PostgreSQL-backed user repository.

use async_trait::async_trait;
use sqlx::PgPool;

use leadflow_application::{NewUser, UserCredentials, UserRecord, UserRepository};
use leadflow_core::{AppError, AppResult, Role, UserId};

/// PostgreSQL implementation of the user repository port.
#[derive(Clone)]
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i64,
    username: String,
    email: String,
    full_name: String,
    role: String,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl TryFrom<UserRow> for UserRecord {
    type Error = AppError;

    fn try_from(row: UserRow) -> AppResult<Self> {
        Ok(Self {
            id: UserId::from_i64(row.id),
            username: row.username,
            email: row.email,
            full_name: row.full_name,
            role: Role::parse(row.role.as_str())
                .map_err(|_| AppError::Internal(format!("corrupt role value '{}'", row.role)))?,
            created_at: row.created_at,
        })
    }
}

const USER_COLUMNS: &str = "id, username, email, full_name, role, created_at";

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_id(&self, user_id: UserId) -> AppResult<Option<UserRecord>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1 LIMIT 1"
        ))
        .bind(user_id.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find user by id: {error}")))?;

        row.map(UserRecord::try_from).transpose()
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<UserRecord>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1 LIMIT 1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find user by username: {error}")))?;

        row.map(UserRecord::try_from).transpose()
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<UserRecord>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = LOWER($1) LIMIT 1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find user by email: {error}")))?;

        row.map(UserRecord::try_from).transpose()
    }

    async fn find_credentials_by_username(
        &self,
        username: &str,
    ) -> AppResult<Option<UserCredentials>> {
        #[derive(sqlx::FromRow)]
        struct CredentialRow {
            #[sqlx(flatten)]
            user: UserRow,
            password_hash: String,
        }

        let row = sqlx::query_as::<_, CredentialRow>(&format!(
            "SELECT {USER_COLUMNS}, password_hash FROM users WHERE username = $1 LIMIT 1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load credentials: {error}")))?;

        row.map(|row| {
            Ok(UserCredentials {
                user: UserRecord::try_from(row.user)?,
                password_hash: row.password_hash,
            })
        })
        .transpose()
    }

    async fn create(&self, user: NewUser) -> AppResult<UserRecord> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO users (username, email, full_name, password_hash, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user.username.as_str())
        .bind(user.email.as_str())
        .bind(user.full_name.as_str())
        .bind(user.password_hash.as_str())
        .bind(user.role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(unique_conflict_or_internal)?;

        UserRecord::try_from(row)
    }

    async fn list(&self) -> AppResult<Vec<UserRecord>> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list users: {error}")))?;

        rows.into_iter().map(UserRecord::try_from).collect()
    }

    async fn count(&self) -> AppResult<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to count users: {error}")))
    }
}

fn unique_conflict_or_internal(error: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(ref database_error) = error
        && database_error.code().as_deref() == Some("23505")
    {
        let message = match database_error.constraint() {
            Some("users_username_key") => "this username is taken",
            _ => "an account with this email already exists",
        };
        return AppError::Conflict(message.to_owned());
    }

    AppError::Internal(format!("failed to create user: {error}"))
}
