//! User ports and application service.
//!
//! Owns user provisioning, authentication, and directory reads. Follows
//! OWASP guidance: generic login failures and password hashing on every
//! attempt to avoid timing side-channels.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use leadflow_core::{AppError, AppResult, Role, UserId, UserIdentity};
use leadflow_domain::{EmailAddress, Username, validate_password};

use crate::access::{self, Operation};

// ---------------------------------------------------------------------------
// Ports
// ---------------------------------------------------------------------------

/// Sanitized user record returned by every repository read path.
///
/// Carries no credential material; serializing one can never leak the stored
/// hash because the hash is not part of the type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    /// Stable numeric identifier.
    pub id: UserId,
    /// Unique login name.
    pub username: String,
    /// Unique email address.
    pub email: String,
    /// Display name.
    pub full_name: String,
    /// Access role.
    pub role: Role,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Stored credential row, visible only to the login path.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    /// Sanitized account fields.
    pub user: UserRecord,
    /// Argon2id PHC string (salt embedded).
    pub password_hash: String,
}

/// Fields for a new user row.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Unique login name (validated, lowercase).
    pub username: String,
    /// Unique email address (validated, lowercase).
    pub email: String,
    /// Display name.
    pub full_name: String,
    /// Argon2id PHC string.
    pub password_hash: String,
    /// Access role.
    pub role: Role,
}

/// Repository port for user persistence.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Finds a user by their unique identifier.
    async fn find_by_id(&self, user_id: UserId) -> AppResult<Option<UserRecord>>;

    /// Finds a user by username (exact match on the stored lowercase form).
    async fn find_by_username(&self, username: &str) -> AppResult<Option<UserRecord>>;

    /// Finds a user by email (case-insensitive).
    async fn find_by_email(&self, email: &str) -> AppResult<Option<UserRecord>>;

    /// Returns the stored credentials for a username. Only the login path
    /// may call this; the hash never travels further than verification.
    async fn find_credentials_by_username(
        &self,
        username: &str,
    ) -> AppResult<Option<UserCredentials>>;

    /// Creates a user. Fails with `Conflict` when the username or email is
    /// already taken.
    async fn create(&self, user: NewUser) -> AppResult<UserRecord>;

    /// Lists all users, newest first.
    async fn list(&self) -> AppResult<Vec<UserRecord>>;

    /// Returns the total number of user rows.
    async fn count(&self) -> AppResult<i64>;
}

/// Port for password hashing operations. Keeps the application layer free of
/// direct cryptographic library coupling.
pub trait PasswordHasher: Send + Sync {
    /// Hashes a plaintext password using Argon2id.
    fn hash_password(&self, password: &str) -> AppResult<String>;

    /// Verifies a plaintext password against a stored hash.
    /// Must run in constant time regardless of validity.
    fn verify_password(&self, password: &str, hash: &str) -> AppResult<bool>;
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Parameters for user registration.
#[derive(Debug, Clone)]
pub struct RegisterUser {
    /// Requested login name.
    pub username: String,
    /// Email address for the new account.
    pub email: String,
    /// Display name.
    pub full_name: String,
    /// Plaintext password (validated against OWASP rules).
    pub password: String,
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// Application service for user provisioning and authentication.
#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserRepository>,
    password_hasher: Arc<dyn PasswordHasher>,
}

impl UserService {
    /// Creates a new user service.
    #[must_use]
    pub fn new(users: Arc<dyn UserRepository>, password_hasher: Arc<dyn PasswordHasher>) -> Self {
        Self {
            users,
            password_hasher,
        }
    }

    /// Registers a new user.
    ///
    /// The very first account becomes `admin` so a fresh deployment can be
    /// administered; every later registration is a `sales_executive` until an
    /// admin changes it.
    pub async fn register(&self, params: RegisterUser) -> AppResult<UserRecord> {
        let username = Username::new(&params.username)?;
        let email = EmailAddress::new(&params.email)?;
        if params.full_name.trim().is_empty() {
            return Err(AppError::Validation(
                "full name must not be empty".to_owned(),
            ));
        }
        validate_password(&params.password)?;

        if self
            .users
            .find_by_username(username.as_str())
            .await?
            .is_some()
        {
            // Still hash the password to keep response timing uniform.
            let _ = self.password_hasher.hash_password(&params.password);
            return Err(AppError::Conflict("this username is taken".to_owned()));
        }

        if self.users.find_by_email(email.as_str()).await?.is_some() {
            let _ = self.password_hasher.hash_password(&params.password);
            return Err(AppError::Conflict(
                "an account with this email already exists".to_owned(),
            ));
        }

        let role = if self.users.count().await? == 0 {
            Role::Admin
        } else {
            Role::SalesExecutive
        };

        let password_hash = self.password_hasher.hash_password(&params.password)?;
        self.users
            .create(NewUser {
                username: username.as_str().to_owned(),
                email: email.as_str().to_owned(),
                full_name: params.full_name.trim().to_owned(),
                password_hash,
                role,
            })
            .await
    }

    /// Authenticates a user with username and password.
    ///
    /// Fails with a generic `Unauthorized` for any cause (unknown username,
    /// wrong password) to prevent account enumeration.
    pub async fn login(&self, username: &str, password: &str) -> AppResult<UserRecord> {
        let credentials = self
            .users
            .find_credentials_by_username(username.trim().to_lowercase().as_str())
            .await?;

        let Some(credentials) = credentials else {
            // Hash anyway so unknown usernames take as long as wrong passwords.
            let _ = self.password_hasher.hash_password(password);
            return Err(AppError::Unauthorized(
                "invalid username or password".to_owned(),
            ));
        };

        let valid = self
            .password_hasher
            .verify_password(password, credentials.password_hash.as_str())?;

        if !valid {
            return Err(AppError::Unauthorized(
                "invalid username or password".to_owned(),
            ));
        }

        Ok(credentials.user)
    }

    /// Lists all users, newest first. Admin only.
    pub async fn list_users(&self, identity: &UserIdentity) -> AppResult<Vec<UserRecord>> {
        access::require(identity, Operation::ReadUsers)?;
        self.users.list().await
    }

    /// Returns a user record by ID, if it exists.
    pub async fn find_by_id(&self, user_id: UserId) -> AppResult<Option<UserRecord>> {
        self.users.find_by_id(user_id).await
    }

    /// Builds the session identity for an authenticated user.
    #[must_use]
    pub fn identity_for(user: &UserRecord) -> UserIdentity {
        UserIdentity::new(
            user.id,
            user.username.clone(),
            user.email.clone(),
            user.full_name.clone(),
            user.role,
        )
    }
}
