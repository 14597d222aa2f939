//! Infrastructure adapters for Leadflow: PostgreSQL repositories and the
//! Argon2id password hasher.

#![forbid(unsafe_code)]

mod argon2_password_hasher;
mod postgres_activity_repository;
mod postgres_lead_repository;
mod postgres_user_repository;

pub use argon2_password_hasher::Argon2PasswordHasher;
pub use postgres_activity_repository::PostgresActivityRepository;
pub use postgres_lead_repository::PostgresLeadRepository;
pub use postgres_user_repository::PostgresUserRepository;
