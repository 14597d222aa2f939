//! Integration tests against a real PostgreSQL instance.
//!
//! Gated on `DATABASE_URL`: when the variable is absent the tests return
//! early so the suite stays green on machines without a database.

use std::sync::atomic::{AtomicI64, Ordering};

use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;

use leadflow_application::{
    ActivityRepository, LeadPatch, LeadRepository, LeadVisibility, NewActivity, NewLead, NewUser,
    UserRecord, UserRepository,
};
use leadflow_core::{AppError, Role, UserId};
use leadflow_domain::{ActivityType, LeadId, LeadStatus};

use super::PostgresLeadRepository;
use crate::postgres_activity_repository::PostgresActivityRepository;
use crate::postgres_user_repository::PostgresUserRepository;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

static UNIQUE: AtomicI64 = AtomicI64::new(0);

async fn test_pool() -> Option<PgPool> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        return None;
    };

    let pool = match PgPoolOptions::new()
        .max_connections(2)
        .connect(database_url.as_str())
        .await
    {
        Ok(pool) => pool,
        Err(error) => panic!("failed to connect to DATABASE_URL in test: {error}"),
    };

    if let Err(error) = MIGRATOR.run(&pool).await {
        panic!("failed to run migrations for postgres lead tests: {error}");
    }

    Some(pool)
}

fn unique_tag() -> String {
    let counter = UNIQUE.fetch_add(1, Ordering::Relaxed);
    format!("{}-{}", std::process::id(), counter)
}

async fn seed_user(pool: &PgPool, role: Role) -> UserRecord {
    let tag = unique_tag();
    let created = PostgresUserRepository::new(pool.clone())
        .create(NewUser {
            username: format!("user-{tag}"),
            email: format!("user-{tag}@example.com"),
            full_name: format!("User {tag}"),
            password_hash: "$argon2id$test".to_owned(),
            role,
        })
        .await;

    match created {
        Ok(user) => user,
        Err(error) => panic!("failed to seed user: {error}"),
    }
}

fn new_lead(owner: UserId) -> NewLead {
    NewLead {
        company_name: "Acme".to_owned(),
        contact_name: "Jane Doe".to_owned(),
        email: "jane@acme.example".to_owned(),
        phone: Some("+1 555 0100".to_owned()),
        status: LeadStatus::New,
        source: "website".to_owned(),
        value: Some(10_000),
        owner_id: owner,
    }
}

#[tokio::test]
async fn visibility_filter_is_applied_inside_the_store() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let repository = PostgresLeadRepository::new(pool.clone());

    let alice = seed_user(&pool, Role::SalesExecutive).await;
    let bob = seed_user(&pool, Role::SalesExecutive).await;
    let Ok(_) = repository.create(new_lead(alice.id)).await else {
        panic!("create should succeed");
    };
    let Ok(_) = repository.create(new_lead(bob.id)).await else {
        panic!("create should succeed");
    };

    let scoped = repository
        .list(LeadVisibility::OwnedBy(alice.id))
        .await
        .unwrap_or_default();
    assert!(!scoped.is_empty());
    assert!(scoped.iter().all(|lead| lead.lead.owner_id == alice.id));
}

#[tokio::test]
async fn owner_join_carries_the_sanitized_owner() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let repository = PostgresLeadRepository::new(pool.clone());

    let alice = seed_user(&pool, Role::SalesExecutive).await;
    let Ok(created) = repository.create(new_lead(alice.id)).await else {
        panic!("create should succeed");
    };

    let found = repository.find_with_owner(created.id).await;
    let Ok(Some(found)) = found else {
        panic!("lead should be found");
    };
    assert_eq!(found.owner.map(|owner| owner.id), Some(alice.id));
}

#[tokio::test]
async fn created_fields_round_trip_through_a_read() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let repository = PostgresLeadRepository::new(pool.clone());

    let alice = seed_user(&pool, Role::SalesExecutive).await;
    let Ok(created) = repository.create(new_lead(alice.id)).await else {
        panic!("create should succeed");
    };

    let found = repository.find(created.id).await;
    let Ok(Some(found)) = found else {
        panic!("lead should be found");
    };
    assert_eq!(found, created);
    assert_eq!(found.phone.as_deref(), Some("+1 555 0100"));
    assert_eq!(found.value, Some(10_000));
}

#[tokio::test]
async fn empty_update_still_refreshes_updated_at() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let repository = PostgresLeadRepository::new(pool.clone());

    let alice = seed_user(&pool, Role::SalesExecutive).await;
    let Ok(created) = repository.create(new_lead(alice.id)).await else {
        panic!("create should succeed");
    };

    let updated = repository.update(created.id, LeadPatch::default()).await;
    let Ok(Some(updated)) = updated else {
        panic!("update should succeed");
    };
    assert_eq!(updated.status, created.status);
    assert!(updated.updated_at >= created.updated_at);
}

#[tokio::test]
async fn update_merges_only_provided_fields() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let repository = PostgresLeadRepository::new(pool.clone());

    let alice = seed_user(&pool, Role::SalesExecutive).await;
    let Ok(created) = repository.create(new_lead(alice.id)).await else {
        panic!("create should succeed");
    };

    let updated = repository
        .update(
            created.id,
            LeadPatch {
                status: Some(LeadStatus::Won),
                ..LeadPatch::default()
            },
        )
        .await;
    let Ok(Some(updated)) = updated else {
        panic!("update should succeed");
    };
    assert_eq!(updated.status, LeadStatus::Won);
    assert_eq!(updated.company_name, created.company_name);
    assert_eq!(updated.owner_id, created.owner_id);
}

#[tokio::test]
async fn update_of_missing_lead_returns_none() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let repository = PostgresLeadRepository::new(pool.clone());

    let result = repository
        .update(LeadId::from_i64(-1), LeadPatch::default())
        .await;
    assert!(matches!(result, Ok(None)));
}

#[tokio::test]
async fn delete_cascades_all_activities_atomically() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let leads = PostgresLeadRepository::new(pool.clone());
    let activities = PostgresActivityRepository::new(pool.clone());

    let alice = seed_user(&pool, Role::SalesExecutive).await;
    let Ok(created) = leads.create(new_lead(alice.id)).await else {
        panic!("create should succeed");
    };
    for subject in ["first", "second", "third"] {
        let logged = activities
            .create(NewActivity {
                lead_id: created.id,
                user_id: alice.id,
                activity_type: ActivityType::Note,
                subject: subject.to_owned(),
                notes: None,
            })
            .await;
        assert!(logged.is_ok());
    }

    assert!(leads.delete(created.id).await.is_ok());

    let found = leads.find(created.id).await;
    assert!(matches!(found, Ok(None)));

    let leftovers = activities.list_for_lead(created.id).await.unwrap_or_default();
    assert!(leftovers.is_empty());
}

#[tokio::test]
async fn create_with_unknown_owner_is_a_validation_error() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let repository = PostgresLeadRepository::new(pool.clone());

    let result = repository.create(new_lead(UserId::from_i64(-1))).await;
    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn duplicate_usernames_conflict() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let users = PostgresUserRepository::new(pool.clone());

    let alice = seed_user(&pool, Role::SalesExecutive).await;
    let result = users
        .create(NewUser {
            username: alice.username.clone(),
            email: format!("other-{}@example.com", unique_tag()),
            full_name: "Other".to_owned(),
            password_hash: "$argon2id$test".to_owned(),
            role: Role::SalesExecutive,
        })
        .await;
    assert!(matches!(result, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn activities_are_listed_newest_first_with_author() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let leads = PostgresLeadRepository::new(pool.clone());
    let activities = PostgresActivityRepository::new(pool.clone());

    let alice = seed_user(&pool, Role::SalesExecutive).await;
    let Ok(created) = leads.create(new_lead(alice.id)).await else {
        panic!("create should succeed");
    };
    for subject in ["first", "second"] {
        let logged = activities
            .create(NewActivity {
                lead_id: created.id,
                user_id: alice.id,
                activity_type: ActivityType::Call,
                subject: subject.to_owned(),
                notes: Some("notes".to_owned()),
            })
            .await;
        assert!(logged.is_ok());
    }

    let history = activities.list_for_lead(created.id).await.unwrap_or_default();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].activity.subject, "second");
    assert_eq!(
        history[0].user.as_ref().map(|user| user.id),
        Some(alice.id)
    );
}
