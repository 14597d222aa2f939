use std::sync::Arc;

use leadflow_core::{AppError, Role};
use leadflow_domain::{ActivityType, LeadId, LeadStatus};

use super::{ActivityService, LogActivity};
use crate::change_notifier::ChangeEvent;
use crate::testing::{FakeNotifier, InMemoryStore, seed_lead, seed_user};
use crate::user_service::UserService;

fn service(store: &Arc<InMemoryStore>, notifier: &Arc<FakeNotifier>) -> ActivityService {
    ActivityService::new(
        store.clone(),
        store.clone(),
        store.clone(),
        notifier.clone(),
    )
}

fn log_input(lead_id: LeadId) -> LogActivity {
    LogActivity {
        lead_id,
        activity_type: ActivityType::Call,
        subject: "Intro call".to_owned(),
        notes: Some("Spoke with the CTO".to_owned()),
    }
}

#[tokio::test]
async fn logging_attributes_the_caller_as_author() {
    let store = Arc::new(InMemoryStore::default());
    let notifier = Arc::new(FakeNotifier::default());
    let service = service(&store, &notifier);

    let alice = seed_user(&store, "alice", Role::SalesExecutive).await;
    let lead = seed_lead(&store, alice.id, LeadStatus::New).await;

    let logged = service
        .log(&UserService::identity_for(&alice), log_input(lead.id))
        .await;
    let Ok(logged) = logged else {
        panic!("log should succeed");
    };
    assert_eq!(logged.activity.user_id, alice.id);
    assert_eq!(logged.user.map(|user| user.id), Some(alice.id));
}

#[tokio::test]
async fn logging_against_missing_lead_is_not_found() {
    let store = Arc::new(InMemoryStore::default());
    let notifier = Arc::new(FakeNotifier::default());
    let service = service(&store, &notifier);

    let alice = seed_user(&store, "alice", Role::SalesExecutive).await;
    let result = service
        .log(
            &UserService::identity_for(&alice),
            log_input(LeadId::from_i64(999)),
        )
        .await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn logging_against_foreign_lead_is_forbidden_for_sales_executives() {
    let store = Arc::new(InMemoryStore::default());
    let notifier = Arc::new(FakeNotifier::default());
    let service = service(&store, &notifier);

    let alice = seed_user(&store, "alice", Role::SalesExecutive).await;
    let bob = seed_user(&store, "bob", Role::SalesExecutive).await;
    let lead = seed_lead(&store, alice.id, LeadStatus::New).await;

    let result = service
        .log(&UserService::identity_for(&bob), log_input(lead.id))
        .await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn managers_may_log_against_any_lead() {
    let store = Arc::new(InMemoryStore::default());
    let notifier = Arc::new(FakeNotifier::default());
    let service = service(&store, &notifier);

    let manager = seed_user(&store, "mallory", Role::Manager).await;
    let alice = seed_user(&store, "alice", Role::SalesExecutive).await;
    let lead = seed_lead(&store, alice.id, LeadStatus::New).await;

    let logged = service
        .log(&UserService::identity_for(&manager), log_input(lead.id))
        .await;
    assert!(logged.is_ok());
}

#[tokio::test]
async fn empty_subject_is_rejected() {
    let store = Arc::new(InMemoryStore::default());
    let notifier = Arc::new(FakeNotifier::default());
    let service = service(&store, &notifier);

    let alice = seed_user(&store, "alice", Role::SalesExecutive).await;
    let lead = seed_lead(&store, alice.id, LeadStatus::New).await;

    let mut input = log_input(lead.id);
    input.subject = "   ".to_owned();
    let result = service
        .log(&UserService::identity_for(&alice), input)
        .await;
    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn unknown_activity_types_are_preserved() {
    let store = Arc::new(InMemoryStore::default());
    let notifier = Arc::new(FakeNotifier::default());
    let service = service(&store, &notifier);

    let alice = seed_user(&store, "alice", Role::SalesExecutive).await;
    let lead = seed_lead(&store, alice.id, LeadStatus::New).await;

    let mut input = log_input(lead.id);
    input.activity_type = ActivityType::Other("demo".to_owned());
    let logged = service
        .log(&UserService::identity_for(&alice), input)
        .await;
    assert_eq!(
        logged.ok().map(|logged| logged.activity.activity_type),
        Some(ActivityType::Other("demo".to_owned()))
    );
}

#[tokio::test]
async fn history_is_listed_newest_first() {
    let store = Arc::new(InMemoryStore::default());
    let notifier = Arc::new(FakeNotifier::default());
    let service = service(&store, &notifier);

    let alice = seed_user(&store, "alice", Role::SalesExecutive).await;
    let lead = seed_lead(&store, alice.id, LeadStatus::New).await;
    let identity = UserService::identity_for(&alice);

    for subject in ["first", "second", "third"] {
        let mut input = log_input(lead.id);
        input.subject = subject.to_owned();
        assert!(service.log(&identity, input).await.is_ok());
    }

    let history = service
        .list_for_lead(&identity, lead.id)
        .await
        .unwrap_or_default();
    let subjects: Vec<&str> = history
        .iter()
        .map(|entry| entry.activity.subject.as_str())
        .collect();
    assert_eq!(subjects, ["third", "second", "first"]);
}

#[tokio::test]
async fn logging_publishes_activity_created() {
    let store = Arc::new(InMemoryStore::default());
    let notifier = Arc::new(FakeNotifier::default());
    let service = service(&store, &notifier);

    let alice = seed_user(&store, "alice", Role::SalesExecutive).await;
    let lead = seed_lead(&store, alice.id, LeadStatus::New).await;

    let logged = service
        .log(&UserService::identity_for(&alice), log_input(lead.id))
        .await;
    assert!(logged.is_ok());

    let events = notifier.events();
    assert_eq!(events.len(), 1);
    assert!(matches!(events[0], ChangeEvent::ActivityCreated(_)));
}
