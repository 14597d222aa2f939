//! In-memory fakes shared by the service test suites.

use std::sync::Mutex as StdMutex;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use leadflow_core::{AppError, AppResult, Role, UserId, UserIdentity};
use leadflow_domain::{ActivityId, LeadId};

use crate::access::LeadVisibility;
use crate::activity_service::{ActivityRecord, ActivityRepository, ActivityWithAuthor, NewActivity};
use crate::change_notifier::{ChangeEvent, ChangeNotifier};
use crate::lead_service::{LeadPatch, LeadRecord, LeadRepository, LeadWithOwner, NewLead};
use crate::user_service::{NewUser, PasswordHasher, UserCredentials, UserRecord, UserRepository};

#[derive(Default)]
struct State {
    users: Vec<(UserRecord, String)>,
    leads: Vec<LeadRecord>,
    activities: Vec<ActivityRecord>,
    next_user: i64,
    next_lead: i64,
    next_activity: i64,
}

/// In-memory implementation of all three repository ports behind one lock,
/// so the lead delete cascade is atomic exactly like the real store.
#[derive(Default)]
pub(crate) struct InMemoryStore {
    state: Mutex<State>,
}

impl State {
    fn owner_of(&self, lead_id: LeadId) -> Option<UserId> {
        self.leads
            .iter()
            .find(|lead| lead.id == lead_id)
            .map(|lead| lead.owner_id)
    }

    fn user(&self, user_id: UserId) -> Option<UserRecord> {
        self.users
            .iter()
            .find(|(user, _)| user.id == user_id)
            .map(|(user, _)| user.clone())
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_by_id(&self, user_id: UserId) -> AppResult<Option<UserRecord>> {
        Ok(self.state.lock().await.user(user_id))
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<UserRecord>> {
        Ok(self
            .state
            .lock()
            .await
            .users
            .iter()
            .find(|(user, _)| user.username == username)
            .map(|(user, _)| user.clone()))
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<UserRecord>> {
        Ok(self
            .state
            .lock()
            .await
            .users
            .iter()
            .find(|(user, _)| user.email.eq_ignore_ascii_case(email))
            .map(|(user, _)| user.clone()))
    }

    async fn find_credentials_by_username(
        &self,
        username: &str,
    ) -> AppResult<Option<UserCredentials>> {
        Ok(self
            .state
            .lock()
            .await
            .users
            .iter()
            .find(|(user, _)| user.username == username)
            .map(|(user, hash)| UserCredentials {
                user: user.clone(),
                password_hash: hash.clone(),
            }))
    }

    async fn create(&self, user: NewUser) -> AppResult<UserRecord> {
        let mut state = self.state.lock().await;
        if state.users.iter().any(|(row, _)| row.username == user.username) {
            return Err(AppError::Conflict("this username is taken".to_owned()));
        }
        if state.users.iter().any(|(row, _)| row.email == user.email) {
            return Err(AppError::Conflict(
                "an account with this email already exists".to_owned(),
            ));
        }

        state.next_user += 1;
        let record = UserRecord {
            id: UserId::from_i64(state.next_user),
            username: user.username,
            email: user.email,
            full_name: user.full_name,
            role: user.role,
            created_at: Utc::now(),
        };
        state.users.push((record.clone(), user.password_hash));

        Ok(record)
    }

    async fn list(&self) -> AppResult<Vec<UserRecord>> {
        let state = self.state.lock().await;
        let mut users: Vec<UserRecord> = state.users.iter().map(|(user, _)| user.clone()).collect();
        users.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(users)
    }

    async fn count(&self) -> AppResult<i64> {
        Ok(self.state.lock().await.users.len() as i64)
    }
}

#[async_trait]
impl LeadRepository for InMemoryStore {
    async fn list(&self, visibility: LeadVisibility) -> AppResult<Vec<LeadWithOwner>> {
        let state = self.state.lock().await;
        let mut leads: Vec<LeadWithOwner> = state
            .leads
            .iter()
            .filter(|lead| match visibility {
                LeadVisibility::All => true,
                LeadVisibility::OwnedBy(owner) => lead.owner_id == owner,
            })
            .map(|lead| LeadWithOwner {
                lead: lead.clone(),
                owner: state.user(lead.owner_id),
            })
            .collect();
        leads.sort_by(|a, b| b.lead.id.cmp(&a.lead.id));
        Ok(leads)
    }

    async fn find(&self, lead_id: LeadId) -> AppResult<Option<LeadRecord>> {
        Ok(self
            .state
            .lock()
            .await
            .leads
            .iter()
            .find(|lead| lead.id == lead_id)
            .cloned())
    }

    async fn find_with_owner(&self, lead_id: LeadId) -> AppResult<Option<LeadWithOwner>> {
        let state = self.state.lock().await;
        Ok(state
            .leads
            .iter()
            .find(|lead| lead.id == lead_id)
            .map(|lead| LeadWithOwner {
                lead: lead.clone(),
                owner: state.user(lead.owner_id),
            }))
    }

    async fn create(&self, lead: NewLead) -> AppResult<LeadRecord> {
        let mut state = self.state.lock().await;
        state.next_lead += 1;
        let now = Utc::now();
        let record = LeadRecord {
            id: LeadId::from_i64(state.next_lead),
            company_name: lead.company_name,
            contact_name: lead.contact_name,
            email: lead.email,
            phone: lead.phone,
            status: lead.status,
            source: lead.source,
            value: lead.value,
            owner_id: lead.owner_id,
            created_at: now,
            updated_at: now,
        };
        state.leads.push(record.clone());

        Ok(record)
    }

    async fn update(&self, lead_id: LeadId, patch: LeadPatch) -> AppResult<Option<LeadRecord>> {
        let mut state = self.state.lock().await;
        let Some(lead) = state.leads.iter_mut().find(|lead| lead.id == lead_id) else {
            return Ok(None);
        };

        if let Some(company_name) = patch.company_name {
            lead.company_name = company_name;
        }
        if let Some(contact_name) = patch.contact_name {
            lead.contact_name = contact_name;
        }
        if let Some(email) = patch.email {
            lead.email = email;
        }
        if let Some(phone) = patch.phone {
            lead.phone = Some(phone);
        }
        if let Some(status) = patch.status {
            lead.status = status;
        }
        if let Some(source) = patch.source {
            lead.source = source;
        }
        if let Some(value) = patch.value {
            lead.value = Some(value);
        }
        if let Some(owner_id) = patch.owner_id {
            lead.owner_id = owner_id;
        }
        lead.updated_at = Utc::now();

        Ok(Some(lead.clone()))
    }

    async fn delete(&self, lead_id: LeadId) -> AppResult<()> {
        let mut state = self.state.lock().await;
        state.activities.retain(|activity| activity.lead_id != lead_id);
        state.leads.retain(|lead| lead.id != lead_id);
        Ok(())
    }
}

#[async_trait]
impl ActivityRepository for InMemoryStore {
    async fn create(&self, activity: NewActivity) -> AppResult<ActivityRecord> {
        let mut state = self.state.lock().await;
        state.next_activity += 1;
        let record = ActivityRecord {
            id: ActivityId::from_i64(state.next_activity),
            lead_id: activity.lead_id,
            user_id: activity.user_id,
            activity_type: activity.activity_type,
            subject: activity.subject,
            notes: activity.notes,
            created_at: Utc::now(),
        };
        state.activities.push(record.clone());

        Ok(record)
    }

    async fn list_for_lead(&self, lead_id: LeadId) -> AppResult<Vec<ActivityWithAuthor>> {
        let state = self.state.lock().await;
        let mut activities: Vec<ActivityWithAuthor> = state
            .activities
            .iter()
            .filter(|activity| activity.lead_id == lead_id)
            .map(|activity| ActivityWithAuthor {
                activity: activity.clone(),
                user: state.user(activity.user_id),
            })
            .collect();
        activities.sort_by(|a, b| b.activity.id.cmp(&a.activity.id));
        Ok(activities)
    }

    async fn list_visible(&self, visibility: LeadVisibility) -> AppResult<Vec<ActivityRecord>> {
        let state = self.state.lock().await;
        Ok(state
            .activities
            .iter()
            .filter(|activity| match visibility {
                LeadVisibility::All => true,
                LeadVisibility::OwnedBy(owner) => {
                    state.owner_of(activity.lead_id) == Some(owner)
                }
            })
            .cloned()
            .collect())
    }
}

/// Deterministic hasher for tests.
pub(crate) struct FakePasswordHasher;

impl PasswordHasher for FakePasswordHasher {
    fn hash_password(&self, password: &str) -> AppResult<String> {
        Ok(format!("hashed:{password}"))
    }

    fn verify_password(&self, password: &str, hash: &str) -> AppResult<bool> {
        Ok(hash == format!("hashed:{password}"))
    }
}

/// Notifier that records every published event.
#[derive(Default)]
pub(crate) struct FakeNotifier {
    events: StdMutex<Vec<ChangeEvent>>,
}

impl FakeNotifier {
    pub(crate) fn events(&self) -> Vec<ChangeEvent> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl ChangeNotifier for FakeNotifier {
    fn publish(&self, event: ChangeEvent) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event);
    }
}

/// Builds a synthetic identity without touching the store.
pub(crate) fn identity(id: i64, role: Role) -> UserIdentity {
    UserIdentity::new(
        UserId::from_i64(id),
        format!("user{id}"),
        format!("user{id}@example.com"),
        format!("User {id}"),
        role,
    )
}

/// Inserts a user directly through the repository port.
pub(crate) async fn seed_user(store: &InMemoryStore, username: &str, role: Role) -> UserRecord {
    let created = UserRepository::create(
        store,
        NewUser {
            username: username.to_owned(),
            email: format!("{username}@example.com"),
            full_name: format!("{username} Example"),
            password_hash: "hashed:irrelevant".to_owned(),
            role,
        },
    )
    .await;

    match created {
        Ok(user) => user,
        Err(error) => panic!("failed to seed user: {error}"),
    }
}

/// Inserts a lead directly through the repository port.
pub(crate) async fn seed_lead(
    store: &InMemoryStore,
    owner: UserId,
    status: leadflow_domain::LeadStatus,
) -> LeadRecord {
    let created = LeadRepository::create(
        store,
        NewLead {
            company_name: "Acme".to_owned(),
            contact_name: "Jane Doe".to_owned(),
            email: "jane@acme.example".to_owned(),
            phone: None,
            status,
            source: "website".to_owned(),
            value: Some(10_000),
            owner_id: owner,
        },
    )
    .await;

    match created {
        Ok(lead) => lead,
        Err(error) => panic!("failed to seed lead: {error}"),
    }
}
