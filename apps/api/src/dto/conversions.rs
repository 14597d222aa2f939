use leadflow_application::{
    ActivityWithAuthor, CreateLead, LeadDetail, LeadPatch, LeadWithOwner, LogActivity, UserRecord,
};
use leadflow_core::UserIdentity;

use super::types::{
    ActivityResponse, CreateActivityRequest, CreateLeadRequest, IdentityResponse,
    LeadDetailResponse, LeadResponse, UpdateLeadRequest, UserResponse,
};

impl From<UserRecord> for UserResponse {
    fn from(user: UserRecord) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            full_name: user.full_name,
            role: user.role,
            created_at: user.created_at,
        }
    }
}

impl From<UserIdentity> for IdentityResponse {
    fn from(identity: UserIdentity) -> Self {
        Self {
            id: identity.id(),
            username: identity.username().to_owned(),
            email: identity.email().to_owned(),
            full_name: identity.full_name().to_owned(),
            role: identity.role(),
        }
    }
}

impl From<LeadWithOwner> for LeadResponse {
    fn from(with_owner: LeadWithOwner) -> Self {
        let lead = with_owner.lead;
        Self {
            id: lead.id,
            company_name: lead.company_name,
            contact_name: lead.contact_name,
            email: lead.email,
            phone: lead.phone,
            status: lead.status,
            source: lead.source,
            value: lead.value,
            owner_id: lead.owner_id,
            created_at: lead.created_at,
            updated_at: lead.updated_at,
            owner: with_owner.owner.map(UserResponse::from),
        }
    }
}

impl From<LeadDetail> for LeadDetailResponse {
    fn from(detail: LeadDetail) -> Self {
        Self {
            lead: LeadResponse::from(LeadWithOwner {
                lead: detail.lead,
                owner: detail.owner,
            }),
            activities: detail
                .activities
                .into_iter()
                .map(ActivityResponse::from)
                .collect(),
        }
    }
}

impl From<ActivityWithAuthor> for ActivityResponse {
    fn from(with_author: ActivityWithAuthor) -> Self {
        let activity = with_author.activity;
        Self {
            id: activity.id,
            lead_id: activity.lead_id,
            user_id: activity.user_id,
            activity_type: activity.activity_type,
            subject: activity.subject,
            notes: activity.notes,
            created_at: activity.created_at,
            user: with_author.user.map(UserResponse::from),
        }
    }
}

impl From<CreateLeadRequest> for CreateLead {
    fn from(request: CreateLeadRequest) -> Self {
        Self {
            company_name: request.company_name,
            contact_name: request.contact_name,
            email: request.email,
            phone: request.phone,
            status: request.status,
            source: request.source,
            value: request.value,
            owner_id: request.owner_id,
        }
    }
}

impl From<UpdateLeadRequest> for LeadPatch {
    fn from(request: UpdateLeadRequest) -> Self {
        Self {
            company_name: request.company_name,
            contact_name: request.contact_name,
            email: request.email,
            phone: request.phone,
            status: request.status,
            source: request.source,
            value: request.value,
            owner_id: request.owner_id,
        }
    }
}

impl From<CreateActivityRequest> for LogActivity {
    fn from(request: CreateActivityRequest) -> Self {
        Self {
            lead_id: request.lead_id,
            activity_type: request.activity_type,
            subject: request.subject,
            notes: request.notes,
        }
    }
}
