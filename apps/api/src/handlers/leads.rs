use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use leadflow_core::UserIdentity;
use leadflow_domain::LeadId;

use crate::dto::{
    ActivityResponse, CreateLeadRequest, LeadDetailResponse, LeadResponse, UpdateLeadRequest,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_leads_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<Vec<LeadResponse>>> {
    let leads = state
        .lead_service
        .list(&user)
        .await?
        .into_iter()
        .map(LeadResponse::from)
        .collect();

    Ok(Json(leads))
}

pub async fn get_lead_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(lead_id): Path<i64>,
) -> ApiResult<Json<LeadDetailResponse>> {
    let detail = state
        .lead_service
        .get(&user, LeadId::from_i64(lead_id))
        .await?;

    Ok(Json(LeadDetailResponse::from(detail)))
}

pub async fn create_lead_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<CreateLeadRequest>,
) -> ApiResult<(StatusCode, Json<LeadResponse>)> {
    let created = state.lead_service.create(&user, payload.into()).await?;

    Ok((StatusCode::CREATED, Json(LeadResponse::from(created))))
}

pub async fn update_lead_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(lead_id): Path<i64>,
    Json(payload): Json<UpdateLeadRequest>,
) -> ApiResult<Json<LeadResponse>> {
    let updated = state
        .lead_service
        .update(&user, LeadId::from_i64(lead_id), payload.into())
        .await?;

    Ok(Json(LeadResponse::from(updated)))
}

pub async fn delete_lead_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(lead_id): Path<i64>,
) -> ApiResult<StatusCode> {
    state
        .lead_service
        .delete(&user, LeadId::from_i64(lead_id))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_lead_activities_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(lead_id): Path<i64>,
) -> ApiResult<Json<Vec<ActivityResponse>>> {
    let activities = state
        .activity_service
        .list_for_lead(&user, LeadId::from_i64(lead_id))
        .await?
        .into_iter()
        .map(ActivityResponse::from)
        .collect();

    Ok(Json(activities))
}
