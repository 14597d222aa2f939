use axum::Json;
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use leadflow_core::UserIdentity;

use crate::dto::{ActivityResponse, CreateActivityRequest};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn create_activity_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<CreateActivityRequest>,
) -> ApiResult<(StatusCode, Json<ActivityResponse>)> {
    let logged = state.activity_service.log(&user, payload.into()).await?;

    Ok((StatusCode::CREATED, Json(ActivityResponse::from(logged))))
}
