use axum::Json;
use axum::extract::{Extension, State};
use leadflow_core::UserIdentity;

use crate::dto::UserResponse;
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_users_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<Vec<UserResponse>>> {
    let users = state
        .user_service
        .list_users(&user)
        .await?
        .into_iter()
        .map(UserResponse::from)
        .collect();

    Ok(Json(users))
}
