use axum::Json;
use axum::extract::{Extension, State};
use leadflow_application::{AnalyticsReport, DashboardStats};
use leadflow_core::UserIdentity;

use crate::error::ApiResult;
use crate::state::AppState;

pub async fn stats_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<DashboardStats>> {
    Ok(Json(state.analytics_service.stats(&user).await?))
}

pub async fn analytics_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<AnalyticsReport>> {
    Ok(Json(state.analytics_service.analytics(&user).await?))
}
