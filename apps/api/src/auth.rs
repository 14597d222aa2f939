//! Session authentication handlers: register, login, logout, me.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use leadflow_application::{RegisterUser, UserService};
use leadflow_core::{AppError, UserIdentity};
use tower_sessions::Session;

use crate::dto::{IdentityResponse, LoginRequest, RegisterRequest, UserResponse};
use crate::error::ApiResult;
use crate::state::AppState;

/// Session key holding the authenticated [`UserIdentity`].
pub const SESSION_USER_KEY: &str = "leadflow.user";

pub async fn register_handler(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    let user = state
        .user_service
        .register(RegisterUser {
            username: payload.username,
            email: payload.email,
            full_name: payload.full_name,
            password: payload.password,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

pub async fn login_handler(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<UserResponse>> {
    let user = state
        .user_service
        .login(payload.username.as_str(), payload.password.as_str())
        .await?;

    // Fresh session id on privilege change (OWASP session fixation).
    session
        .cycle_id()
        .await
        .map_err(|error| AppError::Internal(format!("failed to cycle session id: {error}")))?;
    session
        .insert(SESSION_USER_KEY, UserService::identity_for(&user))
        .await
        .map_err(|error| AppError::Internal(format!("failed to persist session: {error}")))?;

    Ok(Json(UserResponse::from(user)))
}

pub async fn logout_handler(session: Session) -> ApiResult<StatusCode> {
    session
        .delete()
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete session: {error}")))?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn me_handler(session: Session) -> ApiResult<Json<IdentityResponse>> {
    let identity = session
        .get::<UserIdentity>(SESSION_USER_KEY)
        .await
        .map_err(|error| AppError::Internal(format!("failed to read session identity: {error}")))?
        .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))?;

    Ok(Json(IdentityResponse::from(identity)))
}
