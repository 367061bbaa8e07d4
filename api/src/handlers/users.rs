//! User handlers
//!
//! Endpoints for the authenticated user's own account.

use axum::{extract::State, Extension, Json};
use serde::Deserialize;

use crate::app::{ProfileUpdate, UserStats};
use crate::domain::entities::User;
use crate::error::AppError;
use crate::handlers::MessageResponse;
use crate::AppState;

/// Request to update the profile; omitted fields stay as they are
#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub avatar: Option<String>,
    pub password: Option<String>,
}

/// GET /users/me
pub async fn me(Extension(user): Extension<User>) -> Json<User> {
    Json(user)
}

/// PUT /users/update
pub async fn update_me(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(request): Json<UpdateUserRequest>,
) -> Result<Json<User>, AppError> {
    let updated = state
        .user_service
        .update(
            &user,
            ProfileUpdate {
                name: request.name,
                email: request.email,
                avatar: request.avatar,
                password: request.password,
            },
        )
        .await?;

    Ok(Json(updated))
}

/// POST /users/disable
pub async fn disable_me(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<MessageResponse>, AppError> {
    state.user_service.disable(&user).await?;
    Ok(Json(MessageResponse::new("User account disabled successfully")))
}

/// GET /users/stats
pub async fn my_stats(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<UserStats>, AppError> {
    Ok(Json(state.user_service.stats(&user).await?))
}
