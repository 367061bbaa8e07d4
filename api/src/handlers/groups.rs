//! Group handlers
//!
//! Endpoints for creating, joining and managing groups.

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::entities::{Group, GroupChanges, GroupId, GroupWithMembers, User};
use crate::error::AppError;
use crate::handlers::MessageResponse;
use crate::AppState;

/// Request to create a group
#[derive(Debug, Deserialize)]
pub struct CreateGroupRequest {
    pub name: String,
    pub icon: Option<String>,
}

/// Request to update a group; omitted fields stay as they are
#[derive(Debug, Default, Deserialize)]
pub struct UpdateGroupRequest {
    pub name: Option<String>,
    pub icon: Option<String>,
}

/// POST /groups/create
pub async fn create_group(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateGroupRequest>,
) -> Result<Json<Group>, AppError> {
    let group = state
        .group_service
        .create(&user, &request.name, request.icon)
        .await?;

    Ok(Json(group))
}

/// POST /groups/join/:invite_code
pub async fn join_group(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(invite_code): Path<String>,
) -> Result<Json<Group>, AppError> {
    Ok(Json(state.group_service.join(&user, &invite_code).await?))
}

/// GET /groups/my
pub async fn my_groups(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<Vec<Group>>, AppError> {
    Ok(Json(state.group_service.my_groups(&user).await?))
}

/// GET /groups/:id
pub async fn get_group(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<Json<GroupWithMembers>, AppError> {
    Ok(Json(state.group_service.details(&user, &GroupId(id)).await?))
}

/// PUT /groups/:id
pub async fn update_group(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateGroupRequest>,
) -> Result<Json<Group>, AppError> {
    let group = state
        .group_service
        .update(
            &user,
            &GroupId(id),
            GroupChanges {
                name: request.name,
                icon: request.icon,
            },
        )
        .await?;

    Ok(Json(group))
}

/// DELETE /groups/:id
///
/// Deletes the group together with all of its expenses.
pub async fn delete_group(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    state.group_service.delete(&user, &GroupId(id)).await?;
    Ok(Json(MessageResponse::new("Group deleted successfully")))
}

/// GET /groups/:id/export
///
/// Download the group's expenses as a CSV attachment.
pub async fn export_group(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let group_id = GroupId(id);
    let csv = state.group_service.export_csv(&user, &group_id).await?;

    let headers = [
        (header::CONTENT_TYPE, "text/csv".to_string()),
        (header::CONTENT_DISPOSITION, attachment_header(&group_id)),
    ];
    Ok((headers, csv).into_response())
}

fn attachment_header(group_id: &GroupId) -> String {
    format!("attachment; filename=group_{}_expenses.csv", group_id)
}
