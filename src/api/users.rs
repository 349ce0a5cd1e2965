use crate::api::AppState;
use crate::api::schemas::health::MessageResponse;
use crate::api::schemas::users::{
    CreateUserRequest, ListUsersQuery, Pagination, UpdateUserRequest, UserListResponse, UserMessageResponse,
    UserResponse,
};
use crate::domain::user::UserUpdate;
use crate::error::{AppError, Result};
use crate::services::user_service::clamp_pagination;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};

pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<impl IntoResponse> {
    payload.validate().map_err(AppError::BadRequest)?;
    let user = state.user_service.create(&payload.email).await.map_err(|e| match e {
        AppError::Conflict(msg) => AppError::Conflict(msg),
        other => {
            tracing::error!(error = %other, "Failed to create user");
            AppError::Internal("Failed to create user".to_string())
        }
    })?;

    Ok((
        StatusCode::CREATED,
        Json(UserMessageResponse { message: "User created successfully".to_string(), user: user.into() }),
    ))
}

pub async fn list_users(State(state): State<AppState>, Query(query): Query<ListUsersQuery>) -> Result<impl IntoResponse> {
    let (page, limit) = query.parsed();
    let (page, limit) = clamp_pagination(page, limit);

    let result = state.user_service.list(page, limit).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to list users");
        AppError::Internal("Failed to retrieve users".to_string())
    })?;

    Ok(Json(UserListResponse {
        users: result.users.into_iter().map(UserResponse::from).collect(),
        pagination: Pagination { page: result.page, limit: result.limit, total: result.total },
    }))
}

pub async fn get_user(State(state): State<AppState>, Path(id): Path<String>) -> Result<impl IntoResponse> {
    let user = state.user_service.get(&id).await.map_err(retrieval_error)?;
    Ok(Json(UserResponse::from(user)))
}

pub async fn get_user_by_email(State(state): State<AppState>, Path(email): Path<String>) -> Result<impl IntoResponse> {
    let user = state.user_service.get_by_email(&email).await.map_err(retrieval_error)?;
    Ok(Json(UserResponse::from(user)))
}

pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<impl IntoResponse> {
    let update = UserUpdate::try_from(payload).map_err(AppError::BadRequest)?;
    let user = state.user_service.update(&id, &update).await.map_err(|e| match e {
        AppError::NotFound(_) | AppError::Conflict(_) => e,
        other => {
            tracing::error!(error = %other, "Failed to update user");
            AppError::Internal("Failed to update user".to_string())
        }
    })?;

    Ok(Json(UserMessageResponse { message: "User updated successfully".to_string(), user: user.into() }))
}

pub async fn delete_user(State(state): State<AppState>, Path(id): Path<String>) -> Result<impl IntoResponse> {
    state.user_service.delete(&id).await.map_err(|e| match e {
        AppError::NotFound(_) => e,
        other => {
            tracing::error!(error = %other, "Failed to delete user");
            AppError::Internal("Failed to delete user".to_string())
        }
    })?;
    Ok(Json(MessageResponse::new("User deleted successfully")))
}

fn retrieval_error(e: AppError) -> AppError {
    match e {
        AppError::NotFound(_) => e,
        other => {
            tracing::error!(error = %other, "Failed to retrieve user");
            AppError::Internal("Failed to retrieve user".to_string())
        }
    }
}
