//! Rotas de usuários (apenas Admin)

use axum::{
    extract::{Path, State},
    routing::{delete, get, post, put},
    Extension, Json, Router,
};

use crate::dto::common::ApiResponse;
use crate::dto::user_dto::{CreateUserRequest, UpdateUserRequest, UserResponse};
use crate::middleware::auth::AuthenticatedUser;
use crate::services::user_service::UserService;
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::utils::validation::validate_payload;

pub fn create_user_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users))
        .route("/", post(create_user))
        .route("/:id", put(update_user))
        .route("/:id", delete(delete_user))
        .route("/:id/reset-password", post(reset_password))
}

async fn list_users(
    State(state): State<AppState>,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    let service = UserService::new(state.store.clone(), state.config.clone());
    let users = service.list().await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

async fn create_user(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedUser>,
    Json(request): Json<CreateUserRequest>,
) -> Result<Json<ApiResponse<UserResponse>>, AppError> {
    validate_payload(&request)?;
    let service = UserService::new(state.store.clone(), state.config.clone());
    let user = service.create(&actor, request).await?;
    Ok(Json(ApiResponse::success(UserResponse::from(user))))
}

async fn update_user(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
    Json(request): Json<UpdateUserRequest>,
) -> Result<Json<ApiResponse<UserResponse>>, AppError> {
    validate_payload(&request)?;
    let service = UserService::new(state.store.clone(), state.config.clone());
    let user = service.update(&actor, &id, request).await?;
    Ok(Json(ApiResponse::success(UserResponse::from(user))))
}

async fn delete_user(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let service = UserService::new(state.store.clone(), state.config.clone());
    service.delete(&actor, &id).await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Usuário excluído com sucesso"
    })))
}

async fn reset_password(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<UserResponse>>, AppError> {
    let service = UserService::new(state.store.clone(), state.config.clone());
    let user = service.reset_password_flag(&actor, &id).await?;
    Ok(Json(ApiResponse::success_with_message(
        UserResponse::from(user),
        "Usuário deverá redefinir a senha no próximo acesso".to_string(),
    )))
}
