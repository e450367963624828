//! Rotas de autenticação e sessão

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Deserialize;

use crate::dto::auth_dto::{
    LoginRequest, LoginResponse, SessionViewResponse, SetInitialPasswordRequest,
};
use crate::dto::common::ApiResponse;
use crate::dto::user_dto::UserResponse;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::user::Role;
use crate::services::auth_service::AuthService;
use crate::services::authorization;
use crate::services::user_service::UserService;
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::utils::validation::validate_payload;

/// Rotas públicas: apenas o login
pub fn create_login_router() -> Router<AppState> {
    Router::new().route("/login", post(login))
}

/// Rotas de sessão, atrás do middleware de autenticação
pub fn create_session_router() -> Router<AppState> {
    Router::new()
        .route("/me", get(current_session))
        .route("/set-initial-password", post(set_initial_password))
}

async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, AppError> {
    validate_payload(&request)?;
    let service = AuthService::new(state.store.clone(), state.config.clone());
    let (token, user) = service.login(request).await?;
    Ok(Json(ApiResponse::success(LoginResponse {
        token,
        user: UserResponse::from(user),
    })))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ViewAsQuery {
    view_as: Option<Role>,
}

/// Sessão corrente, com o painel efetivo de visualização.
///
/// `viewAs` permite a Admin/Reserva navegar como um papel menos
/// privilegiado; a autorização real continua usando o papel autenticado.
async fn current_session(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedUser>,
    Query(query): Query<ViewAsQuery>,
) -> Result<Json<ApiResponse<SessionViewResponse>>, AppError> {
    let effective_role = authorization::effective_view(actor.role, query.view_as)?;
    let capabilities = authorization::role_capabilities(effective_role).to_vec();

    let service = UserService::new(state.store.clone(), state.config.clone());
    let profile = service.get(&actor.user_id).await?;
    Ok(Json(ApiResponse::success(SessionViewResponse {
        user: UserResponse::from(profile),
        effective_role,
        capabilities,
    })))
}

async fn set_initial_password(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedUser>,
    Json(request): Json<SetInitialPasswordRequest>,
) -> Result<Json<ApiResponse<UserResponse>>, AppError> {
    validate_payload(&request)?;
    let service = AuthService::new(state.store.clone(), state.config.clone());
    let user = service.set_initial_password(&actor.user_id, request).await?;
    Ok(Json(ApiResponse::success_with_message(
        UserResponse::from(user),
        "Senha definida com sucesso".to_string(),
    )))
}
