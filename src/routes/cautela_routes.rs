//! Rotas do ciclo de cautela

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Extension, Json, Router,
};

use crate::dto::cautela_dto::{
    ApprovalRequest, CheckinRequest, ConfirmCheckinRequest, ManualCautelaRequest,
    SubmitCautelaRequest,
};
use crate::dto::common::ApiResponse;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::request::CautelaRequest;
use crate::services::cautela_service::CautelaService;
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::utils::validation::validate_payload;

pub fn create_cautela_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_cautelas))
        .route("/", post(submit_request))
        .route("/manual", post(create_manual))
        .route("/:id", get(get_cautela))
        .route("/:id/approval", post(process_approval))
        .route("/:id/checkin", post(initiate_checkin))
        .route("/:id/confirm-checkin", post(confirm_checkin))
        .route("/:id/cancel", post(cancel_request))
}

fn service(state: &AppState) -> CautelaService {
    CautelaService::new(state.store.clone(), state.locks.clone())
}

async fn list_cautelas(
    State(state): State<AppState>,
) -> Result<Json<Vec<CautelaRequest>>, AppError> {
    Ok(Json(service(&state).list().await?))
}

async fn get_cautela(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CautelaRequest>, AppError> {
    Ok(Json(service(&state).get(&id).await?))
}

async fn submit_request(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedUser>,
    Json(request): Json<SubmitCautelaRequest>,
) -> Result<Json<ApiResponse<CautelaRequest>>, AppError> {
    validate_payload(&request)?;
    let cautela = service(&state).submit_request(&actor, request).await?;
    Ok(Json(ApiResponse::success(cautela)))
}

async fn create_manual(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedUser>,
    Json(request): Json<ManualCautelaRequest>,
) -> Result<Json<ApiResponse<CautelaRequest>>, AppError> {
    validate_payload(&request)?;
    let cautela = service(&state).create_manual(&actor, request).await?;
    Ok(Json(ApiResponse::success(cautela)))
}

async fn process_approval(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
    Json(request): Json<ApprovalRequest>,
) -> Result<Json<ApiResponse<CautelaRequest>>, AppError> {
    let cautela = service(&state).process_approval(&actor, &id, request).await?;
    Ok(Json(ApiResponse::success(cautela)))
}

async fn initiate_checkin(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
    Json(request): Json<CheckinRequest>,
) -> Result<Json<ApiResponse<CautelaRequest>>, AppError> {
    validate_payload(&request)?;
    let cautela = service(&state).initiate_checkin(&actor, &id, request).await?;
    Ok(Json(ApiResponse::success(cautela)))
}

async fn confirm_checkin(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
    Json(request): Json<ConfirmCheckinRequest>,
) -> Result<Json<ApiResponse<CautelaRequest>>, AppError> {
    let cautela = service(&state).confirm_checkin(&actor, &id, request).await?;
    Ok(Json(ApiResponse::success(cautela)))
}

async fn cancel_request(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<CautelaRequest>>, AppError> {
    let cautela = service(&state).cancel_request(&actor, &id).await?;
    Ok(Json(ApiResponse::success(cautela)))
}
