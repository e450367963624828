//! Rotas do esquema de checklist

use axum::{
    extract::{Path, State},
    routing::{delete, get, post, put},
    Extension, Json, Router,
};

use crate::dto::checklist_dto::{CreateChecklistItemRequest, ReorderChecklistRequest};
use crate::dto::common::ApiResponse;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::checklist::ChecklistItemConfig;
use crate::services::checklist_service::ChecklistService;
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::utils::validation::validate_payload;

pub fn create_checklist_router() -> Router<AppState> {
    Router::new()
        .route("/items", get(list_items))
        .route("/items", post(add_item))
        .route("/items/:id", delete(delete_item))
        .route("/order", put(reorder))
}

async fn list_items(
    State(state): State<AppState>,
) -> Result<Json<Vec<ChecklistItemConfig>>, AppError> {
    let service = ChecklistService::new(state.store.clone());
    Ok(Json(service.items().await?))
}

async fn add_item(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedUser>,
    Json(request): Json<CreateChecklistItemRequest>,
) -> Result<Json<ApiResponse<ChecklistItemConfig>>, AppError> {
    validate_payload(&request)?;
    let service = ChecklistService::new(state.store.clone());
    let item = service.add_item(&actor, request).await?;
    Ok(Json(ApiResponse::success(item)))
}

async fn delete_item(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let service = ChecklistService::new(state.store.clone());
    service.delete_item(&actor, &id).await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Item do checklist excluído com sucesso"
    })))
}

async fn reorder(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedUser>,
    Json(request): Json<ReorderChecklistRequest>,
) -> Result<Json<ApiResponse<Vec<ChecklistItemConfig>>>, AppError> {
    let service = ChecklistService::new(state.store.clone());
    let items = service.reorder(&actor, request.items).await?;
    Ok(Json(ApiResponse::success(items)))
}
