//! Rotas de frota

use axum::{
    extract::{Path, State},
    routing::{delete, get, post, put},
    Extension, Json, Router,
};

use crate::dto::common::ApiResponse;
use crate::dto::vehicle_dto::{CreateVehicleRequest, UpdateVehicleRequest};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::vehicle::Vehicle;
use crate::services::vehicle_service::VehicleService;
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::utils::validation::validate_payload;

pub fn create_vehicle_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_vehicles))
        .route("/", post(create_vehicle))
        .route("/:id", get(get_vehicle))
        .route("/:id", put(update_vehicle))
        .route("/:id", delete(delete_vehicle))
        .route("/:id/toggle-maintenance", post(toggle_maintenance))
}

async fn list_vehicles(State(state): State<AppState>) -> Result<Json<Vec<Vehicle>>, AppError> {
    let service = VehicleService::new(state.store.clone());
    Ok(Json(service.list().await?))
}

async fn get_vehicle(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vehicle>, AppError> {
    let service = VehicleService::new(state.store.clone());
    Ok(Json(service.get(&id).await?))
}

async fn create_vehicle(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedUser>,
    Json(request): Json<CreateVehicleRequest>,
) -> Result<Json<ApiResponse<Vehicle>>, AppError> {
    validate_payload(&request)?;
    let service = VehicleService::new(state.store.clone());
    let vehicle = service.create(&actor, request).await?;
    Ok(Json(ApiResponse::success(vehicle)))
}

async fn update_vehicle(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
    Json(request): Json<UpdateVehicleRequest>,
) -> Result<Json<ApiResponse<Vehicle>>, AppError> {
    validate_payload(&request)?;
    let service = VehicleService::new(state.store.clone());
    let vehicle = service.update(&actor, &id, request).await?;
    Ok(Json(ApiResponse::success(vehicle)))
}

async fn delete_vehicle(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let service = VehicleService::new(state.store.clone());
    service.delete(&actor, &id).await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Viatura excluída com sucesso"
    })))
}

async fn toggle_maintenance(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Vehicle>>, AppError> {
    let service = VehicleService::new(state.store.clone());
    let vehicle = service.toggle_maintenance(&actor, &id).await?;
    Ok(Json(ApiResponse::success(vehicle)))
}
