//! Rotas de histórico

use axum::{
    extract::{Query, State},
    routing::get,
    Extension, Json, Router,
};

use crate::dto::history_dto::{ConsolidatedCautela, HistoryFilterQuery};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::history::HistoryLog;
use crate::services::authorization::{self, Capability};
use crate::services::history_service::HistoryService;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_history_router() -> Router<AppState> {
    Router::new()
        .route("/cautelas", get(consolidated_history))
        .route("/logs", get(raw_logs))
}

async fn consolidated_history(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedUser>,
    Query(filter): Query<HistoryFilterQuery>,
) -> Result<Json<Vec<ConsolidatedCautela>>, AppError> {
    authorization::require(&actor, Capability::ViewHistory)?;
    let service = HistoryService::new(state.store.clone());
    Ok(Json(service.consolidated(&filter).await?))
}

async fn raw_logs(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedUser>,
) -> Result<Json<Vec<HistoryLog>>, AppError> {
    authorization::require(&actor, Capability::ViewHistory)?;
    let service = HistoryService::new(state.store.clone());
    Ok(Json(service.raw_logs().await?))
}
