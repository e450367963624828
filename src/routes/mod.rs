//! Rotas HTTP da API
//!
//! `/api/auth/login` e `/health` são públicas; todo o resto passa pelo
//! middleware de autenticação e recebe a identidade via extension.

pub mod auth_routes;
pub mod cautela_routes;
pub mod checklist_routes;
pub mod history_routes;
pub mod user_routes;
pub mod vehicle_routes;

use axum::{middleware, routing::get, Json, Router};

use crate::middleware::auth::auth_middleware;
use crate::state::AppState;

pub fn create_api_router(state: AppState) -> Router {
    let protected = Router::new()
        .nest("/auth", auth_routes::create_session_router())
        .nest("/users", user_routes::create_user_router())
        .nest("/vehicles", vehicle_routes::create_vehicle_router())
        .nest("/cautelas", cautela_routes::create_cautela_router())
        .nest("/checklist", checklist_routes::create_checklist_router())
        .nest("/history", history_routes::create_history_router())
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let public = Router::new()
        .nest("/auth", auth_routes::create_login_router())
        .merge(protected);

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", public)
        .with_state(state)
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "sgv-backend"
    }))
}
