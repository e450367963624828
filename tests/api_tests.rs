//! Testes da API HTTP montada, com oneshot do tower

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use sgv_backend::config::environment::EnvironmentConfig;
use sgv_backend::routes::create_api_router;
use sgv_backend::services::checklist_service::ChecklistService;
use sgv_backend::services::user_service::UserService;
use sgv_backend::state::AppState;
use sgv_backend::store::memory::MemoryStore;

async fn test_app() -> Router {
    let store = Arc::new(MemoryStore::new());
    let config = EnvironmentConfig::for_tests();

    ChecklistService::new(store.clone())
        .ensure_exists()
        .await
        .unwrap();
    UserService::new(store.clone(), config.clone())
        .ensure_bootstrap_admin()
        .await
        .unwrap();

    create_api_router(AppState::new(store, config))
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_json(uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

async fn login(app: &Router, matricula: &str, senha: &str) -> String {
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/auth/login",
            None,
            json!({ "matricula": matricula, "senha": senha }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    body["data"]["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_check_is_public() {
    let app = test_app().await;
    let response = app.oneshot(get("/health", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn login_with_wrong_password_is_unauthorized() {
    let app = test_app().await;
    let response = app
        .oneshot(post_json(
            "/api/auth/login",
            None,
            json!({ "matricula": "admin", "senha": "errada" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn protected_routes_require_a_token() {
    let app = test_app().await;
    let response = app.oneshot(get("/api/vehicles", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_manages_fleet_through_the_api() {
    let app = test_app().await;
    let token = login(&app, "admin", "123456").await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/vehicles",
            Some(&token),
            json!({
                "prefixo": "VTR-01",
                "modelo": "Duster",
                "placa": "abc1d23",
                "frota": "PROPRIA",
                "km": 1000
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["status"], "DISPONIVEL");
    assert_eq!(body["data"]["placa"], "ABC1D23");

    // Prefixo duplicado é conflito
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/vehicles",
            Some(&token),
            json!({
                "prefixo": "vtr-01",
                "modelo": "Hilux",
                "placa": "DEF4G56",
                "frota": "ALUGADA",
                "km": 200
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app.oneshot(get("/api/vehicles", Some(&token))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn new_user_logs_in_with_initial_password_and_replaces_it() {
    let app = test_app().await;
    let admin_token = login(&app, "admin", "123456").await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/users",
            Some(&admin_token),
            json!({
                "name": "SD SILVA",
                "matricula": "12345",
                "role": "USER",
                "authEmail": "silva@sgv.local"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["hasSetInitialPassword"], false);
    assert!(body["data"]["passwordHash"].is_null());

    let token = login(&app, "12345", "123456").await;
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/auth/set-initial-password",
            Some(&token),
            json!({ "currentPassword": "123456", "newPassword": "nova-senha" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["hasSetInitialPassword"], true);

    // A senha antiga deixa de valer
    let response = app
        .oneshot(post_json(
            "/api/auth/login",
            None,
            json!({ "matricula": "12345", "senha": "123456" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn regular_user_cannot_touch_the_catalog() {
    let app = test_app().await;
    let admin_token = login(&app, "admin", "123456").await;

    app.clone()
        .oneshot(post_json(
            "/api/users",
            Some(&admin_token),
            json!({
                "name": "SD SILVA",
                "matricula": "12345",
                "role": "USER",
                "authEmail": "silva@sgv.local"
            }),
        ))
        .await
        .unwrap();
    let token = login(&app, "12345", "123456").await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/vehicles",
            Some(&token),
            json!({
                "prefixo": "VTR-09",
                "modelo": "Gol",
                "placa": "GHI7J89",
                "frota": "PROPRIA",
                "km": 0
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .oneshot(get("/api/history/cautelas", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn session_view_exposes_effective_capabilities() {
    let app = test_app().await;
    let token = login(&app, "admin", "123456").await;

    let response = app
        .clone()
        .oneshot(get("/api/auth/me", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["effectiveRole"], "ADMIN");
    assert_eq!(body["data"]["user"]["role"], "ADMIN");

    // Admin visualizando o painel de Policial: capacidades reduzidas, papel intacto
    let response = app
        .oneshot(get("/api/auth/me?viewAs=USER", Some(&token)))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"]["effectiveRole"], "USER");
    assert_eq!(body["data"]["user"]["role"], "ADMIN");
    let capabilities = body["data"]["capabilities"].as_array().unwrap();
    assert!(!capabilities.contains(&json!("MANAGE_USERS")));
}
