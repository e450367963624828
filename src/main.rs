use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use dotenvy::dotenv;
use tokio::signal;
use tracing::{error, info};

use sgv_backend::config::environment::EnvironmentConfig;
use sgv_backend::middleware::cors::{cors_middleware, cors_middleware_with_origins};
use sgv_backend::routes::create_api_router;
use sgv_backend::services::checklist_service::ChecklistService;
use sgv_backend::services::user_service::UserService;
use sgv_backend::state::AppState;
use sgv_backend::store::memory::MemoryStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variáveis de ambiente
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    info!("🚓 SGV - Sistema de Gestão de Viaturas");
    info!("======================================");

    let config = EnvironmentConfig::from_env();
    let store = Arc::new(MemoryStore::new());
    let state = AppState::new(store.clone(), config.clone());

    // Semear o checklist padrão e o administrador inicial
    let checklist = ChecklistService::new(store.clone());
    if let Err(e) = checklist.ensure_exists().await {
        error!("❌ Erro ao semear o checklist padrão: {}", e);
        return Err(anyhow::anyhow!("Erro na inicialização: {}", e));
    }
    let users = UserService::new(store.clone(), config.clone());
    if let Err(e) = users.ensure_bootstrap_admin().await {
        error!("❌ Erro ao criar o administrador inicial: {}", e);
        return Err(anyhow::anyhow!("Erro na inicialização: {}", e));
    }

    let cors = if config.cors_origins.is_empty() {
        cors_middleware()
    } else {
        cors_middleware_with_origins(&config.cors_origins)
    };
    let app = create_api_router(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer(cors);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("🌐 Servidor iniciando em http://{}", addr);
    info!("🔍 Endpoints disponíveis:");
    info!("   GET  /health - Health check");
    info!("🔐 Autenticação:");
    info!("   POST /api/auth/login - Login por matrícula");
    info!("   GET  /api/auth/me - Sessão corrente");
    info!("   POST /api/auth/set-initial-password - Definir senha inicial");
    info!("👥 Usuários:");
    info!("   GET  /api/users - Listar usuários");
    info!("   POST /api/users - Criar usuário");
    info!("   PUT  /api/users/:id - Atualizar usuário");
    info!("   DELETE /api/users/:id - Excluir usuário");
    info!("   POST /api/users/:id/reset-password - Resetar senha");
    info!("🚗 Frota:");
    info!("   GET  /api/vehicles - Listar viaturas");
    info!("   POST /api/vehicles - Cadastrar viatura");
    info!("   PUT  /api/vehicles/:id - Atualizar viatura");
    info!("   DELETE /api/vehicles/:id - Excluir viatura");
    info!("   POST /api/vehicles/:id/toggle-maintenance - Alternar manutenção");
    info!("📋 Cautelas:");
    info!("   GET  /api/cautelas - Listar cautelas");
    info!("   POST /api/cautelas - Solicitar retirada");
    info!("   POST /api/cautelas/manual - Cautela manual");
    info!("   POST /api/cautelas/:id/approval - Aprovar ou recusar");
    info!("   POST /api/cautelas/:id/checkin - Solicitar devolução");
    info!("   POST /api/cautelas/:id/confirm-checkin - Confirmar recebimento");
    info!("   POST /api/cautelas/:id/cancel - Cancelar solicitação");
    info!("✅ Checklist:");
    info!("   GET  /api/checklist/items - Listar itens");
    info!("   POST /api/checklist/items - Adicionar item");
    info!("   DELETE /api/checklist/items/:id - Excluir item");
    info!("   PUT  /api/checklist/order - Reordenar itens");
    info!("📜 Histórico:");
    info!("   GET  /api/history/cautelas - Histórico consolidado");
    info!("   GET  /api/history/logs - Log bruto de auditoria");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| {
            error!("❌ Erro do servidor: {}", e);
            anyhow::anyhow!(e)
        })?;

    info!("👋 Servidor encerrado");
    Ok(())
}

/// Sinal de desligamento graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("🛑 Ctrl+C recebido, encerrando servidor...");
        },
        _ = terminate => {
            info!("🛑 Sinal de término recebido, encerrando servidor...");
        },
    }
}
