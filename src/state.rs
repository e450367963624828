//! Estado compartilhado da aplicação
//!
//! Este módulo define o estado que circula pelo router do Axum: o store
//! escolhido na composição, a configuração do entorno e os locks de
//! serialização por id usados pela máquina de estados de cautela.

use std::sync::Arc;

use crate::config::environment::EnvironmentConfig;
use crate::services::cautela_service::TransitionLocks;
use crate::store::EntityStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn EntityStore>,
    pub config: EnvironmentConfig,
    pub locks: Arc<TransitionLocks>,
}

impl AppState {
    pub fn new(store: Arc<dyn EntityStore>, config: EnvironmentConfig) -> Self {
        Self {
            store,
            config,
            locks: Arc::new(TransitionLocks::new()),
        }
    }
}
