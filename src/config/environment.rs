//! Configuração de variáveis de ambiente
//!
//! Este módulo carrega a configuração do entorno com defaults sensatos para
//! desenvolvimento. Em produção, `JWT_SECRET` deve ser sempre definido.

use std::env;

/// Configuração do entorno
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub environment: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_expiration: u64,
    pub cors_origins: Vec<String>,
    /// Senha inicial atribuída a usuários recém-criados pelo Admin
    pub default_initial_password: String,
    /// Matrícula do usuário admin criado quando a base está vazia
    pub bootstrap_admin_matricula: String,
    pub bootstrap_admin_email: String,
}

impl EnvironmentConfig {
    pub fn from_env() -> Self {
        Self {
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            jwt_secret: env::var("JWT_SECRET")
                .unwrap_or_else(|_| "sgv-dev-secret-nao-usar-em-producao".to_string()),
            jwt_expiration: env::var("JWT_EXPIRATION")
                .ok()
                .and_then(|e| e.parse().ok())
                .unwrap_or(8 * 3600),
            cors_origins: env::var("CORS_ORIGINS")
                .map(|origins| {
                    origins
                        .split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            default_initial_password: env::var("DEFAULT_INITIAL_PASSWORD")
                .unwrap_or_else(|_| "123456".to_string()),
            bootstrap_admin_matricula: env::var("BOOTSTRAP_ADMIN_MATRICULA")
                .unwrap_or_else(|_| "admin".to_string()),
            bootstrap_admin_email: env::var("BOOTSTRAP_ADMIN_EMAIL")
                .unwrap_or_else(|_| "admin@sgv.local".to_string()),
        }
    }

    /// Configuração fixa para testes, sem tocar o entorno do processo
    pub fn for_tests() -> Self {
        Self {
            environment: "test".to_string(),
            host: "127.0.0.1".to_string(),
            port: 0,
            jwt_secret: "segredo-de-teste".to_string(),
            jwt_expiration: 3600,
            cors_origins: Vec::new(),
            default_initial_password: "123456".to_string(),
            bootstrap_admin_matricula: "admin".to_string(),
            bootstrap_admin_email: "admin@sgv.local".to_string(),
        }
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    pub fn server_url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
