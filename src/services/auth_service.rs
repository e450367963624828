//! Serviço de autenticação
//!
//! Login por matrícula + senha com emissão de JWT, e o fluxo de primeiro
//! acesso em que o usuário troca a senha inicial e o perfil é marcado com
//! `hasSetInitialPassword = true`.

use std::sync::Arc;

use bcrypt::{hash, verify, DEFAULT_COST};

use crate::config::environment::EnvironmentConfig;
use crate::dto::auth_dto::{LoginRequest, SetInitialPasswordRequest};
use crate::models::user::AppUser;
use crate::store::{self, Collection, EntityStore};
use crate::utils::errors::{AppError, AppResult};
use crate::utils::jwt::{self, JwtConfig};

pub struct AuthService {
    store: Arc<dyn EntityStore>,
    config: EnvironmentConfig,
}

impl AuthService {
    pub fn new(store: Arc<dyn EntityStore>, config: EnvironmentConfig) -> Self {
        Self { store, config }
    }

    /// Autenticar por matrícula e senha, emitindo um token de sessão
    pub async fn login(&self, request: LoginRequest) -> AppResult<(String, AppUser)> {
        let matricula = request.matricula.trim().to_lowercase();

        let users: Vec<AppUser> = store::list_typed(self.store.as_ref(), Collection::Users).await?;
        let user = users
            .into_iter()
            .find(|u| u.matricula.to_lowercase() == matricula)
            .ok_or_else(|| AppError::Unauthorized("Matrícula ou senha inválida".to_string()))?;

        let valid = verify(&request.senha, &user.password_hash)?;
        if !valid {
            return Err(AppError::Unauthorized(
                "Matrícula ou senha inválida".to_string(),
            ));
        }

        let token = jwt::generate_token(&user, &JwtConfig::from(&self.config))?;
        tracing::info!("Login de {} (matrícula '{}')", user.name, user.matricula);
        Ok((token, user))
    }

    /// Definir a senha definitiva no primeiro acesso
    pub async fn set_initial_password(
        &self,
        user_id: &str,
        request: SetInitialPasswordRequest,
    ) -> AppResult<AppUser> {
        let mut user: AppUser = store::get_typed(self.store.as_ref(), Collection::Users, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Usuário com id '{}' não encontrado", user_id)))?;

        let valid = verify(&request.current_password, &user.password_hash)?;
        if !valid {
            return Err(AppError::Unauthorized("Senha atual incorreta".to_string()));
        }

        user.password_hash = hash(&request.new_password, DEFAULT_COST)?;
        user.has_set_initial_password = true;
        self.store
            .upsert(Collection::Users, &user.id, store::encode(&user)?)
            .await?;
        Ok(user)
    }
}
