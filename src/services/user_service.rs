//! Serviço de usuários
//!
//! CRUD do roster de usuários (apenas Admin). A exclusão remove o perfil do
//! roster vivo; o histórico de auditoria preserva os nomes desnormalizados e
//! não é reescrito. As guardas de auto-ação impedem que um administrador
//! exclua ou resete a própria conta pelo fluxo administrativo.

use std::sync::Arc;

use bcrypt::{hash, DEFAULT_COST};
use uuid::Uuid;

use crate::config::environment::EnvironmentConfig;
use crate::dto::user_dto::{CreateUserRequest, UpdateUserRequest};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::user::{AppUser, Role};
use crate::services::authorization::{self, Capability};
use crate::store::{self, Collection, EntityStore};
use crate::utils::errors::{conflict_error, not_found_error, AppError, AppResult};

pub struct UserService {
    store: Arc<dyn EntityStore>,
    config: EnvironmentConfig,
}

impl UserService {
    pub fn new(store: Arc<dyn EntityStore>, config: EnvironmentConfig) -> Self {
        Self { store, config }
    }

    pub async fn list(&self) -> AppResult<Vec<AppUser>> {
        let mut users: Vec<AppUser> =
            store::list_typed(self.store.as_ref(), Collection::Users).await?;
        users.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(users)
    }

    pub async fn get(&self, id: &str) -> AppResult<AppUser> {
        store::get_typed(self.store.as_ref(), Collection::Users, id)
            .await?
            .ok_or_else(|| not_found_error("Usuário", id))
    }

    pub async fn create(
        &self,
        actor: &AuthenticatedUser,
        request: CreateUserRequest,
    ) -> AppResult<AppUser> {
        authorization::require(actor, Capability::ManageUsers)?;

        let matricula = request.matricula.trim().to_lowercase();
        let auth_email = request.auth_email.trim().to_lowercase();
        if matricula.is_empty() {
            return Err(AppError::Validation(
                "Matrícula é obrigatória para novos usuários".to_string(),
            ));
        }

        let existing = self.list().await?;
        if existing
            .iter()
            .any(|u| u.matricula.to_lowercase() == matricula)
        {
            return Err(conflict_error("Usuário", "matrícula", &matricula));
        }
        if existing
            .iter()
            .any(|u| u.auth_email.to_lowercase() == auth_email)
        {
            return Err(conflict_error("Usuário", "email", &auth_email));
        }

        let user = AppUser {
            id: Uuid::new_v4().to_string(),
            name: request.name.trim().to_string(),
            matricula,
            role: request.role,
            auth_email,
            has_set_initial_password: false,
            password_hash: hash(&self.config.default_initial_password, DEFAULT_COST)?,
        };

        self.store
            .upsert(Collection::Users, &user.id, store::encode(&user)?)
            .await?;

        tracing::info!(
            "Usuário {} ({}) criado por {}",
            user.name,
            user.matricula,
            actor.name
        );
        Ok(user)
    }

    pub async fn update(
        &self,
        actor: &AuthenticatedUser,
        id: &str,
        request: UpdateUserRequest,
    ) -> AppResult<AppUser> {
        authorization::require(actor, Capability::ManageUsers)?;

        let mut user = self.get(id).await?;

        if let Some(name) = request.name {
            user.name = name.trim().to_string();
        }
        if let Some(matricula) = request.matricula {
            let matricula = matricula.trim().to_lowercase();
            if matricula.is_empty() {
                return Err(AppError::Validation(
                    "Matrícula não pode ser vazia".to_string(),
                ));
            }
            let duplicate = self
                .list()
                .await?
                .iter()
                .any(|u| u.id != user.id && u.matricula.to_lowercase() == matricula);
            if duplicate {
                return Err(conflict_error("Usuário", "matrícula", &matricula));
            }
            user.matricula = matricula;
        }
        if let Some(role) = request.role {
            user.role = role;
        }

        self.store
            .upsert(Collection::Users, &user.id, store::encode(&user)?)
            .await?;
        Ok(user)
    }

    pub async fn delete(&self, actor: &AuthenticatedUser, id: &str) -> AppResult<()> {
        authorization::require(actor, Capability::ManageUsers)?;
        authorization::ensure_not_self(actor, id, "excluir")?;

        let user = self.get(id).await?;
        self.store.delete(Collection::Users, &user.id).await?;
        tracing::info!("Usuário {} excluído por {}", user.name, actor.name);
        Ok(())
    }

    /// Marca o usuário para redefinir a senha no próximo login.
    ///
    /// Não altera o hash armazenado: o usuário precisa conseguir entrar com
    /// a senha atual e então será forçado a definir uma nova.
    pub async fn reset_password_flag(
        &self,
        actor: &AuthenticatedUser,
        id: &str,
    ) -> AppResult<AppUser> {
        authorization::require(actor, Capability::ManageUsers)?;
        authorization::ensure_not_self(actor, id, "resetar a senha de")?;

        let mut user = self.get(id).await?;
        user.has_set_initial_password = false;
        self.store
            .upsert(Collection::Users, &user.id, store::encode(&user)?)
            .await?;
        Ok(user)
    }

    /// Cria o usuário administrador inicial quando o roster está vazio
    pub async fn ensure_bootstrap_admin(&self) -> AppResult<Option<AppUser>> {
        let users = self.list().await?;
        if !users.is_empty() {
            return Ok(None);
        }

        let admin = AppUser {
            id: Uuid::new_v4().to_string(),
            name: "Administrador".to_string(),
            matricula: self.config.bootstrap_admin_matricula.to_lowercase(),
            role: Role::Admin,
            auth_email: self.config.bootstrap_admin_email.to_lowercase(),
            has_set_initial_password: false,
            password_hash: hash(&self.config.default_initial_password, DEFAULT_COST)?,
        };
        self.store
            .upsert(Collection::Users, &admin.id, store::encode(&admin)?)
            .await?;
        tracing::info!(
            "Usuário administrador inicial criado (matrícula '{}')",
            admin.matricula
        );
        Ok(Some(admin))
    }
}
