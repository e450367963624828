use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::user::{AppUser, Role};

/// Request para criar um novo usuário (apenas Admin)
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[validate(length(min = 2, max = 100))]
    pub name: String,

    #[validate(length(min = 1, max = 30))]
    pub matricula: String,

    pub role: Role,

    #[validate(email(message = "email de autenticação inválido"))]
    pub auth_email: String,
}

/// Request para atualizar um usuário existente
///
/// `auth_email` é imutável pelo fluxo administrativo: pertence à camada de
/// autenticação externa.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[validate(length(min = 2, max = 100))]
    pub name: Option<String>,

    #[validate(length(min = 1, max = 30))]
    pub matricula: Option<String>,

    pub role: Option<Role>,
}

/// Perfil de usuário exposto pela API (sem hash de senha)
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub matricula: String,
    pub role: Role,
    pub auth_email: String,
    pub has_set_initial_password: bool,
}

impl From<AppUser> for UserResponse {
    fn from(user: AppUser) -> Self {
        Self {
            id: user.id,
            name: user.name,
            matricula: user.matricula,
            role: user.role,
            auth_email: user.auth_email,
            has_set_initial_password: user.has_set_initial_password,
        }
    }
}
