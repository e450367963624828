use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::dto::user_dto::UserResponse;
use crate::models::user::Role;
use crate::services::authorization::Capability;

/// Login por matrícula e senha
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "matrícula é obrigatória"))]
    pub matricula: String,

    #[validate(length(min = 1, message = "senha é obrigatória"))]
    pub senha: String,
}

/// Sessão emitida após login
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub user: UserResponse,
}

/// Definição da senha definitiva no primeiro acesso
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SetInitialPasswordRequest {
    #[validate(length(min = 1, message = "senha atual é obrigatória"))]
    pub current_password: String,

    #[validate(length(min = 6, message = "a nova senha deve ter pelo menos 6 caracteres"))]
    pub new_password: String,
}

/// Sessão corrente com o painel efetivo de visualização
///
/// `capabilities` reflete o papel visualizado e serve apenas ao roteamento
/// da UI; a autorização de cada operação usa sempre o papel autenticado.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionViewResponse {
    pub user: UserResponse,
    pub effective_role: Role,
    pub capabilities: Vec<Capability>,
}
