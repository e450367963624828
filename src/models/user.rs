//! Modelo de usuário
//!
//! Perfis de usuários da unidade. `matricula` é o identificador humano usado
//! no login; `id` é o identificador opaco dos documentos.

use serde::{Deserialize, Serialize};

/// Papel do usuário no sistema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Reserva,
    User,
}

impl Role {
    /// Rótulo em português para descrições de auditoria
    pub fn label(&self) -> &'static str {
        match self {
            Role::Admin => "Administrador",
            Role::Reserva => "Reserva",
            Role::User => "Policial",
        }
    }
}

/// Perfil de usuário persistido na coleção `users`
///
/// O campo `password_hash` pertence à camada de autenticação e nunca é
/// exposto nas respostas da API (ver `dto::user_dto::UserResponse`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppUser {
    pub id: String,
    pub name: String,
    pub matricula: String,
    pub role: Role,
    pub auth_email: String,
    pub has_set_initial_password: bool,
    #[serde(default)]
    pub password_hash: String,
}
