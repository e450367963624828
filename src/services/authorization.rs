//! Gate de autorização por papel
//!
//! Mapeia cada papel para seu conjunto de capacidades e concentra as guardas
//! de auto-ação (um usuário não exclui a própria conta nem reseta a própria
//! senha pelo fluxo administrativo). A visualização de outro painel pelo
//! Admin ("ver como Reserva/Policial") troca apenas o conjunto exposto à UI:
//! o papel armazenado e o papel do token nunca mudam, e toda verificação de
//! escrita usa o papel autenticado.

use serde::Serialize;

use crate::middleware::auth::AuthenticatedUser;
use crate::models::user::Role;
use crate::utils::errors::{AppError, AppResult};

/// Capacidades concedidas por papel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Capability {
    /// CRUD de usuários e reset de flag de senha
    ManageUsers,
    /// CRUD de viaturas e alternância de manutenção
    ManageVehicles,
    /// Edição do checklist de inspeção
    ManageChecklist,
    /// Aprovar/recusar retiradas, confirmar devoluções, cautela manual
    ProcessCautelas,
    /// Solicitar retirada de viatura
    SubmitRequest,
    /// Solicitar devolução da própria cautela
    InitiateCheckin,
    /// Consultar o histórico consolidado de cautelas
    ViewHistory,
}

/// Capacidades de um papel
pub fn role_capabilities(role: Role) -> &'static [Capability] {
    match role {
        Role::Admin => &[
            Capability::ManageUsers,
            Capability::ManageVehicles,
            Capability::ManageChecklist,
            Capability::ProcessCautelas,
            Capability::SubmitRequest,
            Capability::InitiateCheckin,
            Capability::ViewHistory,
        ],
        // Reserva processa cautelas e edita o checklist; CRUD de catálogo é
        // exclusivo do Admin
        Role::Reserva => &[
            Capability::ManageChecklist,
            Capability::ProcessCautelas,
            Capability::SubmitRequest,
            Capability::InitiateCheckin,
            Capability::ViewHistory,
        ],
        Role::User => &[Capability::SubmitRequest, Capability::InitiateCheckin],
    }
}

/// Exigir uma capacidade do usuário autenticado
pub fn require(actor: &AuthenticatedUser, capability: Capability) -> AppResult<()> {
    if role_capabilities(actor.role).contains(&capability) {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "O papel {} não possui permissão para esta operação",
            actor.role.label()
        )))
    }
}

/// Guarda de auto-ação: bloqueia operações administrativas sobre si mesmo
pub fn ensure_not_self(actor: &AuthenticatedUser, target_user_id: &str, action: &str) -> AppResult<()> {
    if actor.user_id == target_user_id {
        return Err(AppError::Forbidden(format!(
            "Você não pode {} seu próprio usuário",
            action
        )));
    }
    Ok(())
}

/// Papel efetivo de visualização para roteamento de painel na UI
///
/// Admin pode ver qualquer painel; Reserva pode ver o painel de Policial.
/// O retorno influencia apenas qual painel e quais capacidades a UI exibe.
pub fn effective_view(actor_role: Role, requested: Option<Role>) -> AppResult<Role> {
    let requested = match requested {
        Some(role) => role,
        None => return Ok(actor_role),
    };
    let allowed = match actor_role {
        Role::Admin => true,
        Role::Reserva => matches!(requested, Role::Reserva | Role::User),
        Role::User => requested == Role::User,
    };
    if allowed {
        Ok(requested)
    } else {
        Err(AppError::Forbidden(format!(
            "O papel {} não pode visualizar o painel de {}",
            actor_role.label(),
            requested.label()
        )))
    }
}
