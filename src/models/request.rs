//! Modelo de cautela (Request)
//!
//! Uma cautela registra o empréstimo de uma viatura a um usuário para uma
//! missão. `user_name` e `vehicle_prefixo` são cópias desnormalizadas no
//! momento da criação e nunca são reescritas — o histórico permanece fiel
//! mesmo que o usuário ou a viatura sejam renomeados ou removidos.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Valores preenchidos do checklist, chaveados pelo id do item configurado
pub type ChecklistData = serde_json::Map<String, serde_json::Value>;

/// Estado da cautela
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    PendenteReserva,
    Aprovado,
    Recusado,
    EmUso,
    DevolucaoSolicitada,
    Concluido,
    Cancelado,
}

impl RequestStatus {
    /// Rótulo de exibição usado em mensagens e no histórico
    pub fn label(&self) -> &'static str {
        match self {
            RequestStatus::PendenteReserva => "Pendente na Reserva",
            RequestStatus::Aprovado => "Aprovado",
            RequestStatus::Recusado => "Recusado",
            RequestStatus::EmUso => "Em Uso",
            RequestStatus::DevolucaoSolicitada => "Devolução Solicitada",
            RequestStatus::Concluido => "Concluído",
            RequestStatus::Cancelado => "Cancelado",
        }
    }

    /// Estados dos quais nenhuma transição é possível
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RequestStatus::Recusado | RequestStatus::Concluido | RequestStatus::Cancelado
        )
    }
}

/// Cautela persistida na coleção `requests`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CautelaRequest {
    pub id: String,
    pub vehicle_id: String,
    pub user_id: String,

    pub user_name: String,
    pub vehicle_prefixo: String,

    pub mission: String,
    pub status: RequestStatus,

    pub request_timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approval_timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkout_timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkin_request_timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkin_confirmation_timestamp: Option<DateTime<Utc>>,

    pub checkout_km: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkin_km: Option<u32>,

    pub checkout_checklist: ChecklistData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkin_checklist: Option<ChecklistData>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approver_id_reserva: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver_id_reserva: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkout_observations: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkin_observations: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reserva_checkout_observations: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reserva_checkin_observations: Option<String>,
}
