//! Log de histórico (auditoria)
//!
//! Coleção append-only: uma entrada por transição de cautela ou mudança
//! manual de status de viatura. O campo `details` carrega dados
//! desnormalizados suficientes para reconstruir uma linha de auditoria sem
//! consultar as entidades vivas.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tipo de evento registrado
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HistoryEventType {
    RequestCreated,
    RequestApproved,
    RequestRejected,
    RequestCheckout,
    RequestCheckinInitiated,
    RequestCheckinConfirmed,
    RequestCancelled,
    VehicleStatusUpdated,
    SystemError,
}

/// Entidade alvo do evento
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TargetEntityType {
    Request,
    System,
    Vehicle,
    User,
}

/// Entrada persistida na coleção `history_logs`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryLog {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub event_type: HistoryEventType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_entity_type: Option<TargetEntityType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_entity_id: Option<String>,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Entrada a registrar; `id` e `timestamp` são atribuídos pelo store
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryLogEntry {
    pub event_type: HistoryEventType,
    pub user_id: Option<String>,
    pub user_name: Option<String>,
    pub target_entity_type: Option<TargetEntityType>,
    pub target_entity_id: Option<String>,
    pub description: String,
    pub details: Option<serde_json::Value>,
}
