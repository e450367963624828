use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Filtros da consulta de histórico consolidado
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryFilterQuery {
    /// Busca livre sobre prefixo, solicitante, liberador, recebedor e missão
    pub search: Option<String>,
    /// Limite inferior, aplicado à data de retirada
    pub start_date: Option<NaiveDate>,
    /// Limite superior, aplicado à devolução quando houver, senão à retirada
    pub end_date: Option<NaiveDate>,
}

/// Situação derivada de uma cautela no histórico
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConsolidatedStatus {
    #[serde(rename = "Em Andamento")]
    EmAndamento,
    #[serde(rename = "Concluída")]
    Concluida,
}

/// Uma linha do histórico: uma cautela retirada, em andamento ou concluída
///
/// Derivada exclusivamente do log de auditoria; os nomes vêm dos snapshots
/// desnormalizados gravados nas entradas, não das entidades vivas.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsolidatedCautela {
    pub id: String,
    pub vehicle_prefixo: Option<String>,
    pub solicitante_name: Option<String>,
    pub liberador_name_reserva: Option<String>,
    pub recebedor_name_reserva: Option<String>,
    pub checkout_timestamp: Option<DateTime<Utc>>,
    pub checkin_confirmation_timestamp: Option<DateTime<Utc>>,
    pub mission: Option<String>,
    pub checkout_km: Option<u32>,
    pub checkin_km: Option<u32>,
    pub status: ConsolidatedStatus,
}
