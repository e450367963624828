//! Projeção do histórico de cautelas
//!
//! Lê exclusivamente o log de auditoria e consolida os eventos de retirada e
//! devolução em linhas de histórico. Cautelas cujo grupo de eventos não tem
//! retirada (apenas criadas, recusadas ou canceladas) não aparecem.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::dto::history_dto::{ConsolidatedCautela, ConsolidatedStatus, HistoryFilterQuery};
use crate::models::history::{HistoryEventType, HistoryLog, TargetEntityType};
use crate::store::{self, Collection, EntityStore};
use crate::utils::errors::AppResult;

pub struct HistoryService {
    store: Arc<dyn EntityStore>,
}

impl HistoryService {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    /// Log bruto de auditoria, do mais recente para o mais antigo
    pub async fn raw_logs(&self) -> AppResult<Vec<HistoryLog>> {
        let mut logs: Vec<HistoryLog> =
            store::list_typed(self.store.as_ref(), Collection::HistoryLogs).await?;
        logs.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(logs)
    }

    /// Histórico consolidado, com filtros de texto e período
    pub async fn consolidated(
        &self,
        filter: &HistoryFilterQuery,
    ) -> AppResult<Vec<ConsolidatedCautela>> {
        let logs: Vec<HistoryLog> =
            store::list_typed(self.store.as_ref(), Collection::HistoryLogs).await?;
        let mut rows = consolidate(&logs);
        apply_filters(&mut rows, filter);
        Ok(rows)
    }
}

#[derive(Default)]
struct RowBuilder {
    has_checkout: bool,
    vehicle_prefixo: Option<String>,
    solicitante_name: Option<String>,
    liberador_name_reserva: Option<String>,
    recebedor_name_reserva: Option<String>,
    checkout_timestamp: Option<DateTime<Utc>>,
    checkin_confirmation_timestamp: Option<DateTime<Utc>>,
    mission: Option<String>,
    checkout_km: Option<u32>,
    checkin_km: Option<u32>,
}

/// Agrupa eventos por cautela e funde retirada com devolução
pub fn consolidate(logs: &[HistoryLog]) -> Vec<ConsolidatedCautela> {
    let mut ordered: Vec<&HistoryLog> = logs.iter().collect();
    ordered.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));

    let mut groups: BTreeMap<String, RowBuilder> = BTreeMap::new();
    for log in ordered {
        if log.target_entity_type != Some(TargetEntityType::Request) {
            continue;
        }
        let Some(request_id) = &log.target_entity_id else {
            continue;
        };
        let row = groups.entry(request_id.clone()).or_default();
        let details = log.details.as_ref();

        match log.event_type {
            HistoryEventType::RequestCheckout => {
                row.has_checkout = true;
                merge_str(&mut row.vehicle_prefixo, details, "vehiclePrefixo");
                merge_str(&mut row.solicitante_name, details, "solicitanteName");
                merge_str(&mut row.liberador_name_reserva, details, "liberadorNameReserva");
                merge_str(&mut row.mission, details, "mission");
                merge_km(&mut row.checkout_km, details, "checkoutKm");
                row.checkout_timestamp =
                    detail_timestamp(details, "checkoutTimestamp").or(Some(log.timestamp));
            }
            HistoryEventType::RequestCheckinConfirmed => {
                merge_str(&mut row.vehicle_prefixo, details, "vehiclePrefixo");
                merge_str(&mut row.solicitante_name, details, "solicitanteName");
                merge_str(&mut row.liberador_name_reserva, details, "liberadorNameReserva");
                merge_str(&mut row.recebedor_name_reserva, details, "recebedorNameReserva");
                merge_str(&mut row.mission, details, "mission");
                merge_km(&mut row.checkout_km, details, "checkoutKm");
                merge_km(&mut row.checkin_km, details, "checkinKm");
                if row.checkout_timestamp.is_none() {
                    row.checkout_timestamp = detail_timestamp(details, "checkoutTimestamp");
                }
                row.checkin_confirmation_timestamp =
                    detail_timestamp(details, "checkinConfirmationTimestamp")
                        .or(Some(log.timestamp));
            }
            _ => {}
        }
    }

    let mut rows: Vec<ConsolidatedCautela> = groups
        .into_iter()
        .filter(|(_, row)| row.has_checkout)
        .map(|(id, row)| {
            let status = if row.checkin_confirmation_timestamp.is_some() {
                ConsolidatedStatus::Concluida
            } else {
                ConsolidatedStatus::EmAndamento
            };
            ConsolidatedCautela {
                id,
                vehicle_prefixo: row.vehicle_prefixo,
                solicitante_name: row.solicitante_name,
                liberador_name_reserva: row.liberador_name_reserva,
                recebedor_name_reserva: row.recebedor_name_reserva,
                checkout_timestamp: row.checkout_timestamp,
                checkin_confirmation_timestamp: row.checkin_confirmation_timestamp,
                mission: row.mission,
                checkout_km: row.checkout_km,
                checkin_km: row.checkin_km,
                status,
            }
        })
        .collect();

    rows.sort_by(|a, b| b.checkout_timestamp.cmp(&a.checkout_timestamp));
    rows
}

fn apply_filters(rows: &mut Vec<ConsolidatedCautela>, filter: &HistoryFilterQuery) {
    if let Some(search) = filter.search.as_deref().map(str::trim) {
        if !search.is_empty() {
            let needle = search.to_lowercase();
            rows.retain(|row| {
                [
                    &row.vehicle_prefixo,
                    &row.solicitante_name,
                    &row.liberador_name_reserva,
                    &row.recebedor_name_reserva,
                    &row.mission,
                ]
                .iter()
                .any(|field| {
                    field
                        .as_deref()
                        .map(|v| v.to_lowercase().contains(&needle))
                        .unwrap_or(false)
                })
            });
        }
    }
    if let Some(start) = filter.start_date {
        rows.retain(|row| {
            row.checkout_timestamp
                .map(|ts| ts.date_naive() >= start)
                .unwrap_or(false)
        });
    }
    if let Some(end) = filter.end_date {
        rows.retain(|row| {
            row.checkin_confirmation_timestamp
                .or(row.checkout_timestamp)
                .map(|ts| ts.date_naive() <= end)
                .unwrap_or(false)
        });
    }
}

fn merge_str(slot: &mut Option<String>, details: Option<&Value>, key: &str) {
    let value = details
        .and_then(|d| d.get(key))
        .and_then(Value::as_str)
        .map(str::to_string);
    if value.is_some() {
        *slot = value;
    }
}

fn merge_km(slot: &mut Option<u32>, details: Option<&Value>, key: &str) {
    let value = details
        .and_then(|d| d.get(key))
        .and_then(Value::as_u64)
        .map(|v| v as u32);
    if value.is_some() {
        *slot = value;
    }
}

fn detail_timestamp(details: Option<&Value>, key: &str) -> Option<DateTime<Utc>> {
    details
        .and_then(|d| d.get(key))
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}
