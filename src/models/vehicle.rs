//! Modelo de viatura
//!
//! Os campos de ocupação (`current_driver_id`/`current_request_id`) são
//! controlados exclusivamente pela máquina de estados de cautela: estão
//! preenchidos se e somente se `status` for EM_USO ou AGUARDANDO_RECEBIMENTO.

use serde::{Deserialize, Serialize};

/// Estado da viatura
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VehicleStatus {
    Disponivel,
    EmUso,
    Manutencao,
    AguardandoRecebimento,
}

impl VehicleStatus {
    /// Rótulo em português para descrições de auditoria
    pub fn label(&self) -> &'static str {
        match self {
            VehicleStatus::Disponivel => "Disponível",
            VehicleStatus::EmUso => "Em Uso",
            VehicleStatus::Manutencao => "Manutenção",
            VehicleStatus::AguardandoRecebimento => "Aguardando Recebimento",
        }
    }
}

/// Tipo de frota
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FleetType {
    Propria,
    Alugada,
}

/// Viatura persistida na coleção `vehicles`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub id: String,
    pub prefixo: String,
    pub modelo: String,
    pub placa: String,
    pub status: VehicleStatus,
    pub frota: FleetType,
    pub km: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub km_revisao: Option<u32>,
    #[serde(default)]
    pub current_driver_id: Option<String>,
    #[serde(default)]
    pub current_request_id: Option<String>,
}

impl Vehicle {
    /// Viatura vinculada a uma cautela não encerrada
    pub fn is_occupied(&self) -> bool {
        matches!(
            self.status,
            VehicleStatus::EmUso | VehicleStatus::AguardandoRecebimento
        )
    }

    /// Invariante de ocupação: condutor e cautela preenchidos sse em uso
    pub fn occupancy_consistent(&self) -> bool {
        let has_refs = self.current_driver_id.is_some() && self.current_request_id.is_some();
        let no_refs = self.current_driver_id.is_none() && self.current_request_id.is_none();
        if self.is_occupied() {
            has_refs
        } else {
            no_refs
        }
    }
}
