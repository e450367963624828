use serde::Deserialize;
use validator::Validate;

use crate::models::request::ChecklistData;

/// Solicitação de retirada de viatura feita pelo próprio usuário
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitCautelaRequest {
    #[validate(length(min = 1))]
    pub vehicle_id: String,

    #[validate(length(min = 1, max = 300, message = "missão é obrigatória"))]
    pub mission: String,

    pub checkout_km: u32,

    #[serde(default)]
    pub checkout_checklist: ChecklistData,

    pub observations: Option<String>,
}

/// Decisão da Reserva sobre uma solicitação pendente
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalRequest {
    pub approved: bool,
    pub observations: Option<String>,
}

/// Solicitação de devolução feita pelo condutor
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CheckinRequest {
    pub final_km: u32,

    #[serde(default)]
    pub checkin_checklist: ChecklistData,

    pub observations: Option<String>,
}

/// Confirmação de recebimento pela Reserva
///
/// Os campos opcionais permitem confirmar corrigindo: quando presentes,
/// substituem os valores enviados pelo condutor.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmCheckinRequest {
    pub final_km: Option<u32>,
    pub checkin_checklist: Option<ChecklistData>,
    pub observations: Option<String>,
}

/// Cautela manual criada pela Reserva/Admin, já em uso
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ManualCautelaRequest {
    #[validate(length(min = 1))]
    pub vehicle_id: String,

    #[validate(length(min = 1))]
    pub user_id: String,

    #[validate(length(min = 1, max = 300, message = "missão é obrigatória"))]
    pub mission: String,

    pub checkout_km: u32,

    #[serde(default)]
    pub checkout_checklist: ChecklistData,

    pub observations: Option<String>,
}
