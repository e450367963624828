use serde::Deserialize;
use validator::Validate;

use crate::models::vehicle::FleetType;

/// Request para criar uma nova viatura
///
/// O status inicial é sempre DISPONIVEL e os campos de ocupação nascem
/// nulos; ambos são controlados pela máquina de estados, nunca pelo CRUD.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateVehicleRequest {
    #[validate(length(min = 1, max = 20))]
    pub prefixo: String,

    #[validate(length(min = 1, max = 100))]
    pub modelo: String,

    #[validate(length(min = 1, max = 20))]
    pub placa: String,

    pub frota: FleetType,

    pub km: u32,

    pub km_revisao: Option<u32>,
}

/// Request para atualizar os dados de catálogo de uma viatura
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVehicleRequest {
    #[validate(length(min = 1, max = 20))]
    pub prefixo: Option<String>,

    #[validate(length(min = 1, max = 100))]
    pub modelo: Option<String>,

    #[validate(length(min = 1, max = 20))]
    pub placa: Option<String>,

    pub frota: Option<FleetType>,

    pub km: Option<u32>,

    pub km_revisao: Option<u32>,
}
