//! Serviço de frota
//!
//! CRUD do catálogo de viaturas (apenas Admin) e a alternância de manutenção
//! feita pela Reserva. As transições Disponível/Em Uso/Aguardando Recebimento
//! pertencem ao ciclo de cautela e nunca passam por aqui.

use std::sync::Arc;

use serde_json::json;
use uuid::Uuid;

use crate::dto::vehicle_dto::{CreateVehicleRequest, UpdateVehicleRequest};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::history::{HistoryEventType, HistoryLogEntry, TargetEntityType};
use crate::models::vehicle::{Vehicle, VehicleStatus};
use crate::services::authorization::{self, Capability};
use crate::store::{self, Collection, EntityStore, WriteBatch};
use crate::utils::errors::{conflict_error, not_found_error, AppError, AppResult};

pub struct VehicleService {
    store: Arc<dyn EntityStore>,
}

impl VehicleService {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> AppResult<Vec<Vehicle>> {
        let mut vehicles: Vec<Vehicle> =
            store::list_typed(self.store.as_ref(), Collection::Vehicles).await?;
        vehicles.sort_by(|a, b| a.prefixo.cmp(&b.prefixo));
        Ok(vehicles)
    }

    pub async fn get(&self, id: &str) -> AppResult<Vehicle> {
        store::get_typed(self.store.as_ref(), Collection::Vehicles, id)
            .await?
            .ok_or_else(|| not_found_error("Viatura", id))
    }

    pub async fn create(
        &self,
        actor: &AuthenticatedUser,
        request: CreateVehicleRequest,
    ) -> AppResult<Vehicle> {
        authorization::require(actor, Capability::ManageVehicles)?;

        let prefixo = request.prefixo.trim().to_string();
        let duplicate = self
            .list()
            .await?
            .iter()
            .any(|v| v.prefixo.eq_ignore_ascii_case(&prefixo));
        if duplicate {
            return Err(conflict_error("Viatura", "prefixo", &prefixo));
        }

        let vehicle = Vehicle {
            id: Uuid::new_v4().to_string(),
            prefixo,
            modelo: request.modelo.trim().to_string(),
            placa: request.placa.trim().to_uppercase(),
            status: VehicleStatus::Disponivel,
            frota: request.frota,
            km: request.km,
            km_revisao: request.km_revisao,
            current_driver_id: None,
            current_request_id: None,
        };

        self.store
            .upsert(Collection::Vehicles, &vehicle.id, store::encode(&vehicle)?)
            .await?;
        tracing::info!("Viatura {} cadastrada por {}", vehicle.prefixo, actor.name);
        Ok(vehicle)
    }

    pub async fn update(
        &self,
        actor: &AuthenticatedUser,
        id: &str,
        request: UpdateVehicleRequest,
    ) -> AppResult<Vehicle> {
        authorization::require(actor, Capability::ManageVehicles)?;

        let mut vehicle = self.get(id).await?;

        if let Some(prefixo) = request.prefixo {
            let prefixo = prefixo.trim().to_string();
            let duplicate = self
                .list()
                .await?
                .iter()
                .any(|v| v.id != vehicle.id && v.prefixo.eq_ignore_ascii_case(&prefixo));
            if duplicate {
                return Err(conflict_error("Viatura", "prefixo", &prefixo));
            }
            vehicle.prefixo = prefixo;
        }
        if let Some(modelo) = request.modelo {
            vehicle.modelo = modelo.trim().to_string();
        }
        if let Some(placa) = request.placa {
            vehicle.placa = placa.trim().to_uppercase();
        }
        if let Some(frota) = request.frota {
            vehicle.frota = frota;
        }
        if let Some(km) = request.km {
            vehicle.km = km;
        }
        if let Some(km_revisao) = request.km_revisao {
            vehicle.km_revisao = Some(km_revisao);
        }

        self.store
            .upsert(Collection::Vehicles, &vehicle.id, store::encode(&vehicle)?)
            .await?;
        Ok(vehicle)
    }

    pub async fn delete(&self, actor: &AuthenticatedUser, id: &str) -> AppResult<()> {
        authorization::require(actor, Capability::ManageVehicles)?;

        let vehicle = self.get(id).await?;
        if vehicle.is_occupied() {
            return Err(AppError::Validation(format!(
                "A viatura {} está {} e não pode ser excluída",
                vehicle.prefixo,
                vehicle.status.label().to_lowercase()
            )));
        }

        self.store.delete(Collection::Vehicles, &vehicle.id).await?;
        tracing::info!("Viatura {} excluída por {}", vehicle.prefixo, actor.name);
        Ok(())
    }

    /// Alterna entre Disponível e Manutenção, registrando a mudança no log
    pub async fn toggle_maintenance(
        &self,
        actor: &AuthenticatedUser,
        id: &str,
    ) -> AppResult<Vehicle> {
        authorization::require(actor, Capability::ProcessCautelas)?;

        let mut vehicle = self.get(id).await?;
        let old_status = vehicle.status;
        let new_status = match vehicle.status {
            VehicleStatus::Disponivel => VehicleStatus::Manutencao,
            VehicleStatus::Manutencao => VehicleStatus::Disponivel,
            other => {
                return Err(AppError::Validation(format!(
                    "A viatura {} está {} e não pode entrar em manutenção",
                    vehicle.prefixo,
                    other.label().to_lowercase()
                )));
            }
        };
        vehicle.status = new_status;

        let entry = HistoryLogEntry {
            event_type: HistoryEventType::VehicleStatusUpdated,
            user_id: Some(actor.user_id.clone()),
            user_name: Some(actor.name.clone()),
            target_entity_type: Some(TargetEntityType::Vehicle),
            target_entity_id: Some(vehicle.id.clone()),
            description: format!(
                "Status da viatura {} alterado de {} para {} por {}",
                vehicle.prefixo,
                old_status.label(),
                new_status.label(),
                actor.name
            ),
            details: Some(json!({
                "vehicleId": vehicle.id,
                "vehiclePrefixo": vehicle.prefixo,
                "oldStatus": old_status,
                "newStatus": new_status,
            })),
        };

        let batch = WriteBatch::new()
            .upsert(Collection::Vehicles, &vehicle.id, &vehicle)?
            .log(entry);
        self.store.apply(batch).await?;
        Ok(vehicle)
    }
}
