//! Ciclo de vida da cautela
//!
//! Implementa a máquina de estados da cautela: solicitação, aprovação ou
//! recusa, devolução, confirmação de recebimento, criação manual e
//! cancelamento. Cada transição valida o estado corrente sob um lock por
//! entidade e grava a cautela, a viatura e a entrada de auditoria em um
//! único lote atômico — nunca existe cautela EM_USO sem viatura ocupada.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Value};
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::dto::cautela_dto::{
    ApprovalRequest, CheckinRequest, ConfirmCheckinRequest, ManualCautelaRequest,
    SubmitCautelaRequest,
};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::checklist::{
    initial_checklist_items, ChecklistItemConfig, UnitMetadata, METADATA_DOC_ID,
};
use crate::models::history::{HistoryEventType, HistoryLogEntry, TargetEntityType};
use crate::models::request::{CautelaRequest, ChecklistData, RequestStatus};
use crate::models::user::AppUser;
use crate::models::vehicle::{Vehicle, VehicleStatus};
use crate::services::authorization::{self, Capability};
use crate::store::{self, Collection, EntityStore, WriteBatch};
use crate::utils::errors::{not_found_error, AppError, AppResult};
use crate::utils::validation::require_non_empty;

/// Locks pessimistas por id de entidade.
///
/// Transições sobre uma cautela serializam pelo id da cautela; criações
/// (solicitação e cautela manual) serializam pelo id da viatura, fechando a
/// corrida entre duas retiradas da mesma viatura.
pub struct TransitionLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl TransitionLocks {
    pub fn new() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub async fn acquire(&self, key: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            // Entradas sem guard em voo (somente o map segura o Arc) podem
            // ser recolhidas; o map não cresce com ids já liberados
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}

impl Default for TransitionLocks {
    fn default() -> Self {
        Self::new()
    }
}

pub struct CautelaService {
    store: Arc<dyn EntityStore>,
    locks: Arc<TransitionLocks>,
}

impl CautelaService {
    pub fn new(store: Arc<dyn EntityStore>, locks: Arc<TransitionLocks>) -> Self {
        Self { store, locks }
    }

    pub async fn list(&self) -> AppResult<Vec<CautelaRequest>> {
        let mut requests: Vec<CautelaRequest> =
            store::list_typed(self.store.as_ref(), Collection::Requests).await?;
        requests.sort_by(|a, b| b.request_timestamp.cmp(&a.request_timestamp));
        Ok(requests)
    }

    pub async fn get(&self, id: &str) -> AppResult<CautelaRequest> {
        store::get_typed(self.store.as_ref(), Collection::Requests, id)
            .await?
            .ok_or_else(|| not_found_error("Solicitação", id))
    }

    /// Usuário solicita a retirada de uma viatura disponível
    pub async fn submit_request(
        &self,
        actor: &AuthenticatedUser,
        request: SubmitCautelaRequest,
    ) -> AppResult<CautelaRequest> {
        authorization::require(actor, Capability::SubmitRequest)?;
        require_non_empty("Missão", &request.mission)?;

        let _guard = self.locks.acquire(&request.vehicle_id).await;

        let vehicle = self.load_vehicle(&request.vehicle_id).await?;
        if vehicle.status != VehicleStatus::Disponivel {
            return Err(AppError::Validation(format!(
                "A viatura {} não está disponível (status atual: {})",
                vehicle.prefixo,
                vehicle.status.label()
            )));
        }
        if request.checkout_km < vehicle.km {
            return Err(AppError::Validation(format!(
                "KM de saída ({}) não pode ser menor que o KM atual da viatura ({})",
                request.checkout_km, vehicle.km
            )));
        }

        let mut checklist = request.checkout_checklist;
        self.validate_checklist(
            &mut checklist,
            crate::models::checklist::KM_SAIDA_ITEM_ID,
            request.checkout_km,
        )
        .await?;

        let cautela = CautelaRequest {
            id: Uuid::new_v4().to_string(),
            vehicle_id: vehicle.id.clone(),
            user_id: actor.user_id.clone(),
            user_name: actor.name.clone(),
            vehicle_prefixo: vehicle.prefixo.clone(),
            mission: request.mission.trim().to_string(),
            status: RequestStatus::PendenteReserva,
            request_timestamp: Utc::now(),
            approval_timestamp: None,
            checkout_timestamp: None,
            checkin_request_timestamp: None,
            checkin_confirmation_timestamp: None,
            checkout_km: request.checkout_km,
            checkin_km: None,
            checkout_checklist: checklist,
            checkin_checklist: None,
            approver_id_reserva: None,
            receiver_id_reserva: None,
            checkout_observations: request.observations,
            checkin_observations: None,
            reserva_checkout_observations: None,
            reserva_checkin_observations: None,
        };

        let entry = HistoryLogEntry {
            event_type: HistoryEventType::RequestCreated,
            user_id: Some(actor.user_id.clone()),
            user_name: Some(actor.name.clone()),
            target_entity_type: Some(TargetEntityType::Request),
            target_entity_id: Some(cautela.id.clone()),
            description: format!(
                "Solicitação de cautela da VTR {} criada por {} (Missão: {})",
                cautela.vehicle_prefixo, actor.name, cautela.mission
            ),
            details: Some(json!({
                "vehicleId": cautela.vehicle_id,
                "vehiclePrefixo": cautela.vehicle_prefixo,
                "solicitanteName": cautela.user_name,
                "mission": cautela.mission,
                "checkoutKm": cautela.checkout_km,
            })),
        };

        let batch = WriteBatch::new()
            .upsert(Collection::Requests, &cautela.id, &cautela)?
            .log(entry);
        self.store.apply(batch).await?;

        tracing::info!(
            "Cautela {} solicitada por {} para a VTR {}",
            cautela.id,
            actor.name,
            cautela.vehicle_prefixo
        );
        Ok(cautela)
    }

    /// Reserva aprova (entregando a viatura) ou recusa uma solicitação pendente
    pub async fn process_approval(
        &self,
        actor: &AuthenticatedUser,
        request_id: &str,
        decision: ApprovalRequest,
    ) -> AppResult<CautelaRequest> {
        authorization::require(actor, Capability::ProcessCautelas)?;

        let _guard = self.locks.acquire(request_id).await;

        let mut cautela = self.get(request_id).await?;
        if cautela.status != RequestStatus::PendenteReserva {
            return Err(AppError::Validation(format!(
                "Apenas solicitações pendentes podem ser aprovadas ou recusadas (status atual: {})",
                cautela.status.label()
            )));
        }

        let now = Utc::now();
        cautela.approval_timestamp = Some(now);
        cautela.approver_id_reserva = Some(actor.user_id.clone());
        cautela.reserva_checkout_observations = decision.observations.clone();

        if !decision.approved {
            cautela.status = RequestStatus::Recusado;

            let entry = HistoryLogEntry {
                event_type: HistoryEventType::RequestRejected,
                user_id: Some(actor.user_id.clone()),
                user_name: Some(actor.name.clone()),
                target_entity_type: Some(TargetEntityType::Request),
                target_entity_id: Some(cautela.id.clone()),
                description: format!(
                    "Solicitação da VTR {} de {} recusada por {}",
                    cautela.vehicle_prefixo, cautela.user_name, actor.name
                ),
                details: Some(json!({
                    "approved": false,
                    "vehicleId": cautela.vehicle_id,
                    "vehiclePrefixo": cautela.vehicle_prefixo,
                    "solicitanteName": cautela.user_name,
                    "mission": cautela.mission,
                    "reservaObservations": decision.observations,
                })),
            };

            let batch = WriteBatch::new()
                .upsert(Collection::Requests, &cautela.id, &cautela)?
                .log(entry);
            self.store.apply(batch).await?;
            return Ok(cautela);
        }

        // Ordem fixa de aquisição: cautela e depois viatura. A releitura da
        // viatura sob o lock fecha a corrida entre duas aprovações pendentes
        // da mesma viatura.
        let _vehicle_guard = self.locks.acquire(&cautela.vehicle_id).await;
        let mut vehicle = self.load_vehicle(&cautela.vehicle_id).await?;
        if vehicle.status != VehicleStatus::Disponivel {
            return Err(AppError::Validation(format!(
                "A viatura {} não está mais disponível para retirada (status atual: {})",
                vehicle.prefixo,
                vehicle.status.label()
            )));
        }

        cautela.status = RequestStatus::EmUso;
        cautela.checkout_timestamp = Some(now);
        vehicle.status = VehicleStatus::EmUso;
        vehicle.current_driver_id = Some(cautela.user_id.clone());
        vehicle.current_request_id = Some(cautela.id.clone());

        let entry = HistoryLogEntry {
            event_type: HistoryEventType::RequestCheckout,
            user_id: Some(actor.user_id.clone()),
            user_name: Some(actor.name.clone()),
            target_entity_type: Some(TargetEntityType::Request),
            target_entity_id: Some(cautela.id.clone()),
            description: format!(
                "Retirada da VTR {} por {} liberada por {}. KM: {}",
                cautela.vehicle_prefixo, cautela.user_name, actor.name, cautela.checkout_km
            ),
            details: Some(json!({
                "approved": true,
                "vehicleId": cautela.vehicle_id,
                "vehiclePrefixo": cautela.vehicle_prefixo,
                "solicitanteName": cautela.user_name,
                "liberadorNameReserva": actor.name,
                "mission": cautela.mission,
                "checkoutKm": cautela.checkout_km,
                "checkoutTimestamp": now,
                "reservaObservations": decision.observations,
            })),
        };

        let batch = WriteBatch::new()
            .upsert(Collection::Requests, &cautela.id, &cautela)?
            .upsert(Collection::Vehicles, &vehicle.id, &vehicle)?
            .log(entry);
        self.store.apply(batch).await?;
        Ok(cautela)
    }

    /// Condutor devolve a viatura e aguarda conferência da Reserva
    pub async fn initiate_checkin(
        &self,
        actor: &AuthenticatedUser,
        request_id: &str,
        request: CheckinRequest,
    ) -> AppResult<CautelaRequest> {
        authorization::require(actor, Capability::InitiateCheckin)?;

        let _guard = self.locks.acquire(request_id).await;

        let mut cautela = self.get(request_id).await?;
        if cautela.user_id != actor.user_id {
            return Err(AppError::Forbidden(
                "Apenas o condutor da cautela pode solicitar a devolução".to_string(),
            ));
        }
        if cautela.status != RequestStatus::EmUso {
            return Err(AppError::Validation(format!(
                "Apenas cautelas em uso podem ser devolvidas (status atual: {})",
                cautela.status.label()
            )));
        }
        if request.final_km < cautela.checkout_km {
            return Err(AppError::Validation(format!(
                "KM final ({}) não pode ser menor que o KM de saída ({})",
                request.final_km, cautela.checkout_km
            )));
        }

        let mut vehicle = self.load_vehicle(&cautela.vehicle_id).await?;

        let mut checklist = request.checkin_checklist;
        self.validate_checklist(
            &mut checklist,
            crate::models::checklist::KM_FINAL_ITEM_ID,
            request.final_km,
        )
        .await?;

        let now = Utc::now();
        cautela.status = RequestStatus::DevolucaoSolicitada;
        cautela.checkin_request_timestamp = Some(now);
        cautela.checkin_km = Some(request.final_km);
        cautela.checkin_checklist = Some(checklist);
        cautela.checkin_observations = request.observations.clone();

        vehicle.status = VehicleStatus::AguardandoRecebimento;
        vehicle.km = request.final_km;

        let entry = HistoryLogEntry {
            event_type: HistoryEventType::RequestCheckinInitiated,
            user_id: Some(actor.user_id.clone()),
            user_name: Some(actor.name.clone()),
            target_entity_type: Some(TargetEntityType::Request),
            target_entity_id: Some(cautela.id.clone()),
            description: format!(
                "Devolução da VTR {} solicitada por {}. KM Final: {}",
                cautela.vehicle_prefixo, actor.name, request.final_km
            ),
            details: Some(json!({
                "vehicleId": cautela.vehicle_id,
                "vehiclePrefixo": cautela.vehicle_prefixo,
                "solicitanteName": cautela.user_name,
                "mission": cautela.mission,
                "finalKm": request.final_km,
                "checkinObservations": request.observations,
            })),
        };

        let batch = WriteBatch::new()
            .upsert(Collection::Requests, &cautela.id, &cautela)?
            .upsert(Collection::Vehicles, &vehicle.id, &vehicle)?
            .log(entry);
        self.store.apply(batch).await?;
        Ok(cautela)
    }

    /// Reserva confere a devolução e conclui a cautela
    pub async fn confirm_checkin(
        &self,
        actor: &AuthenticatedUser,
        request_id: &str,
        request: ConfirmCheckinRequest,
    ) -> AppResult<CautelaRequest> {
        authorization::require(actor, Capability::ProcessCautelas)?;

        let _guard = self.locks.acquire(request_id).await;

        let mut cautela = self.get(request_id).await?;
        if cautela.status != RequestStatus::DevolucaoSolicitada {
            return Err(AppError::Validation(format!(
                "Apenas devoluções solicitadas podem ser confirmadas (status atual: {})",
                cautela.status.label()
            )));
        }

        let confirmed_km = request
            .final_km
            .or(cautela.checkin_km)
            .ok_or_else(|| AppError::Validation("KM final é obrigatório na confirmação".to_string()))?;
        if confirmed_km < cautela.checkout_km {
            return Err(AppError::Validation(format!(
                "KM final ({}) não pode ser menor que o KM de saída ({})",
                confirmed_km, cautela.checkout_km
            )));
        }

        let mut checklist = request
            .checkin_checklist
            .or_else(|| cautela.checkin_checklist.clone())
            .unwrap_or_default();
        self.validate_checklist(
            &mut checklist,
            crate::models::checklist::KM_FINAL_ITEM_ID,
            confirmed_km,
        )
        .await?;

        let mut vehicle = self.load_vehicle(&cautela.vehicle_id).await?;

        let now = Utc::now();
        cautela.status = RequestStatus::Concluido;
        cautela.checkin_confirmation_timestamp = Some(now);
        cautela.checkin_km = Some(confirmed_km);
        cautela.checkin_checklist = Some(checklist);
        cautela.receiver_id_reserva = Some(actor.user_id.clone());
        cautela.reserva_checkin_observations = request.observations.clone();

        vehicle.status = VehicleStatus::Disponivel;
        vehicle.current_driver_id = None;
        vehicle.current_request_id = None;
        vehicle.km = confirmed_km;

        let liberador_name = match &cautela.approver_id_reserva {
            Some(id) => self.load_user(id).await.ok().map(|u| u.name),
            None => None,
        };

        let entry = HistoryLogEntry {
            event_type: HistoryEventType::RequestCheckinConfirmed,
            user_id: Some(actor.user_id.clone()),
            user_name: Some(actor.name.clone()),
            target_entity_type: Some(TargetEntityType::Request),
            target_entity_id: Some(cautela.id.clone()),
            description: format!(
                "Devolução da VTR {} de {} confirmada por {}. KM Final: {}",
                cautela.vehicle_prefixo, cautela.user_name, actor.name, confirmed_km
            ),
            details: Some(json!({
                "vehicleId": cautela.vehicle_id,
                "vehiclePrefixo": cautela.vehicle_prefixo,
                "solicitanteName": cautela.user_name,
                "recebedorNameReserva": actor.name,
                "liberadorNameReserva": liberador_name,
                "mission": cautela.mission,
                "checkoutKm": cautela.checkout_km,
                "checkinKm": confirmed_km,
                "finalKm": confirmed_km,
                "checkoutTimestamp": cautela.checkout_timestamp,
                "checkinConfirmationTimestamp": now,
            })),
        };

        let batch = WriteBatch::new()
            .upsert(Collection::Requests, &cautela.id, &cautela)?
            .upsert(Collection::Vehicles, &vehicle.id, &vehicle)?
            .log(entry);
        self.store.apply(batch).await?;
        Ok(cautela)
    }

    /// Reserva registra uma retirada feita no balcão, já em uso
    pub async fn create_manual(
        &self,
        actor: &AuthenticatedUser,
        request: ManualCautelaRequest,
    ) -> AppResult<CautelaRequest> {
        authorization::require(actor, Capability::ProcessCautelas)?;
        require_non_empty("Missão", &request.mission)?;

        let _guard = self.locks.acquire(&request.vehicle_id).await;

        let mut vehicle = self.load_vehicle(&request.vehicle_id).await?;
        if vehicle.status != VehicleStatus::Disponivel {
            return Err(AppError::Validation(format!(
                "A viatura {} não está disponível (status atual: {})",
                vehicle.prefixo,
                vehicle.status.label()
            )));
        }
        let driver = self.load_user(&request.user_id).await?;
        if request.checkout_km < vehicle.km {
            return Err(AppError::Validation(format!(
                "KM de saída ({}) não pode ser menor que o KM atual da viatura ({})",
                request.checkout_km, vehicle.km
            )));
        }

        let mut checklist = request.checkout_checklist;
        self.validate_checklist(
            &mut checklist,
            crate::models::checklist::KM_SAIDA_ITEM_ID,
            request.checkout_km,
        )
        .await?;

        // Criação manual nasce EM_USO: solicitação, aprovação e retirada
        // recebem o mesmo instante.
        let now = Utc::now();
        let cautela = CautelaRequest {
            id: Uuid::new_v4().to_string(),
            vehicle_id: vehicle.id.clone(),
            user_id: driver.id.clone(),
            user_name: driver.name.clone(),
            vehicle_prefixo: vehicle.prefixo.clone(),
            mission: request.mission.trim().to_string(),
            status: RequestStatus::EmUso,
            request_timestamp: now,
            approval_timestamp: Some(now),
            checkout_timestamp: Some(now),
            checkin_request_timestamp: None,
            checkin_confirmation_timestamp: None,
            checkout_km: request.checkout_km,
            checkin_km: None,
            checkout_checklist: checklist,
            checkin_checklist: None,
            approver_id_reserva: Some(actor.user_id.clone()),
            receiver_id_reserva: None,
            checkout_observations: None,
            checkin_observations: None,
            reserva_checkout_observations: request.observations.clone(),
            reserva_checkin_observations: None,
        };

        vehicle.status = VehicleStatus::EmUso;
        vehicle.current_driver_id = Some(driver.id.clone());
        vehicle.current_request_id = Some(cautela.id.clone());
        vehicle.km = request.checkout_km;

        let entry = HistoryLogEntry {
            event_type: HistoryEventType::RequestCheckout,
            user_id: Some(actor.user_id.clone()),
            user_name: Some(actor.name.clone()),
            target_entity_type: Some(TargetEntityType::Request),
            target_entity_id: Some(cautela.id.clone()),
            description: format!(
                "Cautela manual da VTR {} (Condutor: {}, Missão: {}) criada por {}",
                cautela.vehicle_prefixo, driver.name, cautela.mission, actor.name
            ),
            details: Some(json!({
                "manualCreation": true,
                "vehicleId": cautela.vehicle_id,
                "vehiclePrefixo": cautela.vehicle_prefixo,
                "solicitanteName": driver.name,
                "liberadorNameReserva": actor.name,
                "mission": cautela.mission,
                "checkoutKm": cautela.checkout_km,
                "checkoutTimestamp": now,
            })),
        };

        let batch = WriteBatch::new()
            .upsert(Collection::Requests, &cautela.id, &cautela)?
            .upsert(Collection::Vehicles, &vehicle.id, &vehicle)?
            .log(entry);
        self.store.apply(batch).await?;
        Ok(cautela)
    }

    /// Cancela uma solicitação ainda pendente
    ///
    /// O próprio solicitante pode cancelar; qualquer outro ator precisa da
    /// capacidade de processar cautelas.
    pub async fn cancel_request(
        &self,
        actor: &AuthenticatedUser,
        request_id: &str,
    ) -> AppResult<CautelaRequest> {
        let _guard = self.locks.acquire(request_id).await;

        let mut cautela = self.get(request_id).await?;
        if cautela.user_id != actor.user_id {
            authorization::require(actor, Capability::ProcessCautelas)?;
        }
        if cautela.status != RequestStatus::PendenteReserva {
            return Err(AppError::Validation(format!(
                "Apenas solicitações pendentes podem ser canceladas (status atual: {})",
                cautela.status.label()
            )));
        }

        cautela.status = RequestStatus::Cancelado;

        let entry = HistoryLogEntry {
            event_type: HistoryEventType::RequestCancelled,
            user_id: Some(actor.user_id.clone()),
            user_name: Some(actor.name.clone()),
            target_entity_type: Some(TargetEntityType::Request),
            target_entity_id: Some(cautela.id.clone()),
            description: format!(
                "Solicitação da VTR {} de {} cancelada por {}",
                cautela.vehicle_prefixo, cautela.user_name, actor.name
            ),
            details: Some(json!({
                "vehicleId": cautela.vehicle_id,
                "vehiclePrefixo": cautela.vehicle_prefixo,
                "solicitanteName": cautela.user_name,
                "mission": cautela.mission,
                "cancelledByName": actor.name,
            })),
        };

        let batch = WriteBatch::new()
            .upsert(Collection::Requests, &cautela.id, &cautela)?
            .log(entry);
        self.store.apply(batch).await?;
        Ok(cautela)
    }

    async fn load_vehicle(&self, id: &str) -> AppResult<Vehicle> {
        store::get_typed(self.store.as_ref(), Collection::Vehicles, id)
            .await?
            .ok_or_else(|| not_found_error("Viatura", id))
    }

    async fn load_user(&self, id: &str) -> AppResult<AppUser> {
        store::get_typed(self.store.as_ref(), Collection::Users, id)
            .await?
            .ok_or_else(|| not_found_error("Usuário", id))
    }

    async fn checklist_items(&self) -> AppResult<Vec<ChecklistItemConfig>> {
        let metadata: Option<UnitMetadata> =
            store::get_typed(self.store.as_ref(), Collection::Metadata, METADATA_DOC_ID).await?;
        Ok(metadata
            .map(|m| m.checklist_items)
            .unwrap_or_else(initial_checklist_items))
    }

    /// Preenche o item fixo de quilometragem e exige os demais obrigatórios.
    ///
    /// Booleanos desmarcados contam como preenchidos; textos obrigatórios
    /// não podem ser vazios.
    async fn validate_checklist(
        &self,
        data: &mut ChecklistData,
        fixed_km_item: &str,
        km: u32,
    ) -> AppResult<()> {
        data.insert(fixed_km_item.to_string(), json!(km));

        for item in self.checklist_items().await? {
            if !item.required || item.is_fixed {
                continue;
            }
            let filled = match data.get(&item.id) {
                None | Some(Value::Null) => false,
                Some(Value::String(s)) => !s.trim().is_empty(),
                Some(_) => true,
            };
            if !filled {
                return Err(AppError::Validation(format!(
                    "Item obrigatório do checklist não preenchido: {}",
                    item.label
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::Role;
    use crate::store::memory::MemoryStore;

    fn actor(id: &str, name: &str, role: Role) -> AuthenticatedUser {
        AuthenticatedUser {
            user_id: id.to_string(),
            name: name.to_string(),
            matricula: id.to_string(),
            role,
        }
    }

    async fn seed_vehicle(store: &dyn EntityStore, id: &str, km: u32) {
        let vehicle = Vehicle {
            id: id.to_string(),
            prefixo: "VTR-01".to_string(),
            modelo: "Duster".to_string(),
            placa: "ABC1D23".to_string(),
            status: VehicleStatus::Disponivel,
            frota: crate::models::vehicle::FleetType::Propria,
            km,
            km_revisao: None,
            current_driver_id: None,
            current_request_id: None,
        };
        store
            .upsert(Collection::Vehicles, id, store::encode(&vehicle).unwrap())
            .await
            .unwrap();
    }

    fn checklist_ok() -> ChecklistData {
        let mut data = ChecklistData::new();
        data.insert("nivel_combustivel".to_string(), json!("Cheio"));
        data
    }

    fn service(store: Arc<MemoryStore>) -> CautelaService {
        CautelaService::new(store, Arc::new(TransitionLocks::new()))
    }

    #[tokio::test]
    async fn km_regression_rejects_submission_without_writes() {
        let store = Arc::new(MemoryStore::new());
        seed_vehicle(store.as_ref(), "v1", 1000).await;
        let service = service(store.clone());

        let user = actor("u1", "Silva", Role::User);
        let err = service
            .submit_request(
                &user,
                SubmitCautelaRequest {
                    vehicle_id: "v1".to_string(),
                    mission: "Patrulhamento".to_string(),
                    checkout_km: 900,
                    checkout_checklist: checklist_ok(),
                    observations: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        assert!(store.get_all(Collection::Requests).await.unwrap().is_empty());
        assert!(store
            .get_all(Collection::HistoryLogs)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn missing_required_checklist_item_rejects_submission() {
        let store = Arc::new(MemoryStore::new());
        seed_vehicle(store.as_ref(), "v1", 1000).await;
        let service = service(store);

        let user = actor("u1", "Silva", Role::User);
        let err = service
            .submit_request(
                &user,
                SubmitCautelaRequest {
                    vehicle_id: "v1".to_string(),
                    mission: "Patrulhamento".to_string(),
                    checkout_km: 1000,
                    checkout_checklist: ChecklistData::new(),
                    observations: None,
                },
            )
            .await
            .unwrap_err();
        match err {
            AppError::Validation(msg) => assert!(msg.contains("Nível de Combustível")),
            other => panic!("esperava erro de validação, veio {:?}", other),
        }
    }

    #[tokio::test]
    async fn approval_checks_vehicle_still_available() {
        let store = Arc::new(MemoryStore::new());
        seed_vehicle(store.as_ref(), "v1", 1000).await;
        let service = service(store.clone());

        let user = actor("u1", "Silva", Role::User);
        let reserva = actor("r1", "Souza", Role::Reserva);

        let cautela = service
            .submit_request(
                &user,
                SubmitCautelaRequest {
                    vehicle_id: "v1".to_string(),
                    mission: "Patrulhamento".to_string(),
                    checkout_km: 1000,
                    checkout_checklist: checklist_ok(),
                    observations: None,
                },
            )
            .await
            .unwrap();

        // Viatura sai de disponível por fora (manutenção) antes da aprovação
        let mut vehicle: Vehicle = store::get_typed(store.as_ref(), Collection::Vehicles, "v1")
            .await
            .unwrap()
            .unwrap();
        vehicle.status = VehicleStatus::Manutencao;
        store
            .upsert(Collection::Vehicles, "v1", store::encode(&vehicle).unwrap())
            .await
            .unwrap();

        let err = service
            .process_approval(
                &reserva,
                &cautela.id,
                ApprovalRequest {
                    approved: true,
                    observations: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn only_the_driver_may_initiate_checkin() {
        let store = Arc::new(MemoryStore::new());
        seed_vehicle(store.as_ref(), "v1", 1000).await;
        let service = service(store);

        let user = actor("u1", "Silva", Role::User);
        let other = actor("u2", "Pereira", Role::User);
        let reserva = actor("r1", "Souza", Role::Reserva);

        let cautela = service
            .submit_request(
                &user,
                SubmitCautelaRequest {
                    vehicle_id: "v1".to_string(),
                    mission: "Patrulhamento".to_string(),
                    checkout_km: 1000,
                    checkout_checklist: checklist_ok(),
                    observations: None,
                },
            )
            .await
            .unwrap();
        service
            .process_approval(
                &reserva,
                &cautela.id,
                ApprovalRequest {
                    approved: true,
                    observations: None,
                },
            )
            .await
            .unwrap();

        let err = service
            .initiate_checkin(
                &other,
                &cautela.id,
                CheckinRequest {
                    final_km: 1050,
                    checkin_checklist: checklist_ok(),
                    observations: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn manual_creation_stamps_all_three_timestamps_equally() {
        let store = Arc::new(MemoryStore::new());
        seed_vehicle(store.as_ref(), "v1", 1000).await;
        let driver = AppUser {
            id: "u1".to_string(),
            name: "Silva".to_string(),
            matricula: "12345".to_string(),
            role: Role::User,
            auth_email: "silva@sgv.local".to_string(),
            has_set_initial_password: true,
            password_hash: String::new(),
        };
        store
            .upsert(Collection::Users, "u1", store::encode(&driver).unwrap())
            .await
            .unwrap();
        let service = service(store.clone());

        let reserva = actor("r1", "Souza", Role::Reserva);
        let cautela = service
            .create_manual(
                &reserva,
                ManualCautelaRequest {
                    vehicle_id: "v1".to_string(),
                    user_id: "u1".to_string(),
                    mission: "Escolta".to_string(),
                    checkout_km: 1010,
                    checkout_checklist: checklist_ok(),
                    observations: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(cautela.status, RequestStatus::EmUso);
        assert_eq!(Some(cautela.request_timestamp), cautela.approval_timestamp);
        assert_eq!(Some(cautela.request_timestamp), cautela.checkout_timestamp);

        let vehicle: Vehicle = store::get_typed(store.as_ref(), Collection::Vehicles, "v1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(vehicle.status, VehicleStatus::EmUso);
        assert_eq!(vehicle.km, 1010);
        assert_eq!(vehicle.current_request_id.as_deref(), Some(cautela.id.as_str()));
    }

    #[tokio::test]
    async fn concurrent_approvals_checkout_the_vehicle_once() {
        let store = Arc::new(MemoryStore::new());
        seed_vehicle(store.as_ref(), "v1", 1000).await;
        let service = Arc::new(service(store.clone()));

        let reserva = actor("r1", "Souza", Role::Reserva);
        let mut pending = Vec::new();
        for user_id in ["u1", "u2"] {
            let user = actor(user_id, "Silva", Role::User);
            let cautela = service
                .submit_request(
                    &user,
                    SubmitCautelaRequest {
                        vehicle_id: "v1".to_string(),
                        mission: "Patrulhamento".to_string(),
                        checkout_km: 1000,
                        checkout_checklist: checklist_ok(),
                        observations: None,
                    },
                )
                .await
                .unwrap();
            pending.push(cautela.id);
        }

        let approve = |id: String| {
            let service = service.clone();
            let reserva = reserva.clone();
            tokio::spawn(async move {
                service
                    .process_approval(
                        &reserva,
                        &id,
                        ApprovalRequest {
                            approved: true,
                            observations: None,
                        },
                    )
                    .await
            })
        };
        let (first, second) = tokio::join!(
            approve(pending[0].clone()),
            approve(pending[1].clone())
        );
        let results = [first.unwrap(), second.unwrap()];

        // Exatamente uma aprovação vence; a outra relê a viatura já em uso
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .any(|r| matches!(r, Err(AppError::Validation(_)))));

        let in_use: Vec<CautelaRequest> =
            store::list_typed(store.as_ref(), Collection::Requests)
                .await
                .unwrap()
                .into_iter()
                .filter(|r: &CautelaRequest| r.status == RequestStatus::EmUso)
                .collect();
        assert_eq!(in_use.len(), 1);

        let vehicle: Vehicle = store::get_typed(store.as_ref(), Collection::Vehicles, "v1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(vehicle.status, VehicleStatus::EmUso);
        assert_eq!(
            vehicle.current_request_id.as_deref(),
            Some(in_use[0].id.as_str())
        );
    }

    #[tokio::test]
    async fn released_lock_entries_are_evicted() {
        let locks = TransitionLocks::new();
        for i in 0..100 {
            let guard = locks.acquire(&format!("id-{}", i)).await;
            drop(guard);
        }

        // A próxima aquisição recolhe todas as entradas já liberadas
        let held = locks.acquire("id-vivo").await;
        assert_eq!(locks.locks.lock().await.len(), 1);

        // Entrada com guard em voo não é recolhida
        let _other = locks.acquire("id-outro").await;
        assert_eq!(locks.locks.lock().await.len(), 2);
        drop(held);
    }

    #[tokio::test]
    async fn cancel_only_from_pending() {
        let store = Arc::new(MemoryStore::new());
        seed_vehicle(store.as_ref(), "v1", 1000).await;
        let service = service(store);

        let user = actor("u1", "Silva", Role::User);
        let reserva = actor("r1", "Souza", Role::Reserva);

        let cautela = service
            .submit_request(
                &user,
                SubmitCautelaRequest {
                    vehicle_id: "v1".to_string(),
                    mission: "Patrulhamento".to_string(),
                    checkout_km: 1000,
                    checkout_checklist: checklist_ok(),
                    observations: None,
                },
            )
            .await
            .unwrap();
        service
            .process_approval(
                &reserva,
                &cautela.id,
                ApprovalRequest {
                    approved: true,
                    observations: None,
                },
            )
            .await
            .unwrap();

        let err = service.cancel_request(&user, &cautela.id).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
