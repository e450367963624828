//! Ciclo completo de cautela sobre o store em memória
//!
//! Cobre o caminho feliz solicitação → aprovação → devolução → conferência e
//! verifica os efeitos colaterais em viatura, cautela e histórico.

use std::sync::Arc;

use sgv_backend::dto::cautela_dto::{
    ApprovalRequest, CheckinRequest, ConfirmCheckinRequest, SubmitCautelaRequest,
};
use sgv_backend::dto::history_dto::{ConsolidatedStatus, HistoryFilterQuery};
use sgv_backend::dto::vehicle_dto::CreateVehicleRequest;
use sgv_backend::middleware::auth::AuthenticatedUser;
use sgv_backend::models::request::{ChecklistData, RequestStatus};
use sgv_backend::models::user::Role;
use sgv_backend::models::vehicle::{FleetType, VehicleStatus};
use sgv_backend::services::cautela_service::{CautelaService, TransitionLocks};
use sgv_backend::services::history_service::HistoryService;
use sgv_backend::services::vehicle_service::VehicleService;
use sgv_backend::store::memory::MemoryStore;
use sgv_backend::utils::errors::AppError;

fn actor(id: &str, name: &str, role: Role) -> AuthenticatedUser {
    AuthenticatedUser {
        user_id: id.to_string(),
        name: name.to_string(),
        matricula: id.to_string(),
        role,
    }
}

fn checklist() -> ChecklistData {
    let mut data = ChecklistData::new();
    data.insert("nivel_combustivel".to_string(), "Cheio".into());
    data
}

#[tokio::test]
async fn full_lifecycle_from_request_to_confirmation() {
    let store = Arc::new(MemoryStore::new());
    let locks = Arc::new(TransitionLocks::new());
    let vehicles = VehicleService::new(store.clone());
    let cautelas = CautelaService::new(store.clone(), locks);
    let history = HistoryService::new(store.clone());

    let admin = actor("a1", "Administrador", Role::Admin);
    let reserva = actor("r1", "SGT SOUZA", Role::Reserva);
    let driver = actor("u1", "SD SILVA", Role::User);

    let vehicle = vehicles
        .create(
            &admin,
            CreateVehicleRequest {
                prefixo: "VTR-01".to_string(),
                modelo: "Duster".to_string(),
                placa: "ABC1D23".to_string(),
                frota: FleetType::Propria,
                km: 1000,
                km_revisao: Some(10000),
            },
        )
        .await
        .unwrap();

    // Solicitação
    let cautela = cautelas
        .submit_request(
            &driver,
            SubmitCautelaRequest {
                vehicle_id: vehicle.id.clone(),
                mission: "Patrulhamento setor 3".to_string(),
                checkout_km: 1000,
                checkout_checklist: checklist(),
                observations: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(cautela.status, RequestStatus::PendenteReserva);

    // Aprovação entrega a viatura
    let cautela = cautelas
        .process_approval(
            &reserva,
            &cautela.id,
            ApprovalRequest {
                approved: true,
                observations: Some("Conferido".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(cautela.status, RequestStatus::EmUso);

    let v = vehicles.get(&vehicle.id).await.unwrap();
    assert_eq!(v.status, VehicleStatus::EmUso);
    assert_eq!(v.current_driver_id.as_deref(), Some("u1"));
    assert_eq!(v.current_request_id.as_deref(), Some(cautela.id.as_str()));
    assert!(v.occupancy_consistent());

    // Enquanto em uso, a viatura não pode ser retirada de novo
    let err = cautelas
        .submit_request(
            &driver,
            SubmitCautelaRequest {
                vehicle_id: vehicle.id.clone(),
                mission: "Outra missão".to_string(),
                checkout_km: 1000,
                checkout_checklist: checklist(),
                observations: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    // Devolução pelo condutor
    let cautela = cautelas
        .initiate_checkin(
            &driver,
            &cautela.id,
            CheckinRequest {
                final_km: 1050,
                checkin_checklist: checklist(),
                observations: Some("Sem avarias".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(cautela.status, RequestStatus::DevolucaoSolicitada);

    let v = vehicles.get(&vehicle.id).await.unwrap();
    assert_eq!(v.status, VehicleStatus::AguardandoRecebimento);
    assert_eq!(v.km, 1050);
    assert!(v.occupancy_consistent());

    // Conferência corrige o KM para 1055
    let cautela = cautelas
        .confirm_checkin(
            &reserva,
            &cautela.id,
            ConfirmCheckinRequest {
                final_km: Some(1055),
                checkin_checklist: None,
                observations: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(cautela.status, RequestStatus::Concluido);
    assert_eq!(cautela.checkin_km, Some(1055));

    let v = vehicles.get(&vehicle.id).await.unwrap();
    assert_eq!(v.status, VehicleStatus::Disponivel);
    assert_eq!(v.km, 1055);
    assert!(v.current_driver_id.is_none());
    assert!(v.current_request_id.is_none());

    // Conferir duas vezes falha
    let err = cautelas
        .confirm_checkin(
            &reserva,
            &cautela.id,
            ConfirmCheckinRequest {
                final_km: None,
                checkin_checklist: None,
                observations: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    // Histórico consolidado: uma linha concluída com os KMs corretos
    let rows = history
        .consolidated(&HistoryFilterQuery::default())
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row.id, cautela.id);
    assert_eq!(row.status, ConsolidatedStatus::Concluida);
    assert_eq!(row.vehicle_prefixo.as_deref(), Some("VTR-01"));
    assert_eq!(row.solicitante_name.as_deref(), Some("SD SILVA"));
    assert_eq!(row.recebedor_name_reserva.as_deref(), Some("SGT SOUZA"));
    assert_eq!(row.checkout_km, Some(1000));
    assert_eq!(row.checkin_km, Some(1055));
}

#[tokio::test]
async fn rejected_request_frees_nothing_and_stays_out_of_history() {
    let store = Arc::new(MemoryStore::new());
    let vehicles = VehicleService::new(store.clone());
    let cautelas = CautelaService::new(store.clone(), Arc::new(TransitionLocks::new()));
    let history = HistoryService::new(store.clone());

    let admin = actor("a1", "Administrador", Role::Admin);
    let reserva = actor("r1", "SGT SOUZA", Role::Reserva);
    let driver = actor("u1", "SD SILVA", Role::User);

    let vehicle = vehicles
        .create(
            &admin,
            CreateVehicleRequest {
                prefixo: "VTR-02".to_string(),
                modelo: "Hilux".to_string(),
                placa: "DEF4G56".to_string(),
                frota: FleetType::Alugada,
                km: 500,
                km_revisao: None,
            },
        )
        .await
        .unwrap();

    let cautela = cautelas
        .submit_request(
            &driver,
            SubmitCautelaRequest {
                vehicle_id: vehicle.id.clone(),
                mission: "Escolta".to_string(),
                checkout_km: 500,
                checkout_checklist: checklist(),
                observations: None,
            },
        )
        .await
        .unwrap();

    let cautela = cautelas
        .process_approval(
            &reserva,
            &cautela.id,
            ApprovalRequest {
                approved: false,
                observations: Some("Viatura reservada para operação".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(cautela.status, RequestStatus::Recusado);

    // Viatura permanece disponível
    let v = vehicles.get(&vehicle.id).await.unwrap();
    assert_eq!(v.status, VehicleStatus::Disponivel);

    // Grupo sem retirada não aparece no histórico consolidado
    let rows = history
        .consolidated(&HistoryFilterQuery::default())
        .await
        .unwrap();
    assert!(rows.is_empty());

    // Estado terminal: nenhuma transição posterior
    let err = cautelas
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
