//! DTOs de entrada e saída da API

pub mod auth_dto;
pub mod cautela_dto;
pub mod checklist_dto;
pub mod common;
pub mod history_dto;
pub mod user_dto;
pub mod vehicle_dto;
