//! Serviços de negócio
//!
//! `cautela_service` concentra a máquina de estados; os demais cobrem o
//! catálogo (usuários, viaturas, checklist), a projeção de histórico, a
//! autorização por papel e a emissão de sessões.

pub mod auth_service;
pub mod authorization;
pub mod cautela_service;
pub mod checklist_service;
pub mod history_service;
pub mod user_service;
pub mod vehicle_service;
