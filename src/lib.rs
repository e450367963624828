//! SGV — Sistema de Gestão de Viaturas
//!
//! Backend do controle de cautela de viaturas de uma unidade policial:
//! solicitação, aprovação, devolução e conferência de viaturas, catálogo de
//! frota e usuários, checklist de inspeção configurável e histórico de
//! auditoria append-only.

pub mod config;
pub mod dto;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;
pub mod utils;
