//! Modelos do sistema
//!
//! Este módulo contém os modelos de dados que definem o contrato de schema
//! dos documentos persistidos: nomes de campos em camelCase e enums em
//! SCREAMING_SNAKE_CASE, compatíveis com os dados já existentes.

pub mod checklist;
pub mod history;
pub mod request;
pub mod user;
pub mod vehicle;
