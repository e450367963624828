//! Utilidades do sistema
//!
//! Este módulo contém utilidades para manejo de erros, validação de
//! payloads e JWT.

pub mod errors;
pub mod jwt;
pub mod validation;
