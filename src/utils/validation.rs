//! Validação de payloads
//!
//! Helpers para converter erros do `validator` em `AppError::Validation`
//! com mensagens legíveis.

use validator::Validate;

use crate::utils::errors::{AppError, AppResult};

/// Validar um payload derivado de `Validate`, agregando as mensagens
pub fn validate_payload<T: Validate>(payload: &T) -> AppResult<()> {
    payload.validate().map_err(|errors| {
        let mut parts: Vec<String> = Vec::new();
        for (field, field_errors) in errors.field_errors() {
            for error in field_errors {
                let message = error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("valor inválido ({})", error.code));
                parts.push(format!("{}: {}", field, message));
            }
        }
        parts.sort();
        AppError::Validation(parts.join("; "))
    })
}

/// Campo textual obrigatório não pode ser vazio após trim
pub fn require_non_empty(field: &str, value: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!(
            "{} é obrigatório(a) e não pode ser vazio(a)",
            field
        )));
    }
    Ok(())
}
