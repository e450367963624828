use serde::Deserialize;
use validator::Validate;

use crate::models::checklist::{ChecklistItemConfig, ChecklistItemType};

/// Request para adicionar um item ao checklist
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateChecklistItemRequest {
    #[validate(length(min = 1, max = 120))]
    pub label: String,

    #[serde(rename = "type")]
    pub item_type: ChecklistItemType,

    pub default_value: Option<serde_json::Value>,

    #[serde(default)]
    pub required: bool,
}

/// Request para reordenar o checklist inteiro
///
/// O conjunto de ids deve ser uma permutação exata da lista atual.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderChecklistRequest {
    pub items: Vec<ChecklistItemConfig>,
}
