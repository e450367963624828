//! Configuração do checklist de inspeção
//!
//! A lista ordenada de itens é compartilhada pelos formulários de retirada e
//! devolução e vive inteira em um único documento da coleção `metadata`
//! (`global_settings`), garantindo leituras sempre consistentes.

use serde::{Deserialize, Serialize};

/// Id do documento único de metadados da unidade
pub const METADATA_DOC_ID: &str = "global_settings";

/// Itens fixos de quilometragem: sempre existem e não podem ser excluídos
pub const KM_SAIDA_ITEM_ID: &str = "km_saida";
pub const KM_FINAL_ITEM_ID: &str = "km_final";

/// Tipo de campo de um item do checklist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecklistItemType {
    Boolean,
    Text,
    Number,
    Textarea,
}

/// Definição de um item do checklist
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistItemConfig {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub item_type: ChecklistItemType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<serde_json::Value>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub is_fixed: bool,
}

/// Documento de metadados da unidade
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitMetadata {
    pub checklist_items: Vec<ChecklistItemConfig>,
}

/// Itens de checklist semeados quando o documento de metadados não existe
pub fn initial_checklist_items() -> Vec<ChecklistItemConfig> {
    fn item(
        id: &str,
        label: &str,
        item_type: ChecklistItemType,
        default_value: Option<serde_json::Value>,
        required: bool,
        is_fixed: bool,
    ) -> ChecklistItemConfig {
        ChecklistItemConfig {
            id: id.to_string(),
            label: label.to_string(),
            item_type,
            default_value,
            required,
            is_fixed,
        }
    }

    vec![
        item(
            KM_SAIDA_ITEM_ID,
            "Quilometragem Saída",
            ChecklistItemType::Number,
            None,
            true,
            true,
        ),
        item(
            KM_FINAL_ITEM_ID,
            "Quilometragem Devolução",
            ChecklistItemType::Number,
            None,
            true,
            true,
        ),
        item("luzes", "Luzes", ChecklistItemType::Boolean, Some(false.into()), false, false),
        item("pneus", "Pneus", ChecklistItemType::Boolean, Some(false.into()), false, false),
        item("freios", "Freios", ChecklistItemType::Boolean, Some(false.into()), false, false),
        item(
            "nivel_combustivel",
            "Nível de Combustível (Ex: 1/4, 1/2, Cheio)",
            ChecklistItemType::Text,
            Some("Cheio".into()),
            true,
            false,
        ),
        item(
            "limpeza_externa",
            "Limpeza Externa",
            ChecklistItemType::Boolean,
            Some(false.into()),
            false,
            false,
        ),
        item(
            "limpeza_interna",
            "Limpeza Interna",
            ChecklistItemType::Boolean,
            Some(false.into()),
            false,
            false,
        ),
        item(
            "sirene_giroflex",
            "Sirene e Giroflex",
            ChecklistItemType::Boolean,
            Some(false.into()),
            false,
            false,
        ),
        item(
            "radio_comunicador",
            "Rádio Comunicador (HT)",
            ChecklistItemType::Boolean,
            Some(false.into()),
            false,
            false,
        ),
        item(
            "documentacao_obrigatoria",
            "Documentação Obrigatória (CRLV)",
            ChecklistItemType::Boolean,
            Some(false.into()),
            false,
            false,
        ),
        item(
            "avarias_observacoes",
            "Avarias Externas / Observações Gerais",
            ChecklistItemType::Textarea,
            Some("Nenhuma avaria aparente.".into()),
            false,
            false,
        ),
    ]
}
