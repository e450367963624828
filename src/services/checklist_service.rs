//! Registro do esquema de checklist
//!
//! Gerencia a lista ordenada de itens de inspeção no documento único
//! `metadata/global_settings`. Os itens fixos de quilometragem não podem ser
//! removidos e toda reordenação deve ser uma permutação exata da lista atual.

use std::sync::Arc;

use uuid::Uuid;

use crate::dto::checklist_dto::CreateChecklistItemRequest;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::checklist::{
    initial_checklist_items, ChecklistItemConfig, UnitMetadata, METADATA_DOC_ID,
};
use crate::services::authorization::{self, Capability};
use crate::store::{self, Collection, EntityStore};
use crate::utils::errors::{AppError, AppResult};
use crate::utils::validation::require_non_empty;

pub struct ChecklistService {
    store: Arc<dyn EntityStore>,
}

impl ChecklistService {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    /// Carrega o documento de metadados, semeando os itens padrão se ausente
    pub async fn ensure_exists(&self) -> AppResult<UnitMetadata> {
        let existing: Option<UnitMetadata> =
            store::get_typed(self.store.as_ref(), Collection::Metadata, METADATA_DOC_ID).await?;
        if let Some(metadata) = existing {
            return Ok(metadata);
        }

        let metadata = UnitMetadata {
            checklist_items: initial_checklist_items(),
        };
        self.save(&metadata).await?;
        tracing::info!(
            "Checklist padrão semeado com {} itens",
            metadata.checklist_items.len()
        );
        Ok(metadata)
    }

    pub async fn items(&self) -> AppResult<Vec<ChecklistItemConfig>> {
        Ok(self.ensure_exists().await?.checklist_items)
    }

    pub async fn add_item(
        &self,
        actor: &AuthenticatedUser,
        request: CreateChecklistItemRequest,
    ) -> AppResult<ChecklistItemConfig> {
        authorization::require(actor, Capability::ManageChecklist)?;

        let label = request.label.trim().to_string();
        require_non_empty("Nome do item do checklist", &label)?;

        let mut metadata = self.ensure_exists().await?;
        let duplicate = metadata
            .checklist_items
            .iter()
            .any(|i| i.label.to_lowercase() == label.to_lowercase());
        if duplicate {
            return Err(AppError::Conflict(format!(
                "Já existe um item de checklist chamado '{}'",
                label
            )));
        }

        let item = ChecklistItemConfig {
            id: format!("chk_item_{}", Uuid::new_v4().simple()),
            label,
            item_type: request.item_type,
            default_value: request.default_value,
            required: request.required,
            is_fixed: false,
        };
        metadata.checklist_items.push(item.clone());
        self.save(&metadata).await?;
        Ok(item)
    }

    pub async fn delete_item(&self, actor: &AuthenticatedUser, item_id: &str) -> AppResult<()> {
        authorization::require(actor, Capability::ManageChecklist)?;

        let mut metadata = self.ensure_exists().await?;
        let item = metadata
            .checklist_items
            .iter()
            .find(|i| i.id == item_id)
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "Item de checklist com id '{}' não encontrado",
                    item_id
                ))
            })?;
        if item.is_fixed {
            return Err(AppError::Validation(format!(
                "O item '{}' é fixo e não pode ser excluído",
                item.label
            )));
        }

        metadata.checklist_items.retain(|i| i.id != item_id);
        self.save(&metadata).await?;
        Ok(())
    }

    /// Substitui a ordem da lista; o conjunto de itens deve ser o mesmo
    pub async fn reorder(
        &self,
        actor: &AuthenticatedUser,
        items: Vec<ChecklistItemConfig>,
    ) -> AppResult<Vec<ChecklistItemConfig>> {
        authorization::require(actor, Capability::ManageChecklist)?;

        let metadata = self.ensure_exists().await?;
        let mut current_ids: Vec<&str> =
            metadata.checklist_items.iter().map(|i| i.id.as_str()).collect();
        let mut incoming_ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        current_ids.sort_unstable();
        incoming_ids.sort_unstable();
        if current_ids != incoming_ids {
            return Err(AppError::Validation(
                "A reordenação deve conter exatamente os itens atuais do checklist".to_string(),
            ));
        }

        let metadata = UnitMetadata {
            checklist_items: items,
        };
        self.save(&metadata).await?;
        Ok(metadata.checklist_items)
    }

    async fn save(&self, metadata: &UnitMetadata) -> AppResult<()> {
        self.store
            .upsert(
                Collection::Metadata,
                METADATA_DOC_ID,
                store::encode(metadata)?,
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::checklist::{ChecklistItemType, KM_SAIDA_ITEM_ID};
    use crate::models::user::Role;
    use crate::store::memory::MemoryStore;

    fn admin() -> AuthenticatedUser {
        AuthenticatedUser {
            user_id: "admin-1".to_string(),
            name: "Administrador".to_string(),
            matricula: "admin".to_string(),
            role: Role::Admin,
        }
    }

    fn service() -> ChecklistService {
        ChecklistService::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn seeds_default_items_on_first_read() {
        let service = service();
        let items = service.items().await.unwrap();
        assert!(items.iter().any(|i| i.id == KM_SAIDA_ITEM_ID && i.is_fixed));
        assert!(items.len() >= 10);
    }

    #[tokio::test]
    async fn rejects_duplicate_label_case_insensitive() {
        let service = service();
        let request = CreateChecklistItemRequest {
            label: "LUZES".to_string(),
            item_type: ChecklistItemType::Boolean,
            default_value: None,
            required: false,
        };
        let err = service.add_item(&admin(), request).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn fixed_items_cannot_be_deleted() {
        let service = service();
        service.ensure_exists().await.unwrap();
        let err = service
            .delete_item(&admin(), KM_SAIDA_ITEM_ID)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn reorder_must_be_a_permutation() {
        let service = service();
        let mut items = service.items().await.unwrap();
        items.pop();
        let err = service.reorder(&admin(), items).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let mut items = service.items().await.unwrap();
        items.reverse();
        let reordered = service.reorder(&admin(), items.clone()).await.unwrap();
        assert_eq!(reordered[0].id, items[0].id);
    }
}
