//! Entity Store em memória
//!
//! Implementação completa do `EntityStore` usada pelo binário (modo
//! demonstração) e pelos testes. Todas as escritas de um lote acontecem sob
//! um único lock de escrita, portanto transições nunca ficam parcialmente
//! visíveis aqui; a notificação dos assinantes ocorre depois do commit e não
//! bloqueia a escrita.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

use crate::models::history::{HistoryLog, HistoryLogEntry};
use crate::store::{encode, Collection, Document, EntityStore, WriteBatch};
use crate::utils::errors::{AppError, AppResult};

const CHANNEL_CAPACITY: usize = 32;

type CollectionMap = BTreeMap<String, Document>;

pub struct MemoryStore {
    collections: RwLock<HashMap<Collection, CollectionMap>>,
    channels: HashMap<Collection, broadcast::Sender<Vec<Document>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let mut collections = HashMap::new();
        let mut channels = HashMap::new();
        for collection in Collection::ALL {
            collections.insert(collection, CollectionMap::new());
            let (tx, _rx) = broadcast::channel(CHANNEL_CAPACITY);
            channels.insert(collection, tx);
        }
        Self {
            collections: RwLock::new(collections),
            channels,
        }
    }

    /// Merge raso: campos de topo do novo documento sobrescrevem os atuais,
    /// os demais são preservados (semântica de `set(..., { merge: true })`)
    fn merge_into(existing: &mut Document, incoming: Document) {
        match incoming {
            Document::Object(new_fields) => {
                if let Some(current) = existing.as_object_mut() {
                    for (key, value) in new_fields {
                        current.insert(key, value);
                    }
                } else {
                    *existing = Document::Object(new_fields);
                }
            }
            other => *existing = other,
        }
    }

    fn notify(&self, collection: Collection, snapshot: Vec<Document>) {
        if let Some(tx) = self.channels.get(&collection) {
            // Sem assinantes ativos o envio falha; isso não é um erro
            let _ = tx.send(snapshot);
        }
    }

    fn snapshot_of(map: &HashMap<Collection, CollectionMap>, collection: Collection) -> Vec<Document> {
        map.get(&collection)
            .map(|docs| docs.values().cloned().collect())
            .unwrap_or_default()
    }

    fn build_log(entry: HistoryLogEntry) -> HistoryLog {
        HistoryLog {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event_type: entry.event_type,
            user_id: entry.user_id,
            user_name: entry.user_name,
            target_entity_type: entry.target_entity_type,
            target_entity_id: entry.target_entity_id,
            description: entry.description,
            details: entry.details,
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn get_all(&self, collection: Collection) -> AppResult<Vec<Document>> {
        let map = self.collections.read().await;
        Ok(Self::snapshot_of(&map, collection))
    }

    async fn get_by_id(&self, collection: Collection, id: &str) -> AppResult<Option<Document>> {
        let map = self.collections.read().await;
        Ok(map
            .get(&collection)
            .and_then(|docs| docs.get(id))
            .cloned())
    }

    async fn upsert(&self, collection: Collection, id: &str, doc: Document) -> AppResult<()> {
        let snapshot = {
            let mut map = self.collections.write().await;
            let docs = map
                .get_mut(&collection)
                .ok_or_else(|| AppError::Internal(format!("coleção desconhecida: {:?}", collection)))?;
            match docs.get_mut(id) {
                Some(existing) => Self::merge_into(existing, doc),
                None => {
                    docs.insert(id.to_string(), doc);
                }
            }
            Self::snapshot_of(&map, collection)
        };
        self.notify(collection, snapshot);
        Ok(())
    }

    async fn delete(&self, collection: Collection, id: &str) -> AppResult<()> {
        let snapshot = {
            let mut map = self.collections.write().await;
            let docs = map
                .get_mut(&collection)
                .ok_or_else(|| AppError::Internal(format!("coleção desconhecida: {:?}", collection)))?;
            docs.remove(id);
            Self::snapshot_of(&map, collection)
        };
        self.notify(collection, snapshot);
        Ok(())
    }

    async fn append_log(&self, entry: HistoryLogEntry) -> AppResult<HistoryLog> {
        let log = Self::build_log(entry);
        let doc = encode(&log)?;
        let snapshot = {
            let mut map = self.collections.write().await;
            let docs = map
                .get_mut(&Collection::HistoryLogs)
                .ok_or_else(|| AppError::Internal("coleção history_logs ausente".to_string()))?;
            docs.insert(log.id.clone(), doc);
            Self::snapshot_of(&map, Collection::HistoryLogs)
        };
        self.notify(Collection::HistoryLogs, snapshot);
        Ok(log)
    }

    async fn apply(&self, batch: WriteBatch) -> AppResult<()> {
        // Serializa todas as entradas antes de tocar o estado: uma falha de
        // encoding rejeita o lote inteiro sem nenhuma escrita
        let mut log_docs = Vec::with_capacity(batch.logs.len());
        for entry in batch.logs {
            let log = Self::build_log(entry);
            log_docs.push((log.id.clone(), encode(&log)?));
        }

        let mut touched: Vec<Collection> = Vec::new();
        let snapshots = {
            let mut map = self.collections.write().await;
            for (collection, id, doc) in batch.upserts {
                let docs = map.get_mut(&collection).ok_or_else(|| {
                    AppError::Internal(format!("coleção desconhecida: {:?}", collection))
                })?;
                match docs.get_mut(&id) {
                    Some(existing) => Self::merge_into(existing, doc),
                    None => {
                        docs.insert(id, doc);
                    }
                }
                if !touched.contains(&collection) {
                    touched.push(collection);
                }
            }
            if !log_docs.is_empty() {
                let docs = map
                    .get_mut(&Collection::HistoryLogs)
                    .ok_or_else(|| AppError::Internal("coleção history_logs ausente".to_string()))?;
                for (id, doc) in log_docs {
                    docs.insert(id, doc);
                }
                if !touched.contains(&Collection::HistoryLogs) {
                    touched.push(Collection::HistoryLogs);
                }
            }
            touched
                .iter()
                .map(|c| (*c, Self::snapshot_of(&map, *c)))
                .collect::<Vec<_>>()
        };

        for (collection, snapshot) in snapshots {
            self.notify(collection, snapshot);
        }
        Ok(())
    }

    fn subscribe(&self, collection: Collection) -> broadcast::Receiver<Vec<Document>> {
        self.channels
            .get(&collection)
            .map(|tx| tx.subscribe())
            .unwrap_or_else(|| broadcast::channel(CHANNEL_CAPACITY).1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::history::{HistoryEventType, TargetEntityType};
    use serde_json::json;

    #[tokio::test]
    async fn upsert_merges_unspecified_fields() {
        let store = MemoryStore::new();
        store
            .upsert(
                Collection::Vehicles,
                "v1",
                json!({ "prefixo": "VTR-01", "km": 1000 }),
            )
            .await
            .unwrap();
        store
            .upsert(Collection::Vehicles, "v1", json!({ "km": 1200 }))
            .await
            .unwrap();

        let doc = store
            .get_by_id(Collection::Vehicles, "v1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(doc["prefixo"], "VTR-01");
        assert_eq!(doc["km"], 1200);
    }

    #[tokio::test]
    async fn subscribe_receives_full_snapshot_on_change() {
        let store = MemoryStore::new();
        let mut rx = store.subscribe(Collection::Users);

        store
            .upsert(Collection::Users, "u1", json!({ "name": "SGT LUCAS" }))
            .await
            .unwrap();
        let snapshot = rx.recv().await.unwrap();
        assert_eq!(snapshot.len(), 1);

        store
            .upsert(Collection::Users, "u2", json!({ "name": "CB SILVA" }))
            .await
            .unwrap();
        let snapshot = rx.recv().await.unwrap();
        assert_eq!(snapshot.len(), 2);
    }

    #[tokio::test]
    async fn apply_commits_all_writes_and_log_together() {
        let store = MemoryStore::new();
        let batch = WriteBatch::new()
            .upsert(Collection::Requests, "r1", &json!({ "status": "EM_USO" }))
            .unwrap()
            .upsert(Collection::Vehicles, "v1", &json!({ "status": "EM_USO" }))
            .unwrap()
            .log(HistoryLogEntry {
                event_type: HistoryEventType::RequestCheckout,
                user_id: Some("res1".to_string()),
                user_name: Some("Reserva".to_string()),
                target_entity_type: Some(TargetEntityType::Request),
                target_entity_id: Some("r1".to_string()),
                description: "retirada".to_string(),
                details: None,
            });

        store.apply(batch).await.unwrap();

        assert!(store
            .get_by_id(Collection::Requests, "r1")
            .await
            .unwrap()
            .is_some());
        assert!(store
            .get_by_id(Collection::Vehicles, "v1")
            .await
            .unwrap()
            .is_some());
        assert_eq!(store.get_all(Collection::HistoryLogs).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_removes_document() {
        let store = MemoryStore::new();
        store
            .upsert(Collection::Vehicles, "v1", json!({ "prefixo": "VTR-01" }))
            .await
            .unwrap();
        store.delete(Collection::Vehicles, "v1").await.unwrap();
        assert!(store
            .get_by_id(Collection::Vehicles, "v1")
            .await
            .unwrap()
            .is_none());
    }
}
