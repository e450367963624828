//! Abstração de persistência (Entity Store)
//!
//! A lógica de negócio só conhece este trait: um armazém de documentos com
//! upsert/delete atômicos por documento, log append-only, escrita em lote
//! atômica por transição e notificação push do snapshot completo de cada
//! coleção. A implementação concreta (em memória ou backend real) é
//! escolhida na composição da aplicação, nunca dentro da lógica de negócio.

pub mod memory;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::broadcast;

use crate::models::history::{HistoryLog, HistoryLogEntry};
use crate::utils::errors::{AppError, AppResult};

/// Documento persistido, no formato de intercâmbio JSON
pub type Document = serde_json::Value;

/// Coleções requeridas pelo núcleo
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Users,
    Vehicles,
    Requests,
    HistoryLogs,
    Metadata,
}

impl Collection {
    pub const ALL: [Collection; 5] = [
        Collection::Users,
        Collection::Vehicles,
        Collection::Requests,
        Collection::HistoryLogs,
        Collection::Metadata,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::Vehicles => "vehicles",
            Collection::Requests => "requests",
            Collection::HistoryLogs => "history_logs",
            Collection::Metadata => "metadata",
        }
    }
}

/// Lote de escritas aplicado atomicamente
///
/// Cada transição da máquina de estados agrupa aqui a cautela, a viatura e a
/// entrada de log correspondente, de modo que nenhuma escrita parcial fique
/// visível quando o backend suporta transações.
#[derive(Debug, Default)]
pub struct WriteBatch {
    pub upserts: Vec<(Collection, String, Document)>,
    pub logs: Vec<HistoryLogEntry>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert<T: Serialize>(
        mut self,
        collection: Collection,
        id: &str,
        value: &T,
    ) -> AppResult<Self> {
        self.upserts
            .push((collection, id.to_string(), encode(value)?));
        Ok(self)
    }

    pub fn log(mut self, entry: HistoryLogEntry) -> Self {
        self.logs.push(entry);
        self
    }
}

/// Operações requeridas de qualquer backend de persistência
#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn get_all(&self, collection: Collection) -> AppResult<Vec<Document>>;

    async fn get_by_id(&self, collection: Collection, id: &str) -> AppResult<Option<Document>>;

    /// Upsert com semântica de merge: campos não especificados são preservados
    async fn upsert(&self, collection: Collection, id: &str, doc: Document) -> AppResult<()>;

    async fn delete(&self, collection: Collection, id: &str) -> AppResult<()>;

    /// Registrar entrada de log; id e timestamp são atribuídos pelo store
    async fn append_log(&self, entry: HistoryLogEntry) -> AppResult<HistoryLog>;

    /// Aplicar um lote de escritas atomicamente
    async fn apply(&self, batch: WriteBatch) -> AppResult<()>;

    /// Assinar notificações push com o snapshot completo da coleção
    fn subscribe(&self, collection: Collection) -> broadcast::Receiver<Vec<Document>>;
}

/// Serializar um valor tipado para documento
pub fn encode<T: Serialize>(value: &T) -> AppResult<Document> {
    serde_json::to_value(value).map_err(AppError::from)
}

/// Desserializar um documento para valor tipado
pub fn decode<T: DeserializeOwned>(doc: Document) -> AppResult<T> {
    serde_json::from_value(doc).map_err(AppError::from)
}

/// Buscar um documento tipado por id
pub async fn get_typed<T: DeserializeOwned>(
    store: &dyn EntityStore,
    collection: Collection,
    id: &str,
) -> AppResult<Option<T>> {
    match store.get_by_id(collection, id).await? {
        Some(doc) => Ok(Some(decode(doc)?)),
        None => Ok(None),
    }
}

/// Listar todos os documentos de uma coleção como valores tipados
pub async fn list_typed<T: DeserializeOwned>(
    store: &dyn EntityStore,
    collection: Collection,
) -> AppResult<Vec<T>> {
    let docs = store.get_all(collection).await?;
    docs.into_iter().map(decode).collect()
}
