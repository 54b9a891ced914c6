// In-memory history repository
use crate::application::history_repository::{push_bounded, HistoryRepository};
use crate::domain::record::{EvaluationRecord, RecordKind};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// One newest-first list per record kind, bounded to `capacity`.
pub struct InMemoryHistoryRepository {
    capacity: usize,
    lists: RwLock<HashMap<RecordKind, Vec<EvaluationRecord>>>,
}

impl InMemoryHistoryRepository {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            lists: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl HistoryRepository for InMemoryHistoryRepository {
    async fn append(&self, record: EvaluationRecord) -> anyhow::Result<Option<EvaluationRecord>> {
        let mut lists = self.lists.write().await;
        let list = lists.entry(record.kind()).or_default();
        Ok(push_bounded(list, record, self.capacity))
    }

    async fn list(&self, kind: RecordKind) -> anyhow::Result<Vec<EvaluationRecord>> {
        let lists = self.lists.read().await;
        Ok(lists.get(&kind).cloned().unwrap_or_default())
    }

    async fn get(&self, kind: RecordKind, id: i64) -> anyhow::Result<Option<EvaluationRecord>> {
        let lists = self.lists.read().await;
        Ok(lists
            .get(&kind)
            .and_then(|list| list.iter().find(|r| r.id == id).cloned()))
    }

    async fn delete(&self, kind: RecordKind, id: i64) -> anyhow::Result<bool> {
        let mut lists = self.lists.write().await;
        let Some(list) = lists.get_mut(&kind) else {
            return Ok(false);
        };
        let before = list.len();
        list.retain(|r| r.id != id);
        Ok(list.len() != before)
    }

    async fn clear(&self, kind: RecordKind) -> anyhow::Result<usize> {
        let mut lists = self.lists.write().await;
        Ok(lists.remove(&kind).map(|list| list.len()).unwrap_or(0))
    }
}
