// JSON file history repository - one file per record kind
use crate::application::history_repository::{push_bounded, HistoryRepository};
use crate::domain::record::{EvaluationRecord, RecordKind};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

pub struct JsonFileHistoryRepository {
    dir: PathBuf,
    capacity: usize,
    // serializes read-modify-write cycles
    lock: Mutex<()>,
}

impl JsonFileHistoryRepository {
    pub async fn open(dir: impl AsRef<Path>, capacity: usize) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create history directory {}", dir.display()))?;
        tracing::info!(dir = %dir.display(), capacity, "using file-backed history");
        Ok(Self {
            dir,
            capacity,
            lock: Mutex::new(()),
        })
    }

    fn path_for(&self, kind: RecordKind) -> PathBuf {
        self.dir.join(format!("{}.json", kind.storage_key()))
    }

    async fn load(&self, kind: RecordKind) -> Result<Vec<EvaluationRecord>> {
        let path = self.path_for(kind);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", path.display()));
            }
        };
        serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse history file {}", path.display()))
    }

    async fn store(&self, kind: RecordKind, records: &[EvaluationRecord]) -> Result<()> {
        let path = self.path_for(kind);
        let tmp = path.with_extension("json.tmp");
        let bytes = serde_json::to_vec(records).context("Failed to serialize history")?;
        tokio::fs::write(&tmp, bytes)
            .await
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .with_context(|| format!("Failed to replace {}", path.display()))
    }
}

#[async_trait]
impl HistoryRepository for JsonFileHistoryRepository {
    async fn append(&self, record: EvaluationRecord) -> Result<Option<EvaluationRecord>> {
        let _guard = self.lock.lock().await;
        let kind = record.kind();
        let mut records = self.load(kind).await?;
        let evicted = push_bounded(&mut records, record, self.capacity);
        self.store(kind, &records).await?;
        Ok(evicted)
    }

    async fn list(&self, kind: RecordKind) -> Result<Vec<EvaluationRecord>> {
        let _guard = self.lock.lock().await;
        self.load(kind).await
    }

    async fn get(&self, kind: RecordKind, id: i64) -> Result<Option<EvaluationRecord>> {
        let _guard = self.lock.lock().await;
        Ok(self.load(kind).await?.into_iter().find(|r| r.id == id))
    }

    async fn delete(&self, kind: RecordKind, id: i64) -> Result<bool> {
        let _guard = self.lock.lock().await;
        let mut records = self.load(kind).await?;
        let before = records.len();
        records.retain(|r| r.id != id);
        if records.len() == before {
            return Ok(false);
        }
        self.store(kind, &records).await?;
        Ok(true)
    }

    async fn clear(&self, kind: RecordKind) -> Result<usize> {
        let _guard = self.lock.lock().await;
        let removed = self.load(kind).await?.len();
        let path = self.path_for(kind);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(removed),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(0),
            Err(e) => Err(e).with_context(|| format!("Failed to remove {}", path.display())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::degradation::{classify, Period, ResistancePoint, ResistanceSeries};
    use crate::domain::record::{DegradationInputs, RecordBody, RecordSequence};

    fn degradation_record(sequence: &RecordSequence, resistance: f64) -> EvaluationRecord {
        let point = ResistancePoint::new(Period::new(2024, 5).unwrap(), resistance).unwrap();
        let series = ResistanceSeries::from_points([point]).unwrap();
        sequence.stamp(RecordBody::Degradation {
            results: classify(&series),
            inputs: DegradationInputs { data: vec![point] },
        })
    }

    #[tokio::test]
    async fn test_records_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let sequence = RecordSequence::new();
        let record = degradation_record(&sequence, 1500.0);

        {
            let repository = JsonFileHistoryRepository::open(dir.path(), 100).await.unwrap();
            repository.append(record.clone()).await.unwrap();
        }

        let repository = JsonFileHistoryRepository::open(dir.path(), 100).await.unwrap();
        assert_eq!(
            repository.get(RecordKind::Degradation, record.id).await.unwrap(),
            Some(record)
        );
        assert!(repository.list(RecordKind::Performance).await.unwrap().is_empty());
        assert!(dir.path().join("insulation_degradation_history.json").exists());
    }

    #[tokio::test]
    async fn test_capacity_delete_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let repository = JsonFileHistoryRepository::open(dir.path(), 2).await.unwrap();
        let sequence = RecordSequence::new();

        let first = degradation_record(&sequence, 100.0);
        let first_id = first.id;
        repository.append(first).await.unwrap();
        let second = degradation_record(&sequence, 200.0);
        let second_id = second.id;
        repository.append(second).await.unwrap();
        let evicted = repository.append(degradation_record(&sequence, 300.0)).await.unwrap();
        assert_eq!(evicted.map(|r| r.id), Some(first_id));

        assert!(repository.delete(RecordKind::Degradation, second_id).await.unwrap());
        assert!(!repository.delete(RecordKind::Degradation, second_id).await.unwrap());
        assert_eq!(repository.clear(RecordKind::Degradation).await.unwrap(), 1);
        assert_eq!(repository.clear(RecordKind::Degradation).await.unwrap(), 0);
    }
}
