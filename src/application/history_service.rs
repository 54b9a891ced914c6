// History service - Use cases for browsing, deleting and charting saved records
use crate::application::history_repository::HistoryRepository;
use crate::domain::chart::{degradation_chart, performance_chart, ChartData};
use crate::domain::degradation::{ResistancePoint, ResistanceSeries};
use crate::domain::record::{EvaluationRecord, RecordKind};
use crate::domain::stress::Reading;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct HistoryService {
    repository: Arc<dyn HistoryRepository>,
}

impl HistoryService {
    pub fn new(repository: Arc<dyn HistoryRepository>) -> Self {
        Self { repository }
    }

    pub async fn list(&self, kind: RecordKind) -> anyhow::Result<Vec<EvaluationRecord>> {
        self.repository.list(kind).await
    }

    pub async fn get(&self, kind: RecordKind, id: i64) -> anyhow::Result<Option<EvaluationRecord>> {
        self.repository.get(kind, id).await
    }

    pub async fn delete(&self, kind: RecordKind, id: i64) -> anyhow::Result<bool> {
        let deleted = self.repository.delete(kind, id).await?;
        if deleted {
            info!(%kind, id, "history record deleted");
        }
        Ok(deleted)
    }

    pub async fn clear(&self, kind: RecordKind) -> anyhow::Result<usize> {
        let removed = self.repository.clear(kind).await?;
        info!(%kind, removed, "history cleared");
        Ok(removed)
    }

    /// Resistance trend of the selected degradation records, merged by period.
    pub async fn degradation_chart(&self, ids: &[i64]) -> anyhow::Result<ChartData> {
        let mut points: Vec<ResistancePoint> = Vec::new();
        for record in self.selected(RecordKind::Degradation, ids).await? {
            if let Some(data) = record.resistance_points() {
                points.extend_from_slice(data);
            }
        }
        Ok(match ResistanceSeries::from_points(points) {
            Ok(series) => degradation_chart(series.points()),
            Err(_) => degradation_chart(&[]),
        })
    }

    /// Current and temperature of the selected performance records.
    pub async fn performance_chart(&self, ids: &[i64]) -> anyhow::Result<ChartData> {
        let readings: Vec<Reading> = self
            .selected(RecordKind::Performance, ids)
            .await?
            .iter()
            .filter_map(EvaluationRecord::performance_inputs)
            .map(|inputs| Reading {
                current: inputs.current,
                temperature: inputs.temperature,
            })
            .collect();
        Ok(performance_chart(&readings))
    }

    /// Records matching `ids`, in the order the ids were given.
    async fn selected(&self, kind: RecordKind, ids: &[i64]) -> anyhow::Result<Vec<EvaluationRecord>> {
        let history = self.repository.list(kind).await?;
        Ok(ids
            .iter()
            .filter_map(|id| history.iter().find(|r| r.id == *id).cloned())
            .collect())
    }
}
