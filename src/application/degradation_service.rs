// Degradation service - Use case for resistance pattern classification
use crate::application::history_repository::HistoryRepository;
use crate::domain::degradation::{classify, ResistancePoint, ResistanceSeries};
use crate::domain::record::{
    DegradationInputs, EvaluationRecord, RecordBody, RecordKind, RecordSequence,
};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Clone)]
pub struct DegradationService {
    repository: Arc<dyn HistoryRepository>,
    sequence: Arc<RecordSequence>,
}

impl DegradationService {
    pub fn new(repository: Arc<dyn HistoryRepository>, sequence: Arc<RecordSequence>) -> Self {
        Self {
            repository,
            sequence,
        }
    }

    /// Classify a series and persist the resulting record.
    pub async fn evaluate(&self, points: Vec<ResistancePoint>) -> anyhow::Result<EvaluationRecord> {
        let series = ResistanceSeries::from_points(points)?;
        let results = classify(&series);

        debug!(
            points = series.len(),
            decrease_rate_pct = results.decrease_rate_pct,
            volatility_pct = results.volatility_pct,
            local_dips = results.local_dip_count,
            "resistance series statistics"
        );

        let record = self.sequence.stamp(RecordBody::Degradation {
            inputs: DegradationInputs {
                data: series.into_points(),
            },
            results,
        });

        if let Some(evicted) = self.repository.append(record.clone()).await? {
            debug!(evicted = evicted.id, "degradation history full, oldest record evicted");
        }

        info!(id = record.id, pattern = ?record_pattern(&record), "degradation evaluation recorded");
        Ok(record)
    }

    /// Combine the series of the selected history records with new points,
    /// then classify. Later entries win for a repeated period.
    pub async fn evaluate_merged(
        &self,
        selected_ids: &[i64],
        new_points: Vec<ResistancePoint>,
    ) -> anyhow::Result<EvaluationRecord> {
        let mut combined = self.selected_points(selected_ids).await?;
        combined.extend(new_points);
        self.evaluate(combined).await
    }

    /// Points of the selected records, in selection order. Unknown ids are skipped.
    pub async fn selected_points(&self, selected_ids: &[i64]) -> anyhow::Result<Vec<ResistancePoint>> {
        let mut points = Vec::new();
        for id in selected_ids {
            match self.repository.get(RecordKind::Degradation, *id).await? {
                Some(record) => {
                    if let Some(data) = record.resistance_points() {
                        points.extend_from_slice(data);
                    }
                }
                None => debug!(id, "selected degradation record not found, skipping"),
            }
        }
        Ok(points)
    }
}

fn record_pattern(record: &EvaluationRecord) -> Option<&'static str> {
    match &record.body {
        RecordBody::Degradation { results, .. } => Some(results.pattern.label()),
        RecordBody::Performance { .. } => None,
    }
}
