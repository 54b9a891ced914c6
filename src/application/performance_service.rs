// Performance service - Use case for electro-thermal stress evaluation
use crate::application::history_repository::HistoryRepository;
use crate::domain::input_buffer::PerformanceInputBuffer;
use crate::domain::record::{EvaluationRecord, PerformanceInputs, RecordBody, RecordSequence};
use crate::domain::stress::{Reading, StressEvaluator, TimeSeriesPoint};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Clone)]
pub struct PerformanceService {
    evaluator: StressEvaluator,
    repository: Arc<dyn HistoryRepository>,
    sequence: Arc<RecordSequence>,
}

impl PerformanceService {
    pub fn new(
        evaluator: StressEvaluator,
        repository: Arc<dyn HistoryRepository>,
        sequence: Arc<RecordSequence>,
    ) -> Self {
        Self {
            evaluator,
            repository,
            sequence,
        }
    }

    /// Evaluate one reading and persist the resulting record.
    pub async fn evaluate(
        &self,
        reading: Reading,
        time_series: Option<Vec<TimeSeriesPoint>>,
    ) -> anyhow::Result<EvaluationRecord> {
        let series = time_series.as_deref().unwrap_or_default();
        let results = self.evaluator.evaluate(reading, series);

        if results.critical_current_fallback {
            warn!(
                critical_current = results.critical_current,
                "regression has no positive root, using fallback critical current"
            );
        }
        if results.sensitivity_fallback {
            warn!("equal currents at both points, sensitivity taken from stress ratio");
        }

        let risks = (results.risk_electrical, results.risk_thermal, results.risk_sensitivity);
        let record = self.sequence.stamp(RecordBody::Performance {
            inputs: PerformanceInputs {
                current: reading.current,
                temperature: reading.temperature,
                time_series,
            },
            results,
        });

        if let Some(evicted) = self.repository.append(record.clone()).await? {
            tracing::debug!(evicted = evicted.id, "performance history full, oldest record evicted");
        }

        info!(
            id = record.id,
            current = reading.current,
            temperature = reading.temperature,
            electrical = %risks.0,
            thermal = %risks.1,
            sensitivity = %risks.2,
            "performance evaluation recorded"
        );
        Ok(record)
    }

    /// Evaluate a sequence of points in order. The first has no baseline; every
    /// later point is paired with its predecessor.
    pub async fn evaluate_sequence(
        &self,
        points: &[TimeSeriesPoint],
    ) -> anyhow::Result<Vec<EvaluationRecord>> {
        let mut records = Vec::with_capacity(points.len());
        for index in 0..points.len() {
            records.push(self.evaluate_step(points, index).await?);
        }
        Ok(records)
    }

    /// Evaluate the point at `index`, pairing it with the one before it.
    pub async fn evaluate_step(
        &self,
        points: &[TimeSeriesPoint],
        index: usize,
    ) -> anyhow::Result<EvaluationRecord> {
        let point = points
            .get(index)
            .ok_or_else(|| anyhow::anyhow!("no point at index {index}"))?;
        let reading = Reading::new(Some(point.current), Some(point.temperature))?;
        let series = index
            .checked_sub(1)
            .map(|prior| vec![points[prior], *point]);
        self.evaluate(reading, series).await
    }

    /// Evaluate everything entered into the buffer, then leave it empty.
    pub async fn evaluate_buffer(
        &self,
        buffer: &mut PerformanceInputBuffer,
    ) -> anyhow::Result<Vec<EvaluationRecord>> {
        let points = buffer.drain()?;
        self.evaluate_sequence(&points).await
    }
}
