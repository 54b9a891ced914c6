// Streaming batch service - Evaluates uploaded rows and streams records as they are saved
use crate::application::performance_service::PerformanceService;
use crate::domain::record::EvaluationRecord;
use crate::domain::stress::{Reading, TimeSeriesPoint};
use serde::Serialize;
use std::time::Instant;
use tokio::sync::mpsc;

/// Offset in minutes between consecutive uploaded rows.
const ROW_INTERVAL_MINUTES: u32 = 5;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum BatchMessage {
    Started {
        total: usize,
    },
    Record {
        row: usize,
        record: Box<EvaluationRecord>,
    },
    Rejected {
        row: usize,
        message: String,
    },
    #[serde(rename_all = "camelCase")]
    Complete {
        evaluated: usize,
        rejected: usize,
        duration_ms: u64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatchRow {
    pub current: f64,
    pub temperature: f64,
}

#[derive(Clone)]
pub struct StreamingBatchService {
    performance: PerformanceService,
}

impl StreamingBatchService {
    pub fn new(performance: PerformanceService) -> Self {
        Self { performance }
    }

    /// Evaluate rows strictly in order, each against the previous accepted row, so
    /// record ids follow row order. Messages are sent as each record is stored.
    /// Every row is evaluated even if the receiver goes away part way through.
    pub fn stream_batch(&self, rows: Vec<BatchRow>) -> mpsc::Receiver<BatchMessage> {
        let (tx, rx) = mpsc::channel(100);
        let performance = self.performance.clone();

        tokio::spawn(async move {
            let start_time = Instant::now();
            let total = rows.len();
            let mut connected = tx.send(BatchMessage::Started { total }).await.is_ok();
            if !connected {
                tracing::warn!(remaining = total, "batch receiver dropped before the first row");
            }

            // rejected rows are left out, so each row pairs with the last accepted one
            let mut accepted: Vec<TimeSeriesPoint> = Vec::with_capacity(rows.len());
            let mut evaluated = 0;
            let mut rejected = 0;
            for (row, values) in rows.into_iter().enumerate() {
                let msg = match Reading::new(Some(values.current), Some(values.temperature)) {
                    Ok(reading) => {
                        let time = accepted.len() as u32 * ROW_INTERVAL_MINUTES;
                        accepted.push(TimeSeriesPoint::new(time, reading.current, reading.temperature));
                        match performance.evaluate_step(&accepted, accepted.len() - 1).await {
                            Ok(record) => {
                                evaluated += 1;
                                BatchMessage::Record {
                                    row,
                                    record: Box::new(record),
                                }
                            }
                            Err(e) => {
                                rejected += 1;
                                tracing::error!(row, error = %e, "failed to store batch record");
                                BatchMessage::Rejected {
                                    row,
                                    message: e.to_string(),
                                }
                            }
                        }
                    }
                    Err(e) => {
                        rejected += 1;
                        tracing::warn!(row, error = %e, "batch row rejected");
                        BatchMessage::Rejected {
                            row,
                            message: e.to_string(),
                        }
                    }
                };
                if connected && tx.send(msg).await.is_err() {
                    connected = false;
                    tracing::warn!(
                        row,
                        remaining = total - row - 1,
                        "batch receiver dropped, evaluating remaining rows without progress"
                    );
                }
            }

            let duration_ms = start_time.elapsed().as_millis() as u64;
            tracing::info!(evaluated, rejected, duration_ms, "batch evaluation complete");
            if !connected {
                return;
            }
            let _ = tx
                .send(BatchMessage::Complete {
                    evaluated,
                    rejected,
                    duration_ms,
                })
                .await;
        });

        rx
    }
}
