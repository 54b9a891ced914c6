// Input session service - Multi-point performance entry, one buffer per session
use crate::application::bounded_table::BoundedTable;
use crate::application::performance_service::PerformanceService;
use crate::domain::error::EvaluationError;
use crate::domain::input_buffer::PerformanceInputBuffer;
use crate::domain::record::EvaluationRecord;
use crate::domain::stress::{Reading, TimeSeriesPoint};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;

/// Live input sessions kept when no limit is configured.
pub const DEFAULT_INPUT_SESSIONS: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InputSessionId(String);

impl InputSessionId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }
}

impl fmt::Display for InputSessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InputSessionView {
    pub session: InputSessionId,
    pub entries: Vec<TimeSeriesPoint>,
    pub next_time: u32,
    /// Latest entry, evaluated as I_max / T_max
    pub last: Option<TimeSeriesPoint>,
}

impl InputSessionView {
    fn of(session: &InputSessionId, buffer: &PerformanceInputBuffer) -> Self {
        Self {
            session: session.clone(),
            entries: buffer.points().to_vec(),
            next_time: buffer.next_time(),
            last: buffer.last().copied(),
        }
    }
}

#[derive(Clone)]
pub struct InputSessionService {
    performance: PerformanceService,
    sessions: Arc<Mutex<BoundedTable<InputSessionId, PerformanceInputBuffer>>>,
    next_session: Arc<AtomicU64>,
}

impl InputSessionService {
    pub fn new(performance: PerformanceService, capacity: usize) -> Self {
        Self {
            performance,
            sessions: Arc::new(Mutex::new(BoundedTable::new(capacity))),
            next_session: Arc::new(AtomicU64::new(1)),
        }
    }

    pub async fn open(&self) -> InputSessionView {
        let n = self.next_session.fetch_add(1, Ordering::Relaxed);
        let session = InputSessionId::new(format!("session-{n}"));
        let buffer = PerformanceInputBuffer::new();
        let view = InputSessionView::of(&session, &buffer);

        let mut sessions = self.sessions.lock().await;
        if let Some(evicted) = sessions.insert(session.clone(), buffer) {
            tracing::debug!(%evicted, live = sessions.len(), "input session limit reached, oldest closed");
        }
        view
    }

    pub async fn view(&self, session: &InputSessionId) -> Option<InputSessionView> {
        let sessions = self.sessions.lock().await;
        sessions
            .get(session)
            .map(|buffer| InputSessionView::of(session, buffer))
    }

    /// Stamp a reading at the session's next 5-minute offset.
    pub async fn push(&self, session: &InputSessionId, reading: Reading) -> Option<InputSessionView> {
        let mut sessions = self.sessions.lock().await;
        let buffer = sessions.get_mut(session)?;
        let point = buffer.push(reading);
        tracing::debug!(%session, time = point.time, "entry buffered");
        Some(InputSessionView::of(session, buffer))
    }

    pub async fn remove(
        &self,
        session: &InputSessionId,
        index: usize,
    ) -> Result<Option<InputSessionView>, EvaluationError> {
        let mut sessions = self.sessions.lock().await;
        let Some(buffer) = sessions.get_mut(session) else {
            return Ok(None);
        };
        buffer.remove(index)?;
        Ok(Some(InputSessionView::of(session, buffer)))
    }

    pub async fn reset(&self, session: &InputSessionId) -> Option<InputSessionView> {
        let mut sessions = self.sessions.lock().await;
        let buffer = sessions.get_mut(session)?;
        buffer.reset();
        Some(InputSessionView::of(session, buffer))
    }

    /// Evaluate every buffered entry in order and leave the session empty.
    pub async fn evaluate(
        &self,
        session: &InputSessionId,
    ) -> anyhow::Result<Option<Vec<EvaluationRecord>>> {
        let mut sessions = self.sessions.lock().await;
        let Some(buffer) = sessions.get_mut(session) else {
            return Ok(None);
        };
        let records = self.performance.evaluate_buffer(buffer).await?;
        tracing::info!(%session, records = records.len(), "input session evaluated");
        Ok(Some(records))
    }

    pub async fn close(&self, session: &InputSessionId) -> bool {
        self.sessions.lock().await.remove(session).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::history_repository::HistoryRepository;
    use crate::domain::record::{RecordKind, RecordSequence};
    use crate::domain::stress::StressEvaluator;
    use crate::infrastructure::memory_repository::InMemoryHistoryRepository;

    fn service(capacity: usize) -> (InputSessionService, Arc<InMemoryHistoryRepository>) {
        let repository = Arc::new(InMemoryHistoryRepository::new(100));
        let performance = PerformanceService::new(
            StressEvaluator::default(),
            repository.clone(),
            Arc::new(RecordSequence::new()),
        );
        (InputSessionService::new(performance, capacity), repository)
    }

    fn reading(current: f64, temperature: f64) -> Reading {
        Reading::new(Some(current), Some(temperature)).unwrap()
    }

    #[tokio::test]
    async fn test_entries_evaluate_and_drain() {
        let (service, repository) = service(DEFAULT_INPUT_SESSIONS);
        let session = service.open().await.session;

        service.push(&session, reading(20.0, 40.0)).await.unwrap();
        service.push(&session, reading(30.0, 45.0)).await.unwrap();
        let view = service.push(&session, reading(40.0, 60.0)).await.unwrap();
        let times: Vec<u32> = view.entries.iter().map(|p| p.time).collect();
        assert_eq!(times, vec![0, 5, 10]);
        assert_eq!(view.last.map(|p| p.current), Some(40.0));

        let records = service.evaluate(&session).await.unwrap().unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].stress_result().unwrap().sensitivity, None);
        assert!((records[2].stress_result().unwrap().sensitivity.unwrap() - 1.5).abs() < 1e-12);
        assert_eq!(repository.list(RecordKind::Performance).await.unwrap().len(), 3);

        let view = service.view(&session).await.unwrap();
        assert!(view.entries.is_empty());
        assert_eq!(view.next_time, 0);
    }

    #[tokio::test]
    async fn test_single_entry_is_not_evaluated() {
        let (service, repository) = service(DEFAULT_INPUT_SESSIONS);
        let session = service.open().await.session;
        service.push(&session, reading(20.0, 40.0)).await.unwrap();

        let err = service.evaluate(&session).await.unwrap_err();
        assert!(err.downcast_ref::<EvaluationError>().is_some());
        assert_eq!(service.view(&session).await.unwrap().entries.len(), 1);
        assert!(repository.list(RecordKind::Performance).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_remove_and_reset() {
        let (service, _) = service(DEFAULT_INPUT_SESSIONS);
        let session = service.open().await.session;
        service.push(&session, reading(20.0, 40.0)).await.unwrap();
        service.push(&session, reading(30.0, 45.0)).await.unwrap();

        let view = service.remove(&session, 0).await.unwrap().unwrap();
        assert_eq!(view.entries.len(), 1);
        assert_eq!(view.next_time, 10);
        assert!(service.remove(&session, 5).await.is_err());

        let view = service.reset(&session).await.unwrap();
        assert!(view.entries.is_empty());
        assert_eq!(view.next_time, 0);
    }

    #[tokio::test]
    async fn test_sessions_are_isolated_and_capped() {
        let (service, _) = service(2);
        let first = service.open().await.session;
        let second = service.open().await.session;
        service.push(&first, reading(20.0, 40.0)).await.unwrap();
        assert!(service.view(&second).await.unwrap().entries.is_empty());

        let third = service.open().await.session;
        assert!(service.view(&first).await.is_none());
        assert!(service.push(&first, reading(20.0, 40.0)).await.is_none());
        assert!(service.view(&third).await.is_some());

        assert!(service.close(&second).await);
        assert!(!service.close(&second).await);
    }
}
