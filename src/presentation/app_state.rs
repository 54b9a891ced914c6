// Application state for HTTP handlers
use crate::application::checklist_service::ChecklistService;
use crate::application::degradation_service::DegradationService;
use crate::application::history_repository::HistoryRepository;
use crate::application::history_service::HistoryService;
use crate::application::input_session_service::InputSessionService;
use crate::application::performance_service::PerformanceService;
use crate::application::streaming_service::StreamingBatchService;
use crate::domain::record::RecordSequence;
use crate::domain::stress::StressEvaluator;
use crate::infrastructure::config::AppConfig;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub performance_service: PerformanceService,
    pub degradation_service: DegradationService,
    pub history_service: HistoryService,
    pub checklist_service: ChecklistService,
    pub input_session_service: InputSessionService,
    pub streaming_service: StreamingBatchService,
}

impl AppState {
    /// Wire every service onto one repository and one id sequence.
    pub fn build(repository: Arc<dyn HistoryRepository>, config: &AppConfig) -> Self {
        let sequence = Arc::new(RecordSequence::new());
        let performance_service = PerformanceService::new(
            StressEvaluator::new(config.model),
            repository.clone(),
            sequence.clone(),
        );

        Self {
            streaming_service: StreamingBatchService::new(performance_service.clone()),
            input_session_service: InputSessionService::new(
                performance_service.clone(),
                config.sessions.input_sessions,
            ),
            degradation_service: DegradationService::new(repository.clone(), sequence),
            history_service: HistoryService::new(repository.clone()),
            checklist_service: ChecklistService::new(repository, config.sessions.checklist_contexts),
            performance_service,
        }
    }
}
