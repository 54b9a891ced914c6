// Checklist service - Independently scoped checklist contexts
use crate::application::bounded_table::BoundedTable;
use crate::application::history_repository::HistoryRepository;
use crate::domain::checklist::{CategoryScore, ChecklistCategory, ChecklistSheet};
use crate::domain::error::EvaluationError;
use crate::domain::record::RecordKind;
use crate::domain::risk::RiskLevel;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;

/// Live checklist contexts kept when no limit is configured.
pub const DEFAULT_CHECKLIST_CONTEXTS: usize = 100;

/// Opaque handle of one checklist instance, e.g. the live panel or a history detail view.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChecklistContextId(String);

impl ChecklistContextId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }
}

impl fmt::Display for ChecklistContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChecklistItemState {
    pub question: &'static str,
    pub weight: u8,
    pub checked: bool,
}

/// One active category with its questions, in table order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChecklistSection {
    pub category: ChecklistCategory,
    pub title: &'static str,
    pub items: Vec<ChecklistItemState>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistSnapshot {
    pub context: ChecklistContextId,
    pub active: Vec<ChecklistCategory>,
    pub all_normal: bool,
    pub scores: Vec<CategoryScore>,
    pub sections: Vec<ChecklistSection>,
}

impl ChecklistSnapshot {
    fn of(context: &ChecklistContextId, sheet: &ChecklistSheet) -> Self {
        let sections = sheet
            .active()
            .iter()
            .map(|category| ChecklistSection {
                category: *category,
                title: category.title(),
                items: category
                    .items()
                    .iter()
                    .enumerate()
                    .map(|(index, item)| ChecklistItemState {
                        question: item.question,
                        weight: item.weight,
                        checked: sheet.is_checked(*category, index),
                    })
                    .collect(),
            })
            .collect();

        Self {
            context: context.clone(),
            active: sheet.active().to_vec(),
            all_normal: sheet.all_normal(),
            scores: sheet.scores(),
            sections,
        }
    }
}

/// At most `capacity` contexts stay open; opening one more closes the oldest.
#[derive(Clone)]
pub struct ChecklistService {
    repository: Arc<dyn HistoryRepository>,
    contexts: Arc<Mutex<BoundedTable<ChecklistContextId, ChecklistSheet>>>,
    next_context: Arc<AtomicU64>,
}

impl ChecklistService {
    pub fn new(repository: Arc<dyn HistoryRepository>, capacity: usize) -> Self {
        Self {
            repository,
            contexts: Arc::new(Mutex::new(BoundedTable::new(capacity))),
            next_context: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Open a fresh context for the given risk levels.
    pub async fn open(
        &self,
        electrical: RiskLevel,
        thermal: RiskLevel,
        sensitivity: RiskLevel,
    ) -> ChecklistSnapshot {
        let n = self.next_context.fetch_add(1, Ordering::Relaxed);
        let context = ChecklistContextId::new(format!("ctx-{n}"));
        let sheet = ChecklistSheet::for_risks(electrical, thermal, sensitivity);
        let snapshot = ChecklistSnapshot::of(&context, &sheet);

        let mut contexts = self.contexts.lock().await;
        if let Some(evicted) = contexts.insert(context.clone(), sheet) {
            tracing::debug!(%evicted, live = contexts.len(), "checklist context limit reached, oldest closed");
        }
        tracing::debug!(%context, active = ?snapshot.active, "checklist context opened");
        snapshot
    }

    /// Open a context from the risk levels stored in a performance record.
    pub async fn open_for_record(&self, record_id: i64) -> anyhow::Result<Option<ChecklistSnapshot>> {
        let Some(record) = self.repository.get(RecordKind::Performance, record_id).await? else {
            return Ok(None);
        };
        let Some(results) = record.stress_result() else {
            return Ok(None);
        };
        Ok(Some(
            self.open(results.risk_electrical, results.risk_thermal, results.risk_sensitivity)
                .await,
        ))
    }

    pub async fn snapshot(&self, context: &ChecklistContextId) -> Option<ChecklistSnapshot> {
        let contexts = self.contexts.lock().await;
        contexts
            .get(context)
            .map(|sheet| ChecklistSnapshot::of(context, sheet))
    }

    /// Set one item and recompute the scores of that context only.
    pub async fn set_item(
        &self,
        context: &ChecklistContextId,
        category: ChecklistCategory,
        index: usize,
        checked: bool,
    ) -> Result<Option<ChecklistSnapshot>, EvaluationError> {
        let mut contexts = self.contexts.lock().await;
        let Some(sheet) = contexts.get_mut(context) else {
            return Ok(None);
        };
        let score = sheet.set(category, index, checked)?;
        tracing::debug!(
            %context,
            ?category,
            index,
            checked,
            total = score.total_weight,
            tier = ?score.tier,
            "checklist item updated"
        );
        Ok(Some(ChecklistSnapshot::of(context, sheet)))
    }

    pub async fn close(&self, context: &ChecklistContextId) -> bool {
        self.contexts.lock().await.remove(context).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::performance_service::PerformanceService;
    use crate::domain::checklist::ChecklistTier;
    use crate::domain::record::RecordSequence;
    use crate::domain::stress::{Reading, StressEvaluator};
    use crate::infrastructure::memory_repository::InMemoryHistoryRepository;

    fn service() -> ChecklistService {
        ChecklistService::new(Arc::new(InMemoryHistoryRepository::new(100)), DEFAULT_CHECKLIST_CONTEXTS)
    }

    #[tokio::test]
    async fn test_contexts_do_not_share_state() {
        let service = service();
        let live = service.open(RiskLevel::L3, RiskLevel::L2, RiskLevel::L2).await;
        let detail = service.open(RiskLevel::L3, RiskLevel::L2, RiskLevel::L2).await;
        assert_ne!(live.context, detail.context);

        let updated = service
            .set_item(&live.context, ChecklistCategory::Thermal, 0, true)
            .await
            .unwrap()
            .unwrap();
        let thermal = updated
            .scores
            .iter()
            .find(|s| s.category == ChecklistCategory::Thermal)
            .unwrap();
        assert_eq!(thermal.total_weight, 3);
        assert_eq!(thermal.tier, ChecklistTier::Warning);
        let section = updated
            .sections
            .iter()
            .find(|s| s.category == ChecklistCategory::Thermal)
            .unwrap();
        assert!(section.items[0].checked);
        assert_eq!(section.items[0].weight, 3);
        assert!(!section.items[0].question.is_empty());

        let untouched = service.snapshot(&detail.context).await.unwrap();
        assert!(untouched.scores.iter().all(|s| s.total_weight == 0));
        assert!(untouched.scores.iter().all(|s| s.tier == ChecklistTier::Unevaluated));
    }

    #[tokio::test]
    async fn test_all_normal_context() {
        let service = service();
        let snapshot = service.open(RiskLevel::L1, RiskLevel::L1, RiskLevel::Baseline).await;
        assert!(snapshot.all_normal);
        assert!(snapshot.scores.is_empty());

        let err = service
            .set_item(&snapshot.context, ChecklistCategory::Electrical, 0, true)
            .await
            .unwrap_err();
        assert!(matches!(err, EvaluationError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_open_contexts_are_capped() {
        let service = ChecklistService::new(Arc::new(InMemoryHistoryRepository::new(100)), 3);
        let mut opened = Vec::new();
        for _ in 0..10 {
            opened.push(service.open(RiskLevel::L2, RiskLevel::L2, RiskLevel::L2).await.context);
        }

        let mut live = Vec::new();
        for context in &opened {
            if service.snapshot(context).await.is_some() {
                live.push(context.clone());
            }
        }
        assert_eq!(live, opened[7..].to_vec());
    }

    #[tokio::test]
    async fn test_sections_list_questions_of_active_categories() {
        let service = service();
        let snapshot = service.open(RiskLevel::L1, RiskLevel::L1, RiskLevel::L3).await;
        assert_eq!(snapshot.sections.len(), 1);

        let section = &snapshot.sections[0];
        assert_eq!(section.category, ChecklistCategory::Sensitivity);
        assert_eq!(section.title, "Heating sensitivity");
        let weights: Vec<u8> = section.items.iter().map(|i| i.weight).collect();
        assert_eq!(weights, vec![1, 3, 3, 2, 1]);
        assert!(section.items.iter().all(|i| !i.checked));
    }

    #[tokio::test]
    async fn test_unknown_and_closed_contexts() {
        let service = service();
        let missing = ChecklistContextId::new("nope");
        assert!(service.snapshot(&missing).await.is_none());
        assert!(
            service
                .set_item(&missing, ChecklistCategory::Electrical, 0, true)
                .await
                .unwrap()
                .is_none()
        );

        let snapshot = service.open(RiskLevel::L2, RiskLevel::L1, RiskLevel::L1).await;
        assert!(service.close(&snapshot.context).await);
        assert!(!service.close(&snapshot.context).await);
    }

    #[tokio::test]
    async fn test_open_for_record_uses_stored_risks() {
        let repository: Arc<dyn HistoryRepository> = Arc::new(InMemoryHistoryRepository::new(100));
        let performance = PerformanceService::new(
            StressEvaluator::default(),
            repository.clone(),
            Arc::new(RecordSequence::new()),
        );
        let service = ChecklistService::new(repository, DEFAULT_CHECKLIST_CONTEXTS);

        let record = performance
            .evaluate(Reading::new(Some(110.0), Some(95.0)).unwrap(), None)
            .await
            .unwrap();
        let snapshot = service.open_for_record(record.id).await.unwrap().unwrap();
        assert_eq!(
            snapshot.active,
            vec![ChecklistCategory::Electrical, ChecklistCategory::Thermal]
        );
        assert!(service.open_for_record(1).await.unwrap().is_none());
    }
}
