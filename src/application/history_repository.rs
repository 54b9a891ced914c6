// Repository trait for the bounded evaluation history
use crate::domain::record::{EvaluationRecord, RecordKind};
use async_trait::async_trait;

#[async_trait]
pub trait HistoryRepository: Send + Sync {
    /// Insert a record at the head of its kind's list. Returns the record
    /// evicted to stay within capacity, if any.
    async fn append(&self, record: EvaluationRecord) -> anyhow::Result<Option<EvaluationRecord>>;

    /// All records of a kind, newest first
    async fn list(&self, kind: RecordKind) -> anyhow::Result<Vec<EvaluationRecord>>;

    async fn get(&self, kind: RecordKind, id: i64) -> anyhow::Result<Option<EvaluationRecord>>;

    /// Returns false when no record had that id
    async fn delete(&self, kind: RecordKind, id: i64) -> anyhow::Result<bool>;

    /// Remove every record of a kind and return how many were dropped
    async fn clear(&self, kind: RecordKind) -> anyhow::Result<usize>;
}

/// Newest-first insert shared by the repository adapters.
pub fn push_bounded(
    list: &mut Vec<EvaluationRecord>,
    record: EvaluationRecord,
    capacity: usize,
) -> Option<EvaluationRecord> {
    list.insert(0, record);
    if list.len() > capacity {
        list.pop()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::degradation::{classify, Period, ResistancePoint, ResistanceSeries};
    use crate::domain::record::{DegradationInputs, RecordBody, RecordSequence};

    fn record(sequence: &RecordSequence) -> EvaluationRecord {
        let point = ResistancePoint::new(Period::new(2024, 1).unwrap(), 500.0).unwrap();
        let series = ResistanceSeries::from_points([point]).unwrap();
        sequence.stamp(RecordBody::Degradation {
            results: classify(&series),
            inputs: DegradationInputs { data: vec![point] },
        })
    }

    #[test]
    fn test_push_bounded_evicts_oldest() {
        let sequence = RecordSequence::new();
        let mut list = Vec::new();
        let first = record(&sequence);
        let first_id = first.id;

        assert!(push_bounded(&mut list, first, 2).is_none());
        assert!(push_bounded(&mut list, record(&sequence), 2).is_none());
        let evicted = push_bounded(&mut list, record(&sequence), 2).unwrap();

        assert_eq!(evicted.id, first_id);
        assert_eq!(list.len(), 2);
        assert!(list[0].id > list[1].id);
    }
}
