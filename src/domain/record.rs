// Evaluation records kept in the bounded history
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::degradation::{DegradationResult, ResistancePoint};
use super::error::EvaluationError;
use super::stress::{StressResult, TimeSeriesPoint};

pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Performance,
    Degradation,
}

impl RecordKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RecordKind::Performance => "performance",
            RecordKind::Degradation => "degradation",
        }
    }

    /// Name of the list this kind is persisted under.
    pub fn storage_key(self) -> &'static str {
        match self {
            RecordKind::Performance => "insulation_performance_history",
            RecordKind::Degradation => "insulation_degradation_history",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordKind {
    type Err = EvaluationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "performance" => Ok(RecordKind::Performance),
            "degradation" => Ok(RecordKind::Degradation),
            other => Err(EvaluationError::invalid(format!("unknown record kind '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceInputs {
    pub current: f64,
    pub temperature: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_series: Option<Vec<TimeSeriesPoint>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DegradationInputs {
    pub data: Vec<ResistancePoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RecordBody {
    Performance {
        inputs: PerformanceInputs,
        results: StressResult,
    },
    Degradation {
        inputs: DegradationInputs,
        results: DegradationResult,
    },
}

/// `{id, kind, createdAt, inputs, results}` once serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationRecord {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub body: RecordBody,
}

impl EvaluationRecord {
    pub fn kind(&self) -> RecordKind {
        match self.body {
            RecordBody::Performance { .. } => RecordKind::Performance,
            RecordBody::Degradation { .. } => RecordKind::Degradation,
        }
    }

    pub fn stress_result(&self) -> Option<&StressResult> {
        match &self.body {
            RecordBody::Performance { results, .. } => Some(results),
            RecordBody::Degradation { .. } => None,
        }
    }

    pub fn performance_inputs(&self) -> Option<&PerformanceInputs> {
        match &self.body {
            RecordBody::Performance { inputs, .. } => Some(inputs),
            RecordBody::Degradation { .. } => None,
        }
    }

    pub fn resistance_points(&self) -> Option<&[ResistancePoint]> {
        match &self.body {
            RecordBody::Degradation { inputs, .. } => Some(&inputs.data),
            RecordBody::Performance { .. } => None,
        }
    }
}

/// Hands out record ids derived from the wall clock in milliseconds, bumped so
/// that every id is strictly greater than the previous one.
#[derive(Debug, Default)]
pub struct RecordSequence {
    last: AtomicI64,
}

impl RecordSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&self, now: DateTime<Utc>) -> i64 {
        let candidate = now.timestamp_millis();
        let mut last = self.last.load(Ordering::Relaxed);
        loop {
            let id = candidate.max(last + 1);
            match self
                .last
                .compare_exchange_weak(last, id, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => return id,
                Err(actual) => last = actual,
            }
        }
    }

    pub fn stamp(&self, body: RecordBody) -> EvaluationRecord {
        let created_at = Utc::now();
        EvaluationRecord {
            id: self.next_id(created_at),
            created_at,
            body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::risk::RiskLevel;

    fn stress_body() -> RecordBody {
        RecordBody::Performance {
            inputs: PerformanceInputs {
                current: 20.0,
                temperature: 30.0,
                time_series: None,
            },
            results: StressResult {
                electrical_stress: 0.34,
                thermal_stress: 0.33,
                sensitivity: None,
                critical_current: 59.1,
                risk_electrical: RiskLevel::L1,
                risk_thermal: RiskLevel::L1,
                risk_sensitivity: RiskLevel::Baseline,
                critical_current_fallback: false,
                sensitivity_fallback: false,
            },
        }
    }

    #[test]
    fn test_ids_strictly_increase_within_same_millisecond() {
        let sequence = RecordSequence::new();
        let now = Utc::now();
        let a = sequence.next_id(now);
        let b = sequence.next_id(now);
        let c = sequence.next_id(now);
        assert_eq!(a, now.timestamp_millis());
        assert_eq!(b, a + 1);
        assert_eq!(c, a + 2);
    }

    #[test]
    fn test_record_json_shape() {
        let record = RecordSequence::new().stamp(stress_body());
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["kind"], "performance");
        assert!(json["id"].is_i64());
        assert!(json["createdAt"].is_string());
        assert_eq!(json["inputs"]["current"], 20.0);
        assert!(json["results"]["sensitivity"].is_null());
        assert_eq!(json["results"]["riskSensitivity"], "-");

        let back: EvaluationRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
        assert_eq!(back.kind(), RecordKind::Performance);
    }

    #[test]
    fn test_kind_parsing() {
        assert_eq!("degradation".parse::<RecordKind>().unwrap(), RecordKind::Degradation);
        assert!("all".parse::<RecordKind>().is_err());
        assert_eq!(RecordKind::Performance.storage_key(), "insulation_performance_history");
    }
}
