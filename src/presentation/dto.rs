// Request and response bodies of the HTTP API
use crate::application::checklist_service::ChecklistSnapshot;
use crate::application::streaming_service::BatchRow;
use crate::domain::chart::ChartData;
use crate::domain::checklist::ChecklistCategory;
use crate::domain::degradation::{Period, ResistancePoint};
use crate::domain::error::EvaluationError;
use crate::domain::record::EvaluationRecord;
use crate::domain::risk::{RiskLevel, RiskMetric};
use crate::domain::stress::{Reading, StressResult, TimeSeriesPoint};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceRequest {
    pub current: Option<f64>,
    pub temperature: Option<f64>,
    #[serde(default)]
    pub time_series: Option<Vec<TimeSeriesPoint>>,
}

impl PerformanceRequest {
    pub fn reading(&self) -> Result<Reading, EvaluationError> {
        Reading::new(self.current, self.temperature)
    }
}

/// One entry of an input session
#[derive(Debug, Deserialize)]
pub struct EntryRequest {
    pub current: Option<f64>,
    pub temperature: Option<f64>,
}

impl EntryRequest {
    pub fn reading(&self) -> Result<Reading, EvaluationError> {
        Reading::new(self.current, self.temperature)
    }
}

#[derive(Debug, Deserialize)]
pub struct ReadingRow {
    pub current: f64,
    pub temperature: f64,
}

#[derive(Debug, Deserialize)]
pub struct PerformanceBatchRequest {
    pub rows: Vec<ReadingRow>,
}

impl PerformanceBatchRequest {
    pub fn into_rows(self) -> Result<Vec<BatchRow>, EvaluationError> {
        if self.rows.is_empty() {
            return Err(EvaluationError::invalid("no valid data rows were supplied"));
        }
        Ok(self
            .rows
            .into_iter()
            .map(|r| BatchRow {
                current: r.current,
                temperature: r.temperature,
            })
            .collect())
    }
}

/// One resistance entry, either `{period, resistance}` or `{year, month, resistance}`.
#[derive(Debug, Deserialize)]
pub struct ResistanceRow {
    pub period: Option<String>,
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub resistance: Option<f64>,
}

impl ResistanceRow {
    pub fn into_point(self) -> Result<ResistancePoint, EvaluationError> {
        let period = match (self.period, self.year, self.month) {
            (Some(period), _, _) => period.parse::<Period>()?,
            (None, Some(year), Some(month)) => Period::new(year, month)?,
            _ => {
                return Err(EvaluationError::invalid(
                    "year, month and resistance are all required",
                ));
            }
        };
        let resistance = self.resistance.ok_or_else(|| {
            EvaluationError::invalid("year, month and resistance are all required")
        })?;
        ResistancePoint::new(period, resistance)
    }
}

fn into_points(rows: Vec<ResistanceRow>) -> Result<Vec<ResistancePoint>, EvaluationError> {
    rows.into_iter().map(ResistanceRow::into_point).collect()
}

#[derive(Debug, Deserialize)]
pub struct DegradationRequest {
    pub data: Vec<ResistanceRow>,
}

impl DegradationRequest {
    pub fn into_points(self) -> Result<Vec<ResistancePoint>, EvaluationError> {
        into_points(self.data)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeRequest {
    #[serde(default)]
    pub selected_ids: Vec<i64>,
    #[serde(default)]
    pub data: Vec<ResistanceRow>,
}

impl MergeRequest {
    pub fn into_parts(self) -> Result<(Vec<i64>, Vec<ResistancePoint>), EvaluationError> {
        Ok((self.selected_ids, into_points(self.data)?))
    }
}

#[derive(Debug, Deserialize)]
pub struct SelectionQuery {
    pub ids: Option<String>,
}

impl SelectionQuery {
    /// Comma separated record ids
    pub fn ids(&self) -> Result<Vec<i64>, EvaluationError> {
        let Some(raw) = self.ids.as_deref() else {
            return Ok(Vec::new());
        };
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<i64>()
                    .map_err(|_| EvaluationError::invalid(format!("'{s}' is not a record id")))
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenChecklistRequest {
    pub record_id: Option<i64>,
    pub risk_electrical: Option<RiskLevel>,
    pub risk_thermal: Option<RiskLevel>,
    pub risk_sensitivity: Option<RiskLevel>,
}

#[derive(Debug, Deserialize)]
pub struct SetItemRequest {
    pub category: ChecklistCategory,
    pub index: usize,
    pub checked: bool,
}

#[derive(Debug, Serialize)]
pub struct RiskView {
    pub metric: RiskMetric,
    pub value: Option<f64>,
    pub level: RiskLevel,
    pub name: &'static str,
    pub class: &'static str,
}

impl RiskView {
    fn new(metric: RiskMetric, value: Option<f64>, level: RiskLevel) -> Self {
        Self {
            metric,
            value,
            level,
            name: level.display_name(metric),
            class: level.severity_class(),
        }
    }

    pub fn for_result(result: &StressResult) -> Vec<RiskView> {
        vec![
            RiskView::new(
                RiskMetric::Electrical,
                Some(result.electrical_stress),
                result.risk_electrical,
            ),
            RiskView::new(
                RiskMetric::Thermal,
                Some(result.thermal_stress),
                result.risk_thermal,
            ),
            RiskView::new(
                RiskMetric::Sensitivity,
                result.sensitivity,
                result.risk_sensitivity,
            ),
        ]
    }
}

#[derive(Debug, Serialize)]
pub struct PerformanceView {
    pub record: EvaluationRecord,
    pub risks: Vec<RiskView>,
    pub checklist: ChecklistSnapshot,
}

/// Every record of an evaluated session; risks and checklist follow the latest entry.
#[derive(Debug, Serialize)]
pub struct SessionEvaluationView {
    pub records: Vec<EvaluationRecord>,
    pub risks: Vec<RiskView>,
    pub checklist: ChecklistSnapshot,
}

#[derive(Debug, Serialize)]
pub struct DegradationView {
    pub record: EvaluationRecord,
    pub chart: ChartData,
}

#[derive(Debug, Serialize)]
pub struct ClearedView {
    pub removed: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resistance_row_accepts_both_shapes() {
        let row: ResistanceRow =
            serde_json::from_str(r#"{"year": 2023, "month": 4, "resistance": 850}"#).unwrap();
        assert_eq!(row.into_point().unwrap().period.to_string(), "2023-04");

        let row: ResistanceRow =
            serde_json::from_str(r#"{"period": "2023-11", "resistance": 12.5}"#).unwrap();
        assert_eq!(row.into_point().unwrap().resistance, 12.5);

        let row: ResistanceRow = serde_json::from_str(r#"{"year": 2023, "resistance": 1}"#).unwrap();
        assert!(row.into_point().is_err());

        let row: ResistanceRow = serde_json::from_str(r#"{"period": "2023-01"}"#).unwrap();
        assert!(row.into_point().is_err());
    }

    #[test]
    fn test_selection_query_ids() {
        let query = SelectionQuery {
            ids: Some("3, 1,,2".to_string()),
        };
        assert_eq!(query.ids().unwrap(), vec![3, 1, 2]);
        assert!(SelectionQuery { ids: None }.ids().unwrap().is_empty());
        assert!(SelectionQuery { ids: Some("x".to_string()) }.ids().is_err());
    }

    #[test]
    fn test_empty_batch_is_rejected() {
        let request = PerformanceBatchRequest { rows: Vec::new() };
        assert!(request.into_rows().is_err());
    }
}
