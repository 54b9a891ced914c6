// Insulation resistance degradation pattern classifier
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::error::EvaluationError;

/// Insulation failure threshold in MΩ.
const FAILURE_THRESHOLD: f64 = 1.0;
/// Upper bound (exclusive) of the drop that still counts as a shallow dip, in percent.
const LOCAL_DIP_MAX_DROP_PCT: f64 = 10.0;

/// Calendar month of a measurement, written `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Period {
    year: i32,
    month: u32,
}

impl Period {
    pub fn new(year: i32, month: u32) -> Result<Self, EvaluationError> {
        if !(1..=9999).contains(&year) {
            return Err(EvaluationError::invalid(format!("year {year} is out of range")));
        }
        NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| EvaluationError::invalid(format!("month {month} is not valid")))?;
        Ok(Self { year, month })
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for Period {
    type Err = EvaluationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year, month) = s
            .trim()
            .split_once('-')
            .ok_or_else(|| EvaluationError::invalid(format!("period '{s}' is not YYYY-MM")))?;
        let year = year
            .trim()
            .parse::<i32>()
            .map_err(|_| EvaluationError::invalid(format!("period '{s}' has no numeric year")))?;
        let month = month
            .trim()
            .parse::<u32>()
            .map_err(|_| EvaluationError::invalid(format!("period '{s}' has no numeric month")))?;
        Period::new(year, month)
    }
}

impl TryFrom<String> for Period {
    type Error = EvaluationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Period> for String {
    fn from(period: Period) -> Self {
        period.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResistancePoint {
    pub period: Period,
    /// Insulation resistance in MΩ.
    pub resistance: f64,
}

impl ResistancePoint {
    pub fn new(period: Period, resistance: f64) -> Result<Self, EvaluationError> {
        if !resistance.is_finite() || resistance < 0.0 {
            return Err(EvaluationError::invalid(format!(
                "resistance for {period} must be a non-negative number"
            )));
        }
        Ok(Self { period, resistance })
    }
}

/// Chronologically sorted series with one value per period. Never empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ResistanceSeries(Vec<ResistancePoint>);

impl ResistanceSeries {
    /// Sorts by period; for duplicate periods the later point wins.
    pub fn from_points<I>(points: I) -> Result<Self, EvaluationError>
    where
        I: IntoIterator<Item = ResistancePoint>,
    {
        let by_period: BTreeMap<Period, ResistancePoint> =
            points.into_iter().map(|p| (p.period, p)).collect();
        if by_period.is_empty() {
            return Err(EvaluationError::EmptySeries);
        }
        Ok(Self(by_period.into_values().collect()))
    }

    pub fn points(&self) -> &[ResistancePoint] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.0.iter().map(|p| p.resistance)
    }

    pub fn into_points(self) -> Vec<ResistancePoint> {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DegradationPattern {
    Critical,
    Accelerated,
    Gradual,
    Localised,
    Stable,
}

impl DegradationPattern {
    pub fn label(self) -> &'static str {
        match self {
            DegradationPattern::Critical => "Critical",
            DegradationPattern::Accelerated => "Accelerated",
            DegradationPattern::Gradual => "Gradual",
            DegradationPattern::Localised => "Localised",
            DegradationPattern::Stable => "Stable",
        }
    }

    pub fn stage(self) -> &'static str {
        match self {
            DegradationPattern::Critical => "Failure",
            DegradationPattern::Accelerated => "Propagation",
            DegradationPattern::Gradual => "Initiation",
            DegradationPattern::Localised => "Anomaly",
            DegradationPattern::Stable => "Healthy",
        }
    }

    pub fn management(self) -> &'static str {
        match self {
            DegradationPattern::Critical => "Stop operation, precision inspection, rewire",
            DegradationPattern::Accelerated => "Shorten inspection interval (quarterly inspection)",
            DegradationPattern::Gradual => "Long-term trend monitoring (biannual inspection)",
            DegradationPattern::Localised => {
                "Trend monitoring; quarterly inspection once below 300 MΩ"
            }
            DegradationPattern::Stable => "Routine insulation confirmation (annual)",
        }
    }
}

/// Aggregate statistics of a resistance series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesStatistics {
    pub first: f64,
    pub last: f64,
    pub min: f64,
    pub max: f64,
    pub decrease_rate_pct: f64,
    pub volatility_pct: f64,
    pub below_threshold: bool,
    pub local_dip_count: usize,
}

impl SeriesStatistics {
    pub fn compute(series: &ResistanceSeries) -> Self {
        let values: Vec<f64> = series.values().collect();
        let first = values[0];
        let last = values[values.len() - 1];
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        // A zero starting value gives no reference to decrease from.
        let decrease_rate_pct = if first > 0.0 {
            (first - last) / first * 100.0
        } else {
            0.0
        };

        Self {
            first,
            last,
            min,
            max,
            decrease_rate_pct,
            volatility_pct: coefficient_of_variation_pct(&values),
            below_threshold: last < FAILURE_THRESHOLD,
            local_dip_count: count_local_dips(&values),
        }
    }
}

/// Population standard deviation over the mean, in percent.
fn coefficient_of_variation_pct(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    if mean <= 0.0 {
        return 0.0;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt() / mean * 100.0
}

/// Interior points that dropped by less than 10 % and then recovered.
fn count_local_dips(values: &[f64]) -> usize {
    values
        .windows(3)
        .filter(|w| {
            let (prev, curr, next) = (w[0], w[1], w[2]);
            if prev <= 0.0 || curr <= 0.0 {
                return false;
            }
            let drop = (prev - curr) / prev * 100.0;
            let recovery = (next - curr) / curr * 100.0;
            drop > 0.0 && drop < LOCAL_DIP_MAX_DROP_PCT && recovery > 0.0
        })
        .count()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DegradationResult {
    pub pattern: DegradationPattern,
    pub stage: String,
    pub management: String,
    pub characteristics: String,
    pub decrease_rate_pct: f64,
    pub volatility_pct: f64,
    pub below_threshold: bool,
    pub first_value: f64,
    pub last_value: f64,
    pub min_value: f64,
    pub max_value: f64,
    pub local_dip_count: usize,
}

/// Decision list; the first matching rule wins and the order is significant.
fn select_pattern(stats: &SeriesStatistics) -> (DegradationPattern, String) {
    let decrease = stats.decrease_rate_pct;

    if stats.below_threshold || decrease >= 90.0 {
        return (
            DegradationPattern::Critical,
            "Steep decline (90 % or more over the period) or resistance at or below the 1 MΩ threshold"
                .to_string(),
        );
    }
    if stats.last < 100.0 && decrease >= 70.0 {
        return (
            DegradationPattern::Accelerated,
            "Below 100 MΩ after a steep decline (70 % or more over the period)".to_string(),
        );
    }
    if (10.0..=20.0).contains(&decrease) && stats.local_dip_count == 0 {
        return (
            DegradationPattern::Gradual,
            "Gentle 10-20 % decline with no anomalies".to_string(),
        );
    }
    if stats.last >= 300.0 && stats.local_dip_count >= 2 {
        return (
            DegradationPattern::Localised,
            format!(
                "Overall level is sound but temporary dips recur ({} times, each under 10 %)",
                stats.local_dip_count
            ),
        );
    }
    if stats.last >= 1000.0 && stats.volatility_pct <= 1.0 {
        return (
            DegradationPattern::Stable,
            "At or above 1000 MΩ with variation within ±1 %".to_string(),
        );
    }
    (
        DegradationPattern::Gradual,
        "Gentle decline or steady state".to_string(),
    )
}

pub fn classify(series: &ResistanceSeries) -> DegradationResult {
    let stats = SeriesStatistics::compute(series);
    let (pattern, characteristics) = select_pattern(&stats);

    DegradationResult {
        pattern,
        stage: pattern.stage().to_string(),
        management: pattern.management().to_string(),
        characteristics,
        decrease_rate_pct: stats.decrease_rate_pct,
        volatility_pct: stats.volatility_pct,
        below_threshold: stats.below_threshold,
        first_value: stats.first,
        last_value: stats.last,
        min_value: stats.min,
        max_value: stats.max,
        local_dip_count: stats.local_dip_count,
    }
}
