// Risk bands shared by the three stress indicators
use serde::{Deserialize, Serialize};
use std::fmt;

/// Upper bounds of L1, L2 and L3. Anything at or above the last bound is L4.
const ELECTRICAL_BOUNDS: [f64; 3] = [1.0, 1.2, 1.5];
const THERMAL_BOUNDS: [f64; 3] = [0.5, 0.8, 1.0];
const SENSITIVITY_BOUNDS: [f64; 3] = [0.5, 1.0, 1.5];

/// Risk level of a single indicator.
///
/// `Baseline` only occurs for sensitivity when there is no prior point to
/// compare against. It sorts below `L1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    #[serde(rename = "-")]
    Baseline,
    L1,
    L2,
    L3,
    L4,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskMetric {
    Electrical,
    Thermal,
    Sensitivity,
}

impl RiskLevel {
    pub fn code(self) -> &'static str {
        match self {
            RiskLevel::Baseline => "-",
            RiskLevel::L1 => "L1",
            RiskLevel::L2 => "L2",
            RiskLevel::L3 => "L3",
            RiskLevel::L4 => "L4",
        }
    }

    /// Display name as shown next to the badge. Sensitivity uses its own wording.
    pub fn display_name(self, metric: RiskMetric) -> &'static str {
        match (metric, self) {
            (_, RiskLevel::Baseline) => "Baseline",
            (RiskMetric::Sensitivity, RiskLevel::L1) => "Moderate",
            (RiskMetric::Sensitivity, RiskLevel::L2) => "High",
            (RiskMetric::Sensitivity, RiskLevel::L3) => "Danger",
            (RiskMetric::Sensitivity, RiskLevel::L4) => "Severe",
            (_, RiskLevel::L1) => "Normal",
            (_, RiskLevel::L2) => "Caution",
            (_, RiskLevel::L3) => "Alert",
            (_, RiskLevel::L4) => "Danger",
        }
    }

    pub fn severity_class(self) -> &'static str {
        match self {
            RiskLevel::Baseline => "risk-baseline",
            RiskLevel::L1 => "risk-l1",
            RiskLevel::L2 => "risk-l2",
            RiskLevel::L3 => "risk-l3",
            RiskLevel::L4 => "risk-l4",
        }
    }

    /// Levels that open the matching checklist.
    pub fn is_elevated(self) -> bool {
        matches!(self, RiskLevel::L2 | RiskLevel::L3 | RiskLevel::L4)
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

fn band(value: f64, bounds: [f64; 3]) -> RiskLevel {
    if value < bounds[0] {
        RiskLevel::L1
    } else if value < bounds[1] {
        RiskLevel::L2
    } else if value < bounds[2] {
        RiskLevel::L3
    } else {
        RiskLevel::L4
    }
}

pub fn classify_electrical(stress: f64) -> RiskLevel {
    band(stress, ELECTRICAL_BOUNDS)
}

pub fn classify_thermal(stress: f64) -> RiskLevel {
    band(stress, THERMAL_BOUNDS)
}

pub fn classify_sensitivity(sensitivity: Option<f64>) -> RiskLevel {
    match sensitivity {
        Some(value) => band(value, SENSITIVITY_BOUNDS),
        None => RiskLevel::Baseline,
    }
}
