// Electro-thermal stress model
use serde::{Deserialize, Serialize};

use super::error::EvaluationError;
use super::risk::{classify_electrical, classify_sensitivity, classify_thermal, RiskLevel};

/// Quadratic regression of rated temperature against current,
/// `T = a + b·I + c·I²`, together with the critical temperature it is solved for.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegressionModel {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub critical_temperature: f64,
    pub fallback_critical_current: f64,
}

impl Default for RegressionModel {
    fn default() -> Self {
        Self {
            a: 39.685,
            b: 0.0298,
            c: 0.0139,
            critical_temperature: 90.0,
            fallback_critical_current: 100.0,
        }
    }
}

/// Critical current and whether the regression had a physical solution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CriticalCurrent {
    pub value: f64,
    pub used_fallback: bool,
}

impl RegressionModel {
    /// Positive root of `c·I² + b·I + (a - T_critic) = 0`.
    pub fn critical_current(&self) -> CriticalCurrent {
        let constant = self.a - self.critical_temperature;
        let discriminant = self.b * self.b - 4.0 * self.c * constant;

        if discriminant < 0.0 {
            return CriticalCurrent {
                value: self.fallback_critical_current,
                used_fallback: true,
            };
        }

        let root = (-self.b + discriminant.sqrt()) / (2.0 * self.c);
        if root.is_finite() && root > 0.0 {
            CriticalCurrent {
                value: root,
                used_fallback: false,
            }
        } else {
            CriticalCurrent {
                value: self.fallback_critical_current,
                used_fallback: true,
            }
        }
    }
}

/// One measurement snapshot (maximum current and temperature of the interval).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub current: f64,
    pub temperature: f64,
}

impl Reading {
    pub fn new(current: Option<f64>, temperature: Option<f64>) -> Result<Self, EvaluationError> {
        let (Some(current), Some(temperature)) = (current, temperature) else {
            return Err(EvaluationError::invalid(
                "both current (I_max) and temperature (T_max) are required",
            ));
        };
        if !current.is_finite() || !temperature.is_finite() {
            return Err(EvaluationError::invalid("current and temperature must be numbers"));
        }
        if current <= 0.0 || temperature <= 0.0 {
            return Err(EvaluationError::invalid(
                "current and temperature must be greater than zero",
            ));
        }
        Ok(Self { current, temperature })
    }
}

/// A timed measurement, `time` in minutes from the start of the session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    pub time: u32,
    pub current: f64,
    pub temperature: f64,
}

impl TimeSeriesPoint {
    pub fn new(time: u32, current: f64, temperature: f64) -> Self {
        Self {
            time,
            current,
            temperature,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StressResult {
    pub electrical_stress: f64,
    pub thermal_stress: f64,
    pub sensitivity: Option<f64>,
    pub critical_current: f64,
    pub risk_electrical: RiskLevel,
    pub risk_thermal: RiskLevel,
    pub risk_sensitivity: RiskLevel,
    /// The regression had no positive root and the configured default was used.
    pub critical_current_fallback: bool,
    /// Both points carried the same current, so the stress ratio was used instead.
    pub sensitivity_fallback: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StressEvaluator {
    model: RegressionModel,
}

impl StressEvaluator {
    pub fn new(model: RegressionModel) -> Self {
        Self { model }
    }

    /// Evaluate a reading. Only the last two entries of `series` are used for
    /// sensitivity; with fewer than two there is no baseline.
    pub fn evaluate(&self, reading: Reading, series: &[TimeSeriesPoint]) -> StressResult {
        let critical = self.model.critical_current();

        let electrical_stress = reading.current / critical.value;
        let thermal_stress = reading.temperature / self.model.critical_temperature;

        let (sensitivity, sensitivity_fallback) = match series {
            [.., prior, latest] => {
                let delta_current = latest.current - prior.current;
                if delta_current != 0.0 {
                    (Some((latest.temperature - prior.temperature) / delta_current), false)
                } else {
                    (Some(thermal_stress / electrical_stress), true)
                }
            }
            _ => (None, false),
        };

        StressResult {
            electrical_stress,
            thermal_stress,
            sensitivity,
            critical_current: critical.value,
            risk_electrical: classify_electrical(electrical_stress),
            risk_thermal: classify_thermal(thermal_stress),
            risk_sensitivity: classify_sensitivity(sensitivity),
            critical_current_fallback: critical.used_fallback,
            sensitivity_fallback,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(current: f64, temperature: f64) -> Reading {
        Reading::new(Some(current), Some(temperature)).unwrap()
    }

    #[test]
    fn test_critical_current_from_default_regression() {
        let critical = RegressionModel::default().critical_current();
        assert!(!critical.used_fallback);
        assert!((critical.value - 59.10).abs() < 0.01);
    }

    #[test]
    fn test_infeasible_regression_uses_fallback() {
        let model = RegressionModel {
            critical_temperature: 30.0,
            ..RegressionModel::default()
        };
        let critical = model.critical_current();
        assert!(critical.used_fallback);
        assert_eq!(critical.value, 100.0);

        let result = StressEvaluator::new(model).evaluate(reading(50.0, 20.0), &[]);
        assert!(result.critical_current_fallback);
        assert!((result.electrical_stress - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_reference_reading() {
        let evaluator = StressEvaluator::default();
        let result = evaluator.evaluate(reading(110.0, 95.0), &[]);

        assert!((result.thermal_stress - 95.0 / 90.0).abs() < 1e-12);
        assert_eq!(result.risk_thermal, RiskLevel::L4);
        assert!((result.electrical_stress - 110.0 / result.critical_current).abs() < 1e-12);
        assert_eq!(result.risk_electrical, RiskLevel::L4);
        assert_eq!(result.sensitivity, None);
        assert_eq!(result.risk_sensitivity, RiskLevel::Baseline);
        assert!(!result.critical_current_fallback);
    }

    #[test]
    fn test_stress_is_monotonic_in_its_numerator() {
        let evaluator = StressEvaluator::default();
        let low = evaluator.evaluate(reading(40.0, 60.0), &[]);
        let high_current = evaluator.evaluate(reading(45.0, 60.0), &[]);
        let high_temp = evaluator.evaluate(reading(40.0, 70.0), &[]);

        assert!(high_current.electrical_stress > low.electrical_stress);
        assert_eq!(high_current.thermal_stress, low.thermal_stress);
        assert!(high_temp.thermal_stress > low.thermal_stress);
        assert_eq!(high_temp.electrical_stress, low.electrical_stress);
    }

    #[test]
    fn test_sensitivity_uses_last_two_points() {
        let evaluator = StressEvaluator::default();
        let series = [
            TimeSeriesPoint::new(0, 10.0, 20.0),
            TimeSeriesPoint::new(5, 30.0, 40.0),
            TimeSeriesPoint::new(10, 40.0, 48.0),
        ];
        let result = evaluator.evaluate(reading(40.0, 48.0), &series);
        let sensitivity = result.sensitivity.unwrap();
        assert!((sensitivity - 0.8).abs() < 1e-12);
        assert_eq!(result.risk_sensitivity, RiskLevel::L2);
        assert!(!result.sensitivity_fallback);
    }

    #[test]
    fn test_equal_currents_fall_back_to_stress_ratio() {
        let evaluator = StressEvaluator::default();
        let prior = TimeSeriesPoint::new(0, 50.0, 60.0);
        let latest = TimeSeriesPoint::new(5, 50.0, 70.0);
        let result = evaluator.evaluate(reading(50.0, 70.0), &[prior, latest]);

        let expected = result.thermal_stress / result.electrical_stress;
        assert!((result.sensitivity.unwrap() - expected).abs() < 1e-12);
        assert!(result.sensitivity_fallback);
    }

    #[test]
    fn test_single_point_has_no_baseline() {
        let evaluator = StressEvaluator::default();
        let result = evaluator.evaluate(reading(30.0, 40.0), &[TimeSeriesPoint::new(0, 30.0, 40.0)]);
        assert_eq!(result.sensitivity, None);
        assert_eq!(result.risk_sensitivity, RiskLevel::Baseline);
    }

    #[test]
    fn test_reading_validation() {
        assert!(matches!(
            Reading::new(None, Some(40.0)),
            Err(EvaluationError::InvalidInput(_))
        ));
        assert!(Reading::new(Some(f64::NAN), Some(40.0)).is_err());
        assert!(Reading::new(Some(0.0), Some(40.0)).is_err());
        assert!(Reading::new(Some(12.5), Some(40.0)).is_ok());
    }
}
