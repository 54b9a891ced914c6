// Chart data contracts handed to the front end for drawing
use serde::Serialize;

use super::degradation::ResistancePoint;
use super::stress::Reading;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub label: String,
    pub value: f64,
}

impl ChartPoint {
    pub fn new(label: impl Into<String>, value: f64) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesData {
    pub id: String,
    pub name: String,
    pub color: Option<String>,
    pub points: Vec<ChartPoint>,
}

impl SeriesData {
    pub fn new(id: &str, name: &str, color: Option<&str>, points: Vec<ChartPoint>) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            color: color.map(str::to_string),
            points,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ChartKind {
    Line,
    MultiLine,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartData {
    pub id: String,
    pub title: String,
    pub unit: Option<String>,
    pub kind: ChartKind,
    pub y_min: Option<f64>,
    pub y_max: Option<f64>,
    pub series: Vec<SeriesData>,
}

/// Resistance over time. The y axis leaves 300 MΩ of headroom, rounded to 100.
pub fn degradation_chart(points: &[ResistancePoint]) -> ChartData {
    let chart_points: Vec<ChartPoint> = points
        .iter()
        .map(|p| ChartPoint::new(p.period.to_string(), p.resistance))
        .collect();

    let y_max = points
        .iter()
        .map(|p| p.resistance)
        .reduce(f64::max)
        .map(|max| ((max + 300.0) / 100.0).round() * 100.0);

    let series = if chart_points.is_empty() {
        Vec::new()
    } else {
        vec![SeriesData::new(
            "resistance",
            "Insulation resistance (MΩ)",
            Some("rgb(75, 192, 192)"),
            chart_points,
        )]
    };

    ChartData {
        id: "degradation".to_string(),
        title: "Insulation resistance trend".to_string(),
        unit: Some("MΩ".to_string()),
        kind: ChartKind::Line,
        y_min: Some(0.0),
        y_max,
        series,
    }
}

/// Current and temperature of the selected readings, one point per reading.
pub fn performance_chart(readings: &[Reading]) -> ChartData {
    let label = |i: usize| format!("#{}", i + 1);
    let current = readings
        .iter()
        .enumerate()
        .map(|(i, r)| ChartPoint::new(label(i), r.current))
        .collect();
    let temperature = readings
        .iter()
        .enumerate()
        .map(|(i, r)| ChartPoint::new(label(i), r.temperature))
        .collect();

    let series = if readings.is_empty() {
        Vec::new()
    } else {
        vec![
            SeriesData::new("current", "Current (A)", Some("rgb(54, 162, 235)"), current),
            SeriesData::new("temperature", "Temperature (℃)", Some("rgb(255, 99, 132)"), temperature),
        ]
    };

    ChartData {
        id: "performance".to_string(),
        title: "Current and temperature".to_string(),
        unit: None,
        kind: ChartKind::MultiLine,
        y_min: None,
        y_max: None,
        series,
    }
}
