use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::metrics::{MetricType, UnifiedMetric};

pub const SOURCE_TYPE: &str = "csv";

/// One row of an uploaded metrics CSV, already split into fields by the
/// upload layer. Everything arrives as strings; this mapper owns parsing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsvMetricRow {
    pub metric_type: String,
    pub value: String,
    #[serde(default)]
    pub unit: Option<String>,
    pub recorded_at: String,
}

/// (supplied unit, canonical unit) -> multiplication factor. Rows in any
/// other non-canonical unit are dropped.
fn unit_conversion(supplied: &str, canonical: &str) -> Option<f64> {
    match (supplied, canonical) {
        ("g", "kg") => Some(0.001),
        ("lb", "kg") => Some(0.453592),
        ("m", "km") => Some(0.001),
        ("mi", "km") => Some(1.609344),
        ("count", "steps") => Some(1.0),
        ("min" | "minutes", "hours") => Some(1.0 / 60.0),
        ("s" | "seconds", "hours") => Some(1.0 / 3600.0),
        ("hours", "minutes") => Some(60.0),
        ("l", "ml") => Some(1000.0),
        _ => None,
    }
}

/// Map one CSV row. Rows with an unknown metric type, an unparseable value
/// or timestamp, or an unconvertible unit are skipped, never errors.
pub fn map_row(row: &CsvMetricRow) -> Option<UnifiedMetric> {
    let metric_type = match MetricType::from_str(row.metric_type.trim()) {
        Ok(t) => t,
        Err(_) => {
            tracing::debug!("Skipping CSV row with unknown metric type: {}", row.metric_type);
            return None;
        }
    };

    let raw_value: f64 = match row.value.trim().parse() {
        Ok(v) => v,
        Err(_) => {
            tracing::debug!("Skipping CSV row with unparseable value: {}", row.value);
            return None;
        }
    };
    if !raw_value.is_finite() {
        return None;
    }

    let recorded_at = match DateTime::parse_from_rfc3339(row.recorded_at.trim()) {
        Ok(ts) => ts.with_timezone(&Utc),
        Err(_) => {
            tracing::debug!("Skipping CSV row with unparseable timestamp: {}", row.recorded_at);
            return None;
        }
    };

    let canonical = metric_type.canonical_unit();
    let value = match row.unit.as_deref().map(str::trim) {
        None | Some("") => raw_value,
        Some(unit) if unit == canonical => raw_value,
        Some(unit) => {
            match unit_conversion(unit.to_lowercase().as_str(), canonical) {
                Some(factor) => raw_value * factor,
                None => {
                    tracing::debug!("Skipping CSV row with unconvertible unit `{}` for {}", unit, metric_type);
                    return None;
                }
            }
        }
    };

    Some(UnifiedMetric::new(metric_type, value, SOURCE_TYPE, recorded_at))
}

pub fn map_rows(rows: &[CsvMetricRow]) -> Vec<UnifiedMetric> {
    rows.iter().filter_map(map_row).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(metric_type: &str, value: &str, unit: Option<&str>) -> CsvMetricRow {
        CsvMetricRow {
            metric_type: metric_type.to_string(),
            value: value.to_string(),
            unit: unit.map(String::from),
            recorded_at: "2024-01-01T08:00:00Z".to_string(),
        }
    }

    #[test]
    fn canonical_unit_row_passes_through() {
        let metric = map_row(&row("body_weight", "71.2", Some("kg"))).unwrap();
        assert_eq!(metric.metric_type, MetricType::BodyWeight);
        assert_eq!(metric.value, 71.2);
        assert_eq!(metric.unit, "kg");
        assert_eq!(metric.source_type, "csv");
    }

    #[test]
    fn missing_unit_is_assumed_canonical() {
        let metric = map_row(&row("heart_rate", "58", None)).unwrap();
        assert_eq!(metric.value, 58.0);
        assert_eq!(metric.unit, "bpm");
    }

    #[test]
    fn pounds_convert_to_kilograms() {
        let metric = map_row(&row("body_weight", "160", Some("lb"))).unwrap();
        assert!((metric.value - 72.57472).abs() < 1e-6);
        assert_eq!(metric.unit, "kg");
    }

    #[test]
    fn minutes_convert_to_hours_for_sleep() {
        let metric = map_row(&row("sleep_duration", "450", Some("minutes"))).unwrap();
        assert!((metric.value - 7.5).abs() < 1e-9);
        assert_eq!(metric.unit, "hours");
    }

    #[test]
    fn unknown_metric_type_is_skipped() {
        assert!(map_row(&row("blood_glucose", "5.4", None)).is_none());
    }

    #[test]
    fn unparseable_value_is_skipped() {
        assert!(map_row(&row("activity_steps", "a lot", None)).is_none());
    }

    #[test]
    fn unconvertible_unit_is_skipped() {
        assert!(map_row(&row("body_weight", "11.3", Some("stone"))).is_none());
    }

    #[test]
    fn bad_timestamp_is_skipped() {
        let mut bad = row("activity_steps", "9000", None);
        bad.recorded_at = "yesterday".to_string();
        assert!(map_row(&bad).is_none());
    }

    #[test]
    fn batch_keeps_good_rows_and_drops_bad_ones() {
        let rows = vec![
            row("activity_steps", "8000", Some("steps")),
            row("mystery_metric", "1", None),
            row("activity_distance", "5000", Some("m")),
        ];

        let metrics = map_rows(&rows);
        assert_eq!(metrics.len(), 2);
        assert!((metrics[1].value - 5.0).abs() < 1e-9);
    }
}
