use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

use crate::models::metrics::{MetricType, UnifiedMetric};

pub const SOURCE_TYPE: &str = "withings";

/// One measurement inside a Withings measure group. The magnitude is
/// `value * 10^unit` in the provider's unit for the type code, which for
/// every code we track is already the canonical one (kg, %, mmHg, bpm).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Measure {
    pub value: i64,
    pub unit: i32,
    #[serde(rename = "type")]
    pub measure_type: i32,
}

/// One body-scale reading: several measures taken at the same instant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeasureGroup {
    pub date: DateTime<Utc>,
    pub measures: Vec<Measure>,
    #[serde(default)]
    pub device_name: Option<String>,
}

lazy_static! {
    /// Withings measure type code -> metric type. Codes missing here
    /// (height, bone mass, hydration, pulse wave velocity, ...) are skipped.
    static ref MEASURE_REGISTRY: HashMap<i32, MetricType> = HashMap::from([
        (1, MetricType::BodyWeight),
        (6, MetricType::BodyFatPercentage),
        (9, MetricType::BloodPressureDiastolic),
        (10, MetricType::BloodPressureSystolic),
        (11, MetricType::HeartRate),
        (76, MetricType::BodyLeanMass),
    ]);
}

impl Measure {
    fn magnitude(&self) -> f64 {
        self.value as f64 * 10f64.powi(self.unit)
    }
}

/// Map one measure group; each recognized measure becomes one metric stamped
/// with the group's timestamp.
pub fn map_measure_group(group: &MeasureGroup) -> Vec<UnifiedMetric> {
    group
        .measures
        .iter()
        .filter_map(|measure| {
            let metric_type = match MEASURE_REGISTRY.get(&measure.measure_type) {
                Some(t) => *t,
                None => {
                    tracing::debug!("Skipping unmapped Withings measure type: {}", measure.measure_type);
                    return None;
                }
            };

            let value = measure.magnitude();
            if !value.is_finite() {
                return None;
            }

            Some(
                UnifiedMetric::new(metric_type, value, SOURCE_TYPE, group.date)
                    .with_attribution(None, group.device_name.clone()),
            )
        })
        .collect()
}

pub fn map_measure_groups(groups: &[MeasureGroup]) -> Vec<UnifiedMetric> {
    groups.iter().flat_map(map_measure_group).collect()
}

/// One day of the Withings activity summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivitySummary {
    pub date: NaiveDate,
    #[serde(default)]
    pub steps: Option<f64>,
    /// Meters.
    #[serde(default)]
    pub distance: Option<f64>,
    #[serde(default)]
    pub calories: Option<f64>,
    #[serde(default)]
    pub soft_activity_s: Option<i64>,
    #[serde(default)]
    pub moderate_activity_s: Option<i64>,
    #[serde(default)]
    pub intense_activity_s: Option<i64>,
}

fn day_start(date: NaiveDate) -> DateTime<Utc> {
    DateTime::from_naive_utc_and_offset(date.and_time(NaiveTime::MIN), Utc)
}

/// A daily summary expands into one metric per populated quantity.
pub fn map_activity_summary(summary: &ActivitySummary) -> Vec<UnifiedMetric> {
    let recorded_at = day_start(summary.date);
    let mut metrics = Vec::new();

    if let Some(steps) = summary.steps.filter(|v| v.is_finite()) {
        metrics.push(UnifiedMetric::new(
            MetricType::ActivitySteps,
            steps,
            SOURCE_TYPE,
            recorded_at,
        ));
    }
    if let Some(meters) = summary.distance.filter(|v| v.is_finite()) {
        metrics.push(UnifiedMetric::new(
            MetricType::ActivityDistance,
            meters / 1000.0,
            SOURCE_TYPE,
            recorded_at,
        ));
    }
    if let Some(kcal) = summary.calories.filter(|v| v.is_finite()) {
        metrics.push(UnifiedMetric::new(
            MetricType::ActivityCalories,
            kcal,
            SOURCE_TYPE,
            recorded_at,
        ));
    }

    let active_seconds = summary.soft_activity_s.unwrap_or(0)
        + summary.moderate_activity_s.unwrap_or(0)
        + summary.intense_activity_s.unwrap_or(0);
    if active_seconds > 0 {
        metrics.push(UnifiedMetric::new(
            MetricType::ActivityExerciseMinutes,
            active_seconds as f64 / 60.0,
            SOURCE_TYPE,
            recorded_at,
        ));
    }

    metrics
}

/// One night of the Withings sleep summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SleepSummary {
    pub date: NaiveDate,
    #[serde(default)]
    pub total_sleep_s: Option<i64>,
    #[serde(default)]
    pub time_in_bed_s: Option<i64>,
    #[serde(default)]
    pub wakeup_duration_s: Option<i64>,
}

/// Sleep summary -> duration/in-bed/awake hours plus derived efficiency when
/// both sleep and in-bed time are present.
pub fn map_sleep_summary(summary: &SleepSummary) -> Vec<UnifiedMetric> {
    let recorded_at = day_start(summary.date);
    let mut metrics = Vec::new();

    let asleep = summary.total_sleep_s.filter(|s| *s > 0);
    let in_bed = summary.time_in_bed_s.filter(|s| *s > 0);

    if let Some(seconds) = asleep {
        metrics.push(UnifiedMetric::new(
            MetricType::SleepDuration,
            seconds as f64 / 3600.0,
            SOURCE_TYPE,
            recorded_at,
        ));
    }
    if let Some(seconds) = in_bed {
        metrics.push(UnifiedMetric::new(
            MetricType::SleepTimeInBed,
            seconds as f64 / 3600.0,
            SOURCE_TYPE,
            recorded_at,
        ));
    }
    if let Some(seconds) = summary.wakeup_duration_s.filter(|s| *s > 0) {
        metrics.push(UnifiedMetric::new(
            MetricType::SleepAwakeTime,
            seconds as f64 / 3600.0,
            SOURCE_TYPE,
            recorded_at,
        ));
    }
    if let (Some(asleep_s), Some(in_bed_s)) = (asleep, in_bed) {
        metrics.push(UnifiedMetric::new(
            MetricType::SleepEfficiency,
            100.0 * asleep_s as f64 / in_bed_s as f64,
            SOURCE_TYPE,
            recorded_at,
        ));
    }

    metrics
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn weight_measure_scales_by_power_of_ten() {
        let group = MeasureGroup {
            date: Utc.with_ymd_and_hms(2024, 1, 1, 7, 30, 0).unwrap(),
            measures: vec![Measure { value: 72500, unit: -3, measure_type: 1 }],
            device_name: Some("Body+".to_string()),
        };

        let metrics = map_measure_group(&group);
        assert_eq!(metrics.len(), 1);
        assert_eq!(metrics[0].metric_type, MetricType::BodyWeight);
        assert!((metrics[0].value - 72.5).abs() < 1e-9);
        assert_eq!(metrics[0].unit, "kg");
        assert_eq!(metrics[0].device_name.as_deref(), Some("Body+"));
    }

    #[test]
    fn mixed_group_maps_known_and_skips_unknown_codes() {
        let group = MeasureGroup {
            date: Utc.with_ymd_and_hms(2024, 1, 1, 7, 30, 0).unwrap(),
            measures: vec![
                Measure { value: 72500, unit: -3, measure_type: 1 },
                Measure { value: 225, unit: -1, measure_type: 6 },
                Measure { value: 178, unit: -2, measure_type: 4 }, // height, untracked
                Measure { value: 62, unit: 0, measure_type: 11 },
            ],
            device_name: None,
        };

        let metrics = map_measure_group(&group);
        assert_eq!(metrics.len(), 3);
        assert!(metrics.iter().any(|m| m.metric_type == MetricType::BodyFatPercentage
            && (m.value - 22.5).abs() < 1e-9));
        assert!(metrics
            .iter()
            .any(|m| m.metric_type == MetricType::HeartRate && m.value == 62.0));
    }

    #[test]
    fn activity_summary_sums_intensity_buckets_into_exercise_minutes() {
        let summary = ActivitySummary {
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            steps: Some(10412.0),
            distance: Some(7300.0),
            calories: Some(540.0),
            soft_activity_s: Some(1200),
            moderate_activity_s: Some(1800),
            intense_activity_s: Some(600),
        };

        let metrics = map_activity_summary(&summary);
        assert_eq!(metrics.len(), 4);
        let minutes = metrics
            .iter()
            .find(|m| m.metric_type == MetricType::ActivityExerciseMinutes)
            .unwrap();
        assert!((minutes.value - 60.0).abs() < 1e-9);
        let distance = metrics
            .iter()
            .find(|m| m.metric_type == MetricType::ActivityDistance)
            .unwrap();
        assert!((distance.value - 7.3).abs() < 1e-9);
    }

    #[test]
    fn sleep_summary_derives_efficiency() {
        let summary = SleepSummary {
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            total_sleep_s: Some(6 * 3600),
            time_in_bed_s: Some(8 * 3600),
            wakeup_duration_s: Some(1800),
        };

        let metrics = map_sleep_summary(&summary);
        let efficiency = metrics
            .iter()
            .find(|m| m.metric_type == MetricType::SleepEfficiency)
            .unwrap();
        assert!((efficiency.value - 75.0).abs() < 1e-9);
    }

    #[test]
    fn sleep_summary_without_in_bed_time_has_no_efficiency() {
        let summary = SleepSummary {
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            total_sleep_s: Some(7 * 3600),
            time_in_bed_s: None,
            wakeup_duration_s: None,
        };

        let metrics = map_sleep_summary(&summary);
        assert_eq!(metrics.len(), 1);
        assert_eq!(metrics[0].metric_type, MetricType::SleepDuration);
    }
}
