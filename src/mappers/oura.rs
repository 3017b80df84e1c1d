use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::metrics::{MetricType, UnifiedMetric};

pub const SOURCE_TYPE: &str = "oura";

fn day_start(date: NaiveDate) -> DateTime<Utc> {
    DateTime::from_naive_utc_and_offset(date.and_time(NaiveTime::MIN), Utc)
}

/// One document from Oura's daily activity endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyActivity {
    pub day: NaiveDate,
    #[serde(default)]
    pub steps: Option<f64>,
    #[serde(default)]
    pub active_calories: Option<f64>,
    /// Meters.
    #[serde(default)]
    pub equivalent_walking_distance: Option<f64>,
}

pub fn map_daily_activity(activity: &DailyActivity) -> Vec<UnifiedMetric> {
    let recorded_at = day_start(activity.day);
    let mut metrics = Vec::new();

    if let Some(steps) = activity.steps.filter(|v| v.is_finite()) {
        metrics.push(UnifiedMetric::new(
            MetricType::ActivitySteps,
            steps,
            SOURCE_TYPE,
            recorded_at,
        ));
    }
    if let Some(kcal) = activity.active_calories.filter(|v| v.is_finite()) {
        metrics.push(UnifiedMetric::new(
            MetricType::ActivityCalories,
            kcal,
            SOURCE_TYPE,
            recorded_at,
        ));
    }
    if let Some(meters) = activity.equivalent_walking_distance.filter(|v| v.is_finite()) {
        metrics.push(UnifiedMetric::new(
            MetricType::ActivityDistance,
            meters / 1000.0,
            SOURCE_TYPE,
            recorded_at,
        ));
    }

    metrics
}

/// One sleep period document. Durations are seconds; HRV is milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SleepPeriod {
    pub day: NaiveDate,
    #[serde(default)]
    pub bedtime_start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub total_sleep_duration: Option<i64>,
    #[serde(default)]
    pub time_in_bed: Option<i64>,
    #[serde(default)]
    pub awake_time: Option<i64>,
    #[serde(default)]
    pub average_hrv: Option<f64>,
    #[serde(default)]
    pub lowest_heart_rate: Option<f64>,
}

/// A sleep period expands into the sleep metrics plus the heart metrics Oura
/// derives overnight (resting HR from the night's lowest, HRV from the
/// average).
pub fn map_sleep_period(period: &SleepPeriod) -> Vec<UnifiedMetric> {
    let recorded_at = period.bedtime_start.unwrap_or_else(|| day_start(period.day));
    let mut metrics = Vec::new();

    let asleep = period.total_sleep_duration.filter(|s| *s > 0);
    let in_bed = period.time_in_bed.filter(|s| *s > 0);

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
    if let Some(seconds) = period.awake_time.filter(|s| *s > 0) {
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
    if let Some(hrv) = period.average_hrv.filter(|v| v.is_finite() && *v > 0.0) {
        metrics.push(UnifiedMetric::new(
            MetricType::HeartRateVariability,
            hrv,
            SOURCE_TYPE,
            recorded_at,
        ));
    }
    if let Some(bpm) = period.lowest_heart_rate.filter(|v| v.is_finite() && *v > 0.0) {
        metrics.push(UnifiedMetric::new(
            MetricType::HeartRateResting,
            bpm,
            SOURCE_TYPE,
            recorded_at,
        ));
    }

    metrics
}
