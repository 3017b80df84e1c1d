use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

use crate::models::metrics::{MetricType, UnifiedMetric};

pub const SOURCE_TYPE: &str = "healthkit";

/// One HealthKit quantity sample as shipped by the iOS client. The client
/// reads each quantity in the unit agreed per identifier (count, meters,
/// kcal, minutes, count/min, ms, fractions for percentages, kg, mmHg,
/// liters); the registry converts that into the canonical unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuantitySample {
    pub sample_type: String,
    pub value: f64,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[serde(default)]
    pub source_app: Option<String>,
    #[serde(default)]
    pub device_name: Option<String>,
}

lazy_static! {
    /// HK identifier -> (metric type, factor from the agreed source unit to
    /// the canonical unit). Identifiers missing here are not an error; they
    /// are data we do not track.
    static ref QUANTITY_REGISTRY: HashMap<&'static str, (MetricType, f64)> = HashMap::from([
        ("HKQuantityTypeIdentifierStepCount", (MetricType::ActivitySteps, 1.0)),
        ("HKQuantityTypeIdentifierDistanceWalkingRunning", (MetricType::ActivityDistance, 0.001)), // m -> km
        ("HKQuantityTypeIdentifierActiveEnergyBurned", (MetricType::ActivityCalories, 1.0)),
        ("HKQuantityTypeIdentifierAppleExerciseTime", (MetricType::ActivityExerciseMinutes, 1.0)),
        ("HKQuantityTypeIdentifierFlightsClimbed", (MetricType::ActivityFlightsClimbed, 1.0)),
        ("HKQuantityTypeIdentifierHeartRate", (MetricType::HeartRate, 1.0)),
        ("HKQuantityTypeIdentifierRestingHeartRate", (MetricType::HeartRateResting, 1.0)),
        ("HKQuantityTypeIdentifierHeartRateVariabilitySDNN", (MetricType::HeartRateVariability, 1.0)),
        ("HKQuantityTypeIdentifierOxygenSaturation", (MetricType::BloodOxygen, 100.0)), // fraction -> %
        ("HKQuantityTypeIdentifierBloodPressureSystolic", (MetricType::BloodPressureSystolic, 1.0)),
        ("HKQuantityTypeIdentifierBloodPressureDiastolic", (MetricType::BloodPressureDiastolic, 1.0)),
        ("HKQuantityTypeIdentifierBodyMass", (MetricType::BodyWeight, 1.0)),
        ("HKQuantityTypeIdentifierBodyFatPercentage", (MetricType::BodyFatPercentage, 100.0)), // fraction -> %
        ("HKQuantityTypeIdentifierLeanBodyMass", (MetricType::BodyLeanMass, 1.0)),
        ("HKQuantityTypeIdentifierBodyMassIndex", (MetricType::BodyBmi, 1.0)),
        ("HKQuantityTypeIdentifierDietaryEnergyConsumed", (MetricType::NutritionCalories, 1.0)),
        ("HKQuantityTypeIdentifierDietaryProtein", (MetricType::NutritionProtein, 1.0)),
        ("HKQuantityTypeIdentifierDietaryCarbohydrates", (MetricType::NutritionCarbs, 1.0)),
        ("HKQuantityTypeIdentifierDietaryFatTotal", (MetricType::NutritionFat, 1.0)),
        ("HKQuantityTypeIdentifierDietaryWater", (MetricType::NutritionWater, 1000.0)), // L -> ml
    ]);
}

/// Map one quantity sample. Unknown identifiers and non-finite values are
/// dropped silently.
pub fn map_quantity_sample(sample: &QuantitySample) -> Vec<UnifiedMetric> {
    if !sample.value.is_finite() {
        tracing::debug!("Dropping HealthKit sample with non-finite value: {}", sample.sample_type);
        return Vec::new();
    }

    match QUANTITY_REGISTRY.get(sample.sample_type.as_str()) {
        Some(&(metric_type, factor)) => {
            let metric =
                UnifiedMetric::new(metric_type, sample.value * factor, SOURCE_TYPE, sample.start_date)
                    .with_attribution(sample.source_app.clone(), sample.device_name.clone());
            vec![metric]
        }
        None => {
            tracing::debug!("Skipping unmapped HealthKit sample type: {}", sample.sample_type);
            Vec::new()
        }
    }
}

pub fn map_quantity_samples(samples: &[QuantitySample]) -> Vec<UnifiedMetric> {
    samples.iter().flat_map(|s| map_quantity_sample(s)).collect()
}

/// Sub-states of an HKCategoryValueSleepAnalysis sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SleepState {
    InBed,
    Asleep,
    Awake,
}

/// One sleep analysis interval. Dates keep the device's UTC offset so a
/// segment is attributed to the calendar day the user actually slept through.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SleepSegment {
    pub state: SleepState,
    pub start_date: DateTime<FixedOffset>,
    pub end_date: DateTime<FixedOffset>,
    #[serde(default)]
    pub source_app: Option<String>,
    #[serde(default)]
    pub device_name: Option<String>,
}

#[derive(Debug, Default)]
struct SleepDayTotals {
    in_bed_s: i64,
    asleep_s: i64,
    awake_s: i64,
    first_start: Option<DateTime<Utc>>,
}

/// Group raw sleep segments by the calendar day of their local start date,
/// sum the duration per sub-state, and emit one metric per sub-state per day
/// rather than one per raw segment. When a day has both in-bed and asleep
/// time, a derived efficiency metric (asleep / in-bed x 100) is emitted too.
pub fn map_sleep_samples(segments: &[SleepSegment]) -> Vec<UnifiedMetric> {
    let mut days: BTreeMap<NaiveDate, SleepDayTotals> = BTreeMap::new();

    for segment in segments {
        let seconds = (segment.end_date - segment.start_date).num_seconds();
        if seconds <= 0 {
            tracing::debug!("Dropping sleep segment with non-positive duration");
            continue;
        }

        let day = segment.start_date.date_naive();
        let totals = days.entry(day).or_default();
        match segment.state {
            SleepState::InBed => totals.in_bed_s += seconds,
            SleepState::Asleep => totals.asleep_s += seconds,
            SleepState::Awake => totals.awake_s += seconds,
        }

        let start_utc = segment.start_date.with_timezone(&Utc);
        totals.first_start = Some(match totals.first_start {
            Some(existing) if existing <= start_utc => existing,
            _ => start_utc,
        });
    }

    let mut metrics = Vec::new();
    for totals in days.values() {
        let recorded_at = match totals.first_start {
            Some(ts) => ts,
            None => continue,
        };

        if totals.asleep_s > 0 {
            metrics.push(UnifiedMetric::new(
                MetricType::SleepDuration,
                totals.asleep_s as f64 / 3600.0,
                SOURCE_TYPE,
                recorded_at,
            ));
        }
        if totals.in_bed_s > 0 {
            metrics.push(UnifiedMetric::new(
                MetricType::SleepTimeInBed,
                totals.in_bed_s as f64 / 3600.0,
                SOURCE_TYPE,
                recorded_at,
            ));
        }
        if totals.awake_s > 0 {
            metrics.push(UnifiedMetric::new(
                MetricType::SleepAwakeTime,
                totals.awake_s as f64 / 3600.0,
                SOURCE_TYPE,
                recorded_at,
            ));
        }
        if totals.asleep_s > 0 && totals.in_bed_s > 0 {
            metrics.push(UnifiedMetric::new(
                MetricType::SleepEfficiency,
                100.0 * totals.asleep_s as f64 / totals.in_bed_s as f64,
                SOURCE_TYPE,
                recorded_at,
            ));
        }
    }

    metrics
}

/// One HKWorkout session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkoutSample {
    pub activity_name: String,
    pub duration_s: f64,
    #[serde(default)]
    pub energy_kcal: Option<f64>,
    #[serde(default)]
    pub distance_m: Option<f64>,
    pub start_date: DateTime<Utc>,
    #[serde(default)]
    pub source_app: Option<String>,
    #[serde(default)]
    pub device_name: Option<String>,
}

/// A workout expands into one metric per derived quantity: duration always,
/// calories and distance when the session recorded them.
pub fn map_workout_sample(workout: &WorkoutSample) -> Vec<UnifiedMetric> {
    if !workout.duration_s.is_finite() || workout.duration_s <= 0.0 {
        tracing::debug!("Dropping workout sample with invalid duration");
        return Vec::new();
    }

    let attributed = |metric: UnifiedMetric| {
        metric
            .with_attribution(workout.source_app.clone(), workout.device_name.clone())
            .with_metadata_entry("activity_name", workout.activity_name.clone())
    };

    let mut metrics = vec![attributed(UnifiedMetric::new(
        MetricType::WorkoutDuration,
        workout.duration_s / 60.0,
        SOURCE_TYPE,
        workout.start_date,
    ))];

    if let Some(kcal) = workout.energy_kcal.filter(|v| v.is_finite() && *v > 0.0) {
        metrics.push(attributed(UnifiedMetric::new(
            MetricType::WorkoutCalories,
            kcal,
            SOURCE_TYPE,
            workout.start_date,
        )));
    }

    if let Some(meters) = workout.distance_m.filter(|v| v.is_finite() && *v > 0.0) {
        metrics.push(attributed(UnifiedMetric::new(
            MetricType::WorkoutDistance,
            meters / 1000.0,
            SOURCE_TYPE,
            workout.start_date,
        )));
    }

    metrics
}
