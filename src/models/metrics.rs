use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

/// Coarse grouping used to scope source preferences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthCategory {
    Activity,
    Sleep,
    Nutrition,
    BodyComposition,
    HeartHealth,
    Workouts,
}

impl HealthCategory {
    pub const ALL: [HealthCategory; 6] = [
        HealthCategory::Activity,
        HealthCategory::Sleep,
        HealthCategory::Nutrition,
        HealthCategory::BodyComposition,
        HealthCategory::HeartHealth,
        HealthCategory::Workouts,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HealthCategory::Activity => "activity",
            HealthCategory::Sleep => "sleep",
            HealthCategory::Nutrition => "nutrition",
            HealthCategory::BodyComposition => "body_composition",
            HealthCategory::HeartHealth => "heart_health",
            HealthCategory::Workouts => "workouts",
        }
    }

    /// The category whose preference field governs this one.
    /// Workouts has no field of its own and follows activity.
    pub fn preference_category(&self) -> HealthCategory {
        match self {
            HealthCategory::Workouts => HealthCategory::Activity,
            other => *other,
        }
    }
}

impl fmt::Display for HealthCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for HealthCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "activity" => Ok(HealthCategory::Activity),
            "sleep" => Ok(HealthCategory::Sleep),
            "nutrition" => Ok(HealthCategory::Nutrition),
            "body_composition" => Ok(HealthCategory::BodyComposition),
            "heart_health" => Ok(HealthCategory::HeartHealth),
            "workouts" => Ok(HealthCategory::Workouts),
            other => Err(format!("{} is not a known health category", other)),
        }
    }
}

/// Fixed enumeration of measurements the platform understands.
/// Each type carries exactly one canonical unit and belongs to one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricType {
    ActivitySteps,
    ActivityDistance,
    ActivityCalories,
    ActivityExerciseMinutes,
    ActivityFlightsClimbed,
    SleepDuration,
    SleepTimeInBed,
    SleepAwakeTime,
    SleepEfficiency,
    NutritionCalories,
    NutritionProtein,
    NutritionCarbs,
    NutritionFat,
    NutritionWater,
    BodyWeight,
    BodyFatPercentage,
    BodyLeanMass,
    BodyBmi,
    HeartRate,
    HeartRateResting,
    HeartRateVariability,
    BloodPressureSystolic,
    BloodPressureDiastolic,
    BloodOxygen,
    WorkoutDuration,
    WorkoutCalories,
    WorkoutDistance,
}

impl MetricType {
    pub const ALL: [MetricType; 27] = [
        MetricType::ActivitySteps,
        MetricType::ActivityDistance,
        MetricType::ActivityCalories,
        MetricType::ActivityExerciseMinutes,
        MetricType::ActivityFlightsClimbed,
        MetricType::SleepDuration,
        MetricType::SleepTimeInBed,
        MetricType::SleepAwakeTime,
        MetricType::SleepEfficiency,
        MetricType::NutritionCalories,
        MetricType::NutritionProtein,
        MetricType::NutritionCarbs,
        MetricType::NutritionFat,
        MetricType::NutritionWater,
        MetricType::BodyWeight,
        MetricType::BodyFatPercentage,
        MetricType::BodyLeanMass,
        MetricType::BodyBmi,
        MetricType::HeartRate,
        MetricType::HeartRateResting,
        MetricType::HeartRateVariability,
        MetricType::BloodPressureSystolic,
        MetricType::BloodPressureDiastolic,
        MetricType::BloodOxygen,
        MetricType::WorkoutDuration,
        MetricType::WorkoutCalories,
        MetricType::WorkoutDistance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricType::ActivitySteps => "activity_steps",
            MetricType::ActivityDistance => "activity_distance",
            MetricType::ActivityCalories => "activity_calories",
            MetricType::ActivityExerciseMinutes => "activity_exercise_minutes",
            MetricType::ActivityFlightsClimbed => "activity_flights_climbed",
            MetricType::SleepDuration => "sleep_duration",
            MetricType::SleepTimeInBed => "sleep_time_in_bed",
            MetricType::SleepAwakeTime => "sleep_awake_time",
            MetricType::SleepEfficiency => "sleep_efficiency",
            MetricType::NutritionCalories => "nutrition_calories",
            MetricType::NutritionProtein => "nutrition_protein",
            MetricType::NutritionCarbs => "nutrition_carbs",
            MetricType::NutritionFat => "nutrition_fat",
            MetricType::NutritionWater => "nutrition_water",
            MetricType::BodyWeight => "body_weight",
            MetricType::BodyFatPercentage => "body_fat_percentage",
            MetricType::BodyLeanMass => "body_lean_mass",
            MetricType::BodyBmi => "body_bmi",
            MetricType::HeartRate => "heart_rate",
            MetricType::HeartRateResting => "heart_rate_resting",
            MetricType::HeartRateVariability => "heart_rate_variability",
            MetricType::BloodPressureSystolic => "blood_pressure_systolic",
            MetricType::BloodPressureDiastolic => "blood_pressure_diastolic",
            MetricType::BloodOxygen => "blood_oxygen",
            MetricType::WorkoutDuration => "workout_duration",
            MetricType::WorkoutCalories => "workout_calories",
            MetricType::WorkoutDistance => "workout_distance",
        }
    }

    /// Unit every stored value of this type is expressed in. There is no
    /// conversion downstream of the mappers.
    pub fn canonical_unit(&self) -> &'static str {
        match self {
            MetricType::ActivitySteps => "steps",
            MetricType::ActivityDistance => "km",
            MetricType::ActivityCalories => "kcal",
            MetricType::ActivityExerciseMinutes => "minutes",
            MetricType::ActivityFlightsClimbed => "flights",
            MetricType::SleepDuration => "hours",
            MetricType::SleepTimeInBed => "hours",
            MetricType::SleepAwakeTime => "hours",
            MetricType::SleepEfficiency => "%",
            MetricType::NutritionCalories => "kcal",
            MetricType::NutritionProtein => "g",
            MetricType::NutritionCarbs => "g",
            MetricType::NutritionFat => "g",
            MetricType::NutritionWater => "ml",
            MetricType::BodyWeight => "kg",
            MetricType::BodyFatPercentage => "%",
            MetricType::BodyLeanMass => "kg",
            MetricType::BodyBmi => "bmi",
            MetricType::HeartRate => "bpm",
            MetricType::HeartRateResting => "bpm",
            MetricType::HeartRateVariability => "ms",
            MetricType::BloodPressureSystolic => "mmHg",
            MetricType::BloodPressureDiastolic => "mmHg",
            MetricType::BloodOxygen => "%",
            MetricType::WorkoutDuration => "minutes",
            MetricType::WorkoutCalories => "kcal",
            MetricType::WorkoutDistance => "km",
        }
    }

    pub fn category(&self) -> HealthCategory {
        match self {
            MetricType::ActivitySteps
            | MetricType::ActivityDistance
            | MetricType::ActivityCalories
            | MetricType::ActivityExerciseMinutes
            | MetricType::ActivityFlightsClimbed => HealthCategory::Activity,
            MetricType::SleepDuration
            | MetricType::SleepTimeInBed
            | MetricType::SleepAwakeTime
            | MetricType::SleepEfficiency => HealthCategory::Sleep,
            MetricType::NutritionCalories
            | MetricType::NutritionProtein
            | MetricType::NutritionCarbs
            | MetricType::NutritionFat
            | MetricType::NutritionWater => HealthCategory::Nutrition,
            MetricType::BodyWeight
            | MetricType::BodyFatPercentage
            | MetricType::BodyLeanMass
            | MetricType::BodyBmi => HealthCategory::BodyComposition,
            MetricType::HeartRate
            | MetricType::HeartRateResting
            | MetricType::HeartRateVariability
            | MetricType::BloodPressureSystolic
            | MetricType::BloodPressureDiastolic
            | MetricType::BloodOxygen => HealthCategory::HeartHealth,
            MetricType::WorkoutDuration
            | MetricType::WorkoutCalories
            | MetricType::WorkoutDistance => HealthCategory::Workouts,
        }
    }

    /// All metric types belonging to a category.
    pub fn for_category(category: HealthCategory) -> Vec<MetricType> {
        MetricType::ALL
            .iter()
            .copied()
            .filter(|t| t.category() == category)
            .collect()
    }
}

impl fmt::Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MetricType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MetricType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("{} is not a known metric type", s))
    }
}

/// One normalized health observation, independent of the originating provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnifiedMetric {
    pub metric_type: MetricType,
    pub value: f64,
    pub unit: String,
    pub source_type: String,
    pub recorded_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_app: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, String>>,
}

impl UnifiedMetric {
    /// `value` must already be expressed in the canonical unit for
    /// `metric_type`; the unit string is stamped here, never supplied.
    pub fn new(
        metric_type: MetricType,
        value: f64,
        source_type: impl Into<String>,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            metric_type,
            value,
            unit: metric_type.canonical_unit().to_string(),
            source_type: source_type.into(),
            recorded_at,
            source_app: None,
            device_name: None,
            metadata: None,
        }
    }

    pub fn with_attribution(
        mut self,
        source_app: Option<String>,
        device_name: Option<String>,
    ) -> Self {
        self.source_app = source_app;
        self.device_name = device_name;
        self
    }

    pub fn with_metadata_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }
}

/// Validation failures for client-supplied metrics in a sync batch.
#[derive(Debug, thiserror::Error)]
pub enum MetricValidationError {
    #[error("unknown metric type: {0}")]
    UnknownMetricType(String),

    #[error("value for {0} must be a finite number")]
    NonFiniteValue(MetricType),

    #[error("unit `{supplied}` does not match canonical unit `{canonical}` for {metric_type}")]
    UnitMismatch {
        metric_type: MetricType,
        supplied: String,
        canonical: &'static str,
    },

    #[error("malformed metric entry: {0}")]
    Malformed(String),
}

/// One client-supplied metric in a sync batch, before validation.
#[derive(Debug, Serialize, Deserialize)]
pub struct MetricPayload {
    pub metric_type: String,
    pub value: f64,
    #[serde(default)]
    pub unit: Option<String>,
    pub source_type: String,
    pub recorded_at: DateTime<Utc>,
    #[serde(default)]
    pub source_app: Option<String>,
    #[serde(default)]
    pub device_name: Option<String>,
    #[serde(default)]
    pub metadata: Option<HashMap<String, String>>,
}

impl MetricPayload {
    /// Check the payload against the schema. The unit, when supplied, must
    /// already be the canonical one; clients convert before submitting.
    pub fn into_unified(self) -> Result<UnifiedMetric, MetricValidationError> {
        let metric_type = MetricType::from_str(&self.metric_type)
            .map_err(|_| MetricValidationError::UnknownMetricType(self.metric_type.clone()))?;

        if !self.value.is_finite() {
            return Err(MetricValidationError::NonFiniteValue(metric_type));
        }

        if let Some(unit) = &self.unit {
            if unit != metric_type.canonical_unit() {
                return Err(MetricValidationError::UnitMismatch {
                    metric_type,
                    supplied: unit.clone(),
                    canonical: metric_type.canonical_unit(),
                });
            }
        }

        Ok(UnifiedMetric {
            metric_type,
            value: self.value,
            unit: metric_type.canonical_unit().to_string(),
            source_type: self.source_type,
            recorded_at: self.recorded_at,
            source_app: self.source_app,
            device_name: self.device_name,
            metadata: self.metadata,
        })
    }
}

/// Stored metric row.
#[derive(Debug, FromRow, Serialize)]
pub struct HealthMetricRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub metric_type: String,
    pub value: f64,
    pub unit: String,
    pub source_type: String,
    pub recorded_at: DateTime<Utc>,
    pub source_app: Option<String>,
    pub device_name: Option<String>,
    pub metadata: Option<Json<HashMap<String, String>>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct MetricSyncRequest {
    // Entries are validated one by one; a malformed entry must not take the
    // rest of the batch down with it, so they arrive as raw JSON values.
    pub metrics: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    Completed,
    Partial,
    Failed,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SyncItemError {
    pub index: usize,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MetricSyncResponse {
    pub sync_id: Uuid,
    pub status: SyncStatus,
    pub processed_count: usize,
    pub failed_count: usize,
    pub total_count: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<SyncItemError>,
}

#[derive(Debug, Deserialize)]
pub struct MetricQuery {
    pub category: Option<HealthCategory>,
    pub metric_type: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub all_sources: bool,
}
