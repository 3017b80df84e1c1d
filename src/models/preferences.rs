use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::metrics::HealthCategory;

/// One row per user: the provider the user designated as authoritative for
/// each category, or unset if they never chose one. Workouts has no field of
/// its own and follows activity.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserDataSourcePreferences {
    pub user_id: Uuid,
    pub activity_source: Option<String>,
    pub sleep_source: Option<String>,
    pub nutrition_source: Option<String>,
    pub body_composition_source: Option<String>,
    pub heart_health_source: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserDataSourcePreferences {
    /// Stored preference for a category, if the user ever picked one.
    pub fn source_for(&self, category: HealthCategory) -> Option<&str> {
        match category.preference_category() {
            HealthCategory::Activity | HealthCategory::Workouts => {
                self.activity_source.as_deref()
            }
            HealthCategory::Sleep => self.sleep_source.as_deref(),
            HealthCategory::Nutrition => self.nutrition_source.as_deref(),
            HealthCategory::BodyComposition => self.body_composition_source.as_deref(),
            HealthCategory::HeartHealth => self.heart_health_source.as_deref(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdatePreferenceRequest {
    pub category: HealthCategory,
    pub source_type: String,
}

/// Connected sources and the resolved authoritative one, per category.
#[derive(Debug, Serialize, Deserialize)]
pub struct CategorySources {
    pub category: HealthCategory,
    pub connected_sources: Vec<String>,
    pub preferred_source: Option<String>,
    pub resolved_source: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConnectedSourcesResponse {
    pub categories: Vec<CategorySources>,
}
