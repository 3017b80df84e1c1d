use actix_web::{web, HttpResponse};
use serde_json::json;
use sqlx::PgPool;

use crate::db::preferences::get_preferences;
use crate::middleware::auth::Claims;
use crate::models::common::ApiResponse;

#[tracing::instrument(
    name = "Get source preferences",
    skip(pool, claims),
    fields(username = %claims.username)
)]
pub async fn get_source_preferences(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>
) -> HttpResponse {
    let user_id = match claims.user_id() {
        Some(id) => id,
        None => {
            tracing::error!("Failed to parse user ID from claims");
            return HttpResponse::InternalServerError().finish();
        }
    };

    match get_preferences(&pool, user_id).await {
        Ok(Some(preferences)) => {
            HttpResponse::Ok().json(ApiResponse::success("Preferences retrieved", preferences))
        }
        // Accounts from before the preferences table rolled out have no row
        Ok(None) => HttpResponse::Ok().json(ApiResponse::success(
            "Preferences retrieved",
            json!({
                "user_id": user_id,
                "activity_source": null,
                "sleep_source": null,
                "nutrition_source": null,
                "body_composition_source": null,
                "heart_health_source": null
            }),
        )),
        Err(e) => {
            tracing::error!("Failed to load preferences: {:?}", e);
            HttpResponse::InternalServerError().finish()
        }
    }
}
