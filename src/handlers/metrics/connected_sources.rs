use actix_web::{web, HttpResponse};
use sqlx::PgPool;

use crate::db::metrics::connected_sources;
use crate::db::preferences::{get_preferences, resolve_source};
use crate::middleware::auth::Claims;
use crate::models::common::ApiResponse;
use crate::models::metrics::HealthCategory;
use crate::models::preferences::{CategorySources, ConnectedSourcesResponse};

#[tracing::instrument(
    name = "List connected sources",
    skip(pool, claims),
    fields(username = %claims.username)
)]
pub async fn get_connected_sources(
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

    let preferences = match get_preferences(&pool, user_id).await {
        Ok(prefs) => prefs,
        Err(e) => {
            tracing::error!("Failed to load preferences: {:?}", e);
            return HttpResponse::InternalServerError().finish();
        }
    };

    let mut categories = Vec::with_capacity(HealthCategory::ALL.len());
    for category in HealthCategory::ALL {
        let connected = match connected_sources(&pool, user_id, category).await {
            Ok(sources) => sources,
            Err(e) => {
                tracing::error!("Failed to list sources for {}: {:?}", category, e);
                return HttpResponse::InternalServerError().finish();
            }
        };

        let resolved = match resolve_source(&pool, user_id, category).await {
            Ok(source) => source,
            Err(e) => {
                tracing::error!("Failed to resolve source for {}: {:?}", category, e);
                return HttpResponse::InternalServerError().finish();
            }
        };

        categories.push(CategorySources {
            category,
            connected_sources: connected,
            preferred_source: preferences
                .as_ref()
                .and_then(|p| p.source_for(category))
                .map(String::from),
            resolved_source: resolved,
        });
    }

    HttpResponse::Ok().json(ApiResponse::success(
        "Connected sources retrieved",
        ConnectedSourcesResponse { categories },
    ))
}
