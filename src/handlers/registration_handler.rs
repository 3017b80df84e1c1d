use actix_web::{web, HttpResponse};
use serde_json::json;
use sqlx::PgPool;

use crate::db::users::insert_user;
use crate::models::user::RegistrationRequest;

#[tracing::instrument(
    name = "Adding a new user",
    // Don't show arguments
    skip(user_form, pool),
    fields(
        username = %user_form.username,
        email = %user_form
    )
)]
pub async fn register_user(
    user_form: web::Json<RegistrationRequest>,
    pool: web::Data<PgPool>
) -> HttpResponse {
    match insert_user(&pool, &user_form).await {
        Ok(user_id) => {
            tracing::info!("New user registered: {}", user_id);
            HttpResponse::Ok().json(json!({
                "status": "success",
                "user_id": user_id
            }))
        }
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            HttpResponse::Conflict().json(json!({
                "status": "error",
                "message": "Username or email already taken"
            }))
        }
        Err(e) => {
            tracing::error!("Failed to register user: {:?}", e);
            HttpResponse::InternalServerError().finish()
        }
    }
}
