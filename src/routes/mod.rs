use actix_web::web;

pub mod registration;
pub mod backend_health;
pub mod auth;
pub mod metrics;
pub mod preferences;

use crate::middleware::auth::AuthMiddleware;

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(registration::register)
        .service(backend_health::backend_health)
        .service(auth::login);

    // Health routes (require authentication)
    cfg.service(
        web::scope("/health")
            .wrap(AuthMiddleware)
            .service(metrics::sync)
            .service(metrics::import_healthkit_route)
            .service(metrics::import_withings_route)
            .service(metrics::import_oura_route)
            .service(metrics::import_csv_route)
            .service(metrics::get_metrics_route)
            .service(metrics::get_sources)
            .service(preferences::get_preferences_route)
            .service(preferences::update_preference_route)
    );
}
