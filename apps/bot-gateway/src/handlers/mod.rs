//! HTTP handlers and route configuration.

mod commands;
mod health;
mod limits;

use actix_web::web;

use crate::middleware::error::AppError;

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()),
    )
    .service(
        web::scope("/api")
            .route("/health", web::get().to(health::health_check))
            .route("/limits/check", web::post().to(limits::check))
            .route(
                "/commands/{command}/admit",
                web::post().to(commands::admit),
            ),
    );
}
