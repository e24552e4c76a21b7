//! Health check endpoint.

use actix_web::{HttpResponse, web};
use qqbot_shared::dto::HealthResponse;

use crate::state::AppState;

/// GET /api/health
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let response = HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        call_log_store: state.limiter.backend().to_string(),
    };

    HttpResponse::Ok().json(response)
}
