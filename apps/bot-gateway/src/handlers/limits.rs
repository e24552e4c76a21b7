//! Raw limiter checks for plugins that manage their own quotas.

use actix_web::{HttpResponse, web};
use serde_json::Value;

use qqbot_core::domain::{QuotaOverrides, SubjectId};
use qqbot_shared::ApiResponse;
use qqbot_shared::dto::{LimitCheckRequest, LimitCheckResponse};

use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// Subject ids arrive as JSON strings or numbers.
pub(crate) fn parse_subject(raw: Value) -> AppResult<SubjectId> {
    let subject: SubjectId = serde_json::from_value(raw)
        .map_err(|_| AppError::BadRequest("subject must be a string or an integer".to_string()))?;
    if subject.as_str().is_empty() {
        return Err(AppError::BadRequest("subject must not be empty".to_string()));
    }
    Ok(subject)
}

/// POST /api/limits/check
///
/// With `overrides`, store outages always refuse; otherwise
/// `default_on_unavailable` decides.
pub async fn check(
    state: web::Data<AppState>,
    body: web::Json<LimitCheckRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    if req.action.trim().is_empty() {
        return Err(AppError::BadRequest("action must not be empty".to_string()));
    }
    if !(req.window_minutes.is_finite() && req.window_minutes > 0.0) {
        return Err(AppError::BadRequest(
            "window_minutes must be a positive number".to_string(),
        ));
    }
    let subject = parse_subject(req.subject)?;

    let allowed = match req.overrides {
        None => {
            state
                .limiter
                .check(
                    &req.action,
                    subject,
                    req.window_minutes,
                    req.max_count,
                    req.default_on_unavailable,
                )
                .await
        }
        Some(raw) => {
            let overrides: QuotaOverrides = serde_json::from_value(raw).map_err(|e| {
                AppError::BadRequest(format!("overrides must map subjects to integers: {e}"))
            })?;
            state
                .limiter
                .check_with_overrides(
                    &req.action,
                    subject,
                    req.window_minutes,
                    req.max_count,
                    &overrides,
                )
                .await
        }
    };

    Ok(HttpResponse::Ok().json(ApiResponse::ok(LimitCheckResponse { allowed })))
}
