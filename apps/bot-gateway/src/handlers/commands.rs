//! Command admission: the check every plugin handler runs before calling
//! its external API.

use actix_web::{HttpResponse, web};

use qqbot_shared::ApiResponse;
use qqbot_shared::dto::{AdmissionRequest, AdmissionResponse};

use super::limits::parse_subject;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// POST /api/commands/{command}/admit
pub async fn admit(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<AdmissionRequest>,
) -> AppResult<HttpResponse> {
    let command = path.into_inner();
    let policy = state.policies.get(&command)?;
    let user_id = parse_subject(body.into_inner().user_id)?;

    let allowed = state.limiter.admit(policy, user_id.clone()).await;
    if !allowed {
        tracing::info!(command = %command, user = %user_id, "Command refused");
    }

    Ok(HttpResponse::Ok().json(ApiResponse::ok(AdmissionResponse {
        reply: (!allowed).then(|| policy.refusal.clone()),
        command,
        allowed,
    })))
}
