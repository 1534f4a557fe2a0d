//! Health check endpoint.

use actix_web::{HttpResponse, web};
use serde::Serialize;

use crate::observability::RequestId;
use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub storage: &'static str,
    pub timestamp: String,
    pub request_id: String,
}

/// Health check endpoint - returns server status.
///
/// GET /api/health
pub async fn health_check(state: web::Data<AppState>, request_id: RequestId) -> HttpResponse {
    #[cfg(feature = "postgres")]
    if let Some(db) = &state.db {
        if let Err(e) = db.ping().await {
            tracing::error!("Database ping failed: {}", e);
            return HttpResponse::ServiceUnavailable().json(HealthResponse {
                status: "degraded",
                version: env!("CARGO_PKG_VERSION"),
                storage: state.storage(),
                timestamp: chrono::Utc::now().to_rfc3339(),
                request_id: request_id.as_str().to_string(),
            });
        }
    }

    HttpResponse::Ok().json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        storage: state.storage(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        request_id: request_id.as_str().to_string(),
    })
}
