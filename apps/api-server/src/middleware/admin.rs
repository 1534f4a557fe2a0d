//! Admin guard extractor.

use actix_web::{FromRequest, HttpRequest, dev::Payload, http::header, web};
use std::future::{Ready, ready};

use crate::middleware::error::AppError;
use crate::state::AppState;

/// Proof that the request carried the admin token.
///
/// Add it as a handler argument to protect a route:
/// ```ignore
/// async fn delete_post(_admin: AdminIdentity, ...) -> AppResult<HttpResponse>
/// ```
#[derive(Debug, Clone, Copy)]
pub struct AdminIdentity;

impl FromRequest for AdminIdentity {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authorize(req))
    }
}

fn authorize(req: &HttpRequest) -> Result<AdminIdentity, AppError> {
    let Some(state) = req.app_data::<web::Data<AppState>>() else {
        tracing::error!("AppState not found in app data");
        return Err(AppError::Internal("Server configuration error".to_string()));
    };

    let Some(expected) = state.admin_token.as_deref() else {
        tracing::warn!(path = %req.path(), "Admin request rejected: ADMIN_TOKEN not configured");
        return Err(AppError::Forbidden);
    };

    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(AppError::Unauthorized)?;

    if !constant_time_eq(token.as_bytes(), expected.as_bytes()) {
        tracing::warn!(path = %req.path(), "Admin request rejected: bad token");
        return Err(AppError::Unauthorized);
    }

    Ok(AdminIdentity)
}

/// Compare two byte strings without short-circuiting on the first mismatch.
/// Only the length comparison may return early.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::constant_time_eq;

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"secret", b"secret"));
        assert!(!constant_time_eq(b"secret", b"secreT"));
        assert!(!constant_time_eq(b"secret", b"secret2"));
        assert!(!constant_time_eq(b"", b"x"));
        assert!(constant_time_eq(b"", b""));
    }
}
