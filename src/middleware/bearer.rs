//! Bearer-token request gate.
//!
//! Responsibility:
//! - No `Authorization` header: let the request through (no-auth mode).
//! - `Authorization: Bearer <token>`: verify against the shared secret,
//!   reject with 401 + descriptive plain text on failure.
//! - Verified tokens carrying an embedded error claim (`err`, `sim_error`,
//!   `auth_error`, in that order) are rejected with that claim as the body.
//! - On pass, the decoded claims land in request extensions as
//!   [`BearerClaims`] for downstream extractors.

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::{self, Next},
    response::Response,
};
use serde_json::{Map, Value};

use crate::error::AppError;
use crate::state::AppState;
use crate::token::{embedded_error, rejection_text, verify_bearer};

const INVALID_TOKEN: &str = "Error: Invalid token";

/// Verified claims of the request's bearer token. Absent when the request
/// carried no `Authorization` header.
#[derive(Debug, Clone)]
pub struct BearerClaims(pub Map<String, Value>);

/// Layer the gate onto a router.
///
/// Example:
/// ```ignore
/// let v1 = bearer::apply(v1, state.clone());
/// app = app.nest("/v1", v1);
/// ```
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    // from_fn cannot take a State extractor; pass state explicitly
    router.layer(middleware::from_fn_with_state(state, bearer_gate))
}

async fn bearer_gate(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let Some(authorization) = req.headers().get(header::AUTHORIZATION) else {
        return Ok(next.run(req).await);
    };

    let token = authorization
        .to_str()
        .ok()
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::Unauthorized(INVALID_TOKEN.to_string()))?;

    let claims = verify_bearer(token, &state.config.jwt_secret).map_err(|e| {
        tracing::warn!(error = %e, "bearer token verification failed");
        AppError::Unauthorized(rejection_text(&e))
    })?;

    if let Some(message) = embedded_error(&claims) {
        return Err(AppError::Unauthorized(message));
    }

    req.extensions_mut().insert(BearerClaims(claims));
    Ok(next.run(req).await)
}
