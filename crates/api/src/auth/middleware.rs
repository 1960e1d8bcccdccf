//! Authentication middleware (the per-request gate)
//!
//! `require_auth` rejects requests without a valid access token, with one
//! recovery path: an expired (but well-signed) access token is silently
//! renewed using the refresh cookie, and the new token is surfaced to the
//! client via response headers. `optional_auth` runs the same decision tree
//! but degrades every failure to anonymous continuation.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use keystone_shared::{AuthError, UserRole};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// Cookie carrying the refresh token, out-of-band from the Authorization header
pub const REFRESH_COOKIE: &str = "keystone_refresh_token";

/// Response header carrying a silently renewed access token
pub const NEW_ACCESS_TOKEN_HEADER: &str = "x-new-access-token";

/// Response header naming the renewed token's type
pub const TOKEN_TYPE_HEADER: &str = "x-token-type";

/// Identity attached to the request by the gate, read by later middleware
/// and handlers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: UserRole,
}

/// Extract the token from an `Authorization: Bearer <token>` header
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if scheme != "Bearer" || token.is_empty() {
        return None;
    }
    Some(token)
}

enum GateOutcome {
    /// Token valid, identity attached
    Authenticated(AuthUser),
    /// Expired access token renewed; carry the new token to the response
    Renewed(AuthUser, String),
    /// Terminal rejection
    Rejected(ApiError),
}

/// Run the gate's decision tree against the request's headers and cookies
async fn evaluate(state: &AppState, headers: &HeaderMap, jar: &CookieJar) -> GateOutcome {
    let Some(token) = bearer_token(headers) else {
        return GateOutcome::Rejected(ApiError::Unauthorized);
    };

    match state.auth.validate(token) {
        Ok(claims) => GateOutcome::Authenticated(AuthUser {
            user_id: claims.sub,
            role: claims.role,
        }),
        Err(AuthError::ExpiredToken) => {
            let Some(refresh_token) = jar.get(REFRESH_COOKIE) else {
                return GateOutcome::Rejected(ApiError::ExpiredToken);
            };

            // One-shot renewal; if it fails the client sees the original
            // expiry failure, not the renewal failure
            let new_token = match state.auth.refresh_access_token(refresh_token.value()).await {
                Ok(token) => token,
                Err(e) => {
                    tracing::debug!(error = %e, "Silent renewal failed");
                    return GateOutcome::Rejected(ApiError::ExpiredToken);
                }
            };

            // The renewed token was just issued; failing validation here is
            // an internal error, never a client one
            match state.auth.validate(&new_token) {
                Ok(claims) => GateOutcome::Renewed(
                    AuthUser {
                        user_id: claims.sub,
                        role: claims.role,
                    },
                    new_token,
                ),
                Err(e) => {
                    tracing::error!(error = %e, "Renewed access token failed validation");
                    GateOutcome::Rejected(ApiError::Internal)
                }
            }
        }
        Err(AuthError::InvalidToken) => GateOutcome::Rejected(ApiError::InvalidToken),
        Err(e) => GateOutcome::Rejected(ApiError::from(e)),
    }
}

/// Attach the renewed access token to the outgoing response
fn attach_renewal_headers(response: &mut Response, new_token: &str) {
    if let Ok(value) = HeaderValue::from_str(new_token) {
        response
            .headers_mut()
            .insert(NEW_ACCESS_TOKEN_HEADER, value);
        response
            .headers_mut()
            .insert(TOKEN_TYPE_HEADER, HeaderValue::from_static("Bearer"));
    }
}

/// Reject requests that do not present a valid (or silently renewable)
/// access token
pub async fn require_auth(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    match evaluate(&state, req.headers(), &jar).await {
        GateOutcome::Authenticated(user) => {
            req.extensions_mut().insert(user);
            next.run(req).await
        }
        GateOutcome::Renewed(user, new_token) => {
            req.extensions_mut().insert(user);
            let mut response = next.run(req).await;
            attach_renewal_headers(&mut response, &new_token);
            response
        }
        GateOutcome::Rejected(err) => err.into_response(),
    }
}

/// Like `require_auth`, but anonymous access is allowed: every rejection
/// becomes continuation with no identity attached. Renewal still happens
/// when it can.
pub async fn optional_auth(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    match evaluate(&state, req.headers(), &jar).await {
        GateOutcome::Authenticated(user) => {
            req.extensions_mut().insert(user);
            next.run(req).await
        }
        GateOutcome::Renewed(user, new_token) => {
            req.extensions_mut().insert(user);
            let mut response = next.run(req).await;
            attach_renewal_headers(&mut response, &new_token);
            response
        }
        GateOutcome::Rejected(_) => next.run(req).await,
    }
}
