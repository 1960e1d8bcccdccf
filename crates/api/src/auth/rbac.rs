//! Role/ownership access control middleware
//!
//! Pure decision gates evaluated after the authentication middleware has
//! attached `AuthUser` to the request. They never touch tokens: a missing
//! identity is `Unauthorized`, a present-but-insufficient one is
//! `Forbidden`.

use axum::{
    extract::{Path, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::auth::middleware::AuthUser;
use crate::error::ApiError;

fn auth_user(req: &Request) -> Result<AuthUser, ApiError> {
    req.extensions()
        .get::<AuthUser>()
        .copied()
        .ok_or(ApiError::Unauthorized)
}

/// Pass only callers with the admin role
pub async fn require_admin(req: Request, next: Next) -> Response {
    let user = match auth_user(&req) {
        Ok(user) => user,
        Err(err) => return err.into_response(),
    };

    if !user.role.is_admin() {
        return ApiError::Forbidden.into_response();
    }

    next.run(req).await
}

/// Pass only the identity the route targets
pub async fn require_owner(Path(target_id): Path<Uuid>, req: Request, next: Next) -> Response {
    let user = match auth_user(&req) {
        Ok(user) => user,
        Err(err) => return err.into_response(),
    };

    if user.user_id != target_id {
        return ApiError::Forbidden.into_response();
    }

    next.run(req).await
}

/// Pass the targeted identity or any admin
pub async fn require_owner_or_admin(
    Path(target_id): Path<Uuid>,
    req: Request,
    next: Next,
) -> Response {
    let user = match auth_user(&req) {
        Ok(user) => user,
        Err(err) => return err.into_response(),
    };

    if !user.role.is_admin() && user.user_id != target_id {
        return ApiError::Forbidden.into_response();
    }

    next.run(req).await
}
