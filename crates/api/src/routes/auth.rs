//! Authentication routes

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use keystone_shared::{LoginRequest, RegisterRequest, TokenBundle, User, UserRole};
use serde::Serialize;
use time::Date;
use uuid::Uuid;

use crate::{
    auth::{AuthUser, REFRESH_COOKIE},
    error::ApiResult,
    state::AppState,
};

// =============================================================================
// Response Types
// =============================================================================

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub id: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(
        with = "keystone_shared::iso_date::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub birth_date: Option<Date>,
    pub role: UserRole,
    pub is_active: bool,
}

impl From<User> for ProfileResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            username: user.username,
            email: user.email,
            birth_date: user.birth_date,
            role: user.role,
            is_active: user.is_active,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,
}

// =============================================================================
// Helpers
// =============================================================================

/// Build the refresh cookie: same-site, http-only, secure, scoped to the API
/// path, with a lifetime matching the refresh token's own expiry.
fn refresh_cookie(token: &str, max_age: time::Duration) -> Cookie<'static> {
    Cookie::build((REFRESH_COOKIE, token.to_string()))
        .path("/api")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Strict)
        .max_age(max_age)
        .build()
}

fn set_refresh_cookie(jar: CookieJar, state: &AppState, bundle: &TokenBundle) -> CookieJar {
    jar.add(refresh_cookie(
        &bundle.refresh_token,
        state.auth.refresh_ttl(),
    ))
}

// =============================================================================
// Handlers
// =============================================================================

/// Register a new user; returns a first token bundle and sets the refresh
/// cookie
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(CookieJar, (StatusCode, Json<TokenBundle>))> {
    let bundle = state.auth.register(req).await?;
    let jar = set_refresh_cookie(jar, &state, &bundle);
    Ok((jar, (StatusCode::CREATED, Json(bundle))))
}

/// Login with username or email; rotates both tokens
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> ApiResult<(CookieJar, Json<TokenBundle>)> {
    let bundle = state.auth.login(req).await?;
    let jar = set_refresh_cookie(jar, &state, &bundle);
    Ok((jar, Json(bundle)))
}

/// Exchange the refresh cookie for a fresh token bundle; the rotated refresh
/// token replaces the cookie
pub async fn refresh(
    State(state): State<AppState>,
    jar: CookieJar,
) -> ApiResult<(CookieJar, Json<TokenBundle>)> {
    let refresh_token = jar
        .get(REFRESH_COOKIE)
        .map(|c| c.value().to_string())
        .unwrap_or_default();

    let bundle = state.auth.refresh(&refresh_token).await?;
    let jar = set_refresh_cookie(jar, &state, &bundle);
    Ok((jar, Json(bundle)))
}

/// Profile of the authenticated caller
pub async fn me(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Json<ProfileResponse>> {
    let profile = state.auth.user_by_id(user.user_id).await?;
    Ok(Json(profile.into()))
}

/// Session introspection; anonymous access allowed
pub async fn session(user: Option<Extension<AuthUser>>) -> Json<SessionResponse> {
    match user {
        Some(Extension(user)) => Json(SessionResponse {
            authenticated: true,
            user_id: Some(user.user_id),
            role: Some(user.role),
        }),
        None => Json(SessionResponse {
            authenticated: false,
            user_id: None,
            role: None,
        }),
    }
}

/// Reactivate a user account (admin only)
pub async fn activate_user(
    State(state): State<AppState>,
    Path(target_id): Path<Uuid>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Json<ProfileResponse>> {
    let updated = state.auth.activate_user(target_id, user.role).await?;
    Ok(Json(updated.into()))
}

/// Deactivate a user account (owner or admin)
pub async fn deactivate_user(
    State(state): State<AppState>,
    Path(target_id): Path<Uuid>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Json<ProfileResponse>> {
    let updated = state
        .auth
        .deactivate_user(target_id, user.user_id, user.role)
        .await?;
    Ok(Json(updated.into()))
}
