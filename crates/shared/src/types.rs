//! Common types used across Keystone

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

// Wire format for date-only fields: ISO "YYYY-MM-DD" strings
time::serde::format_description!(pub iso_date, Date, "[year]-[month]-[day]");

// =============================================================================
// Enums
// =============================================================================

/// Role attached to an identity and embedded in its tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "VARCHAR", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    User,
    Admin,
}

impl UserRole {
    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "user",
            UserRole::Admin => "admin",
        }
    }
}

// =============================================================================
// Identity
// =============================================================================

/// A user identity. Username and email are each optional but globally unique
/// when present; at least one of the two must exist for login to work.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, with = "iso_date::option", skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<Date>,
    pub is_active: bool,
    pub role: UserRole,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Fields for a not-yet-persisted identity
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub username: Option<String>,
    pub email: Option<String>,
    pub birth_date: Option<Date>,
    pub role: UserRole,
    pub is_active: bool,
}

impl NewUser {
    /// Build a new identity with the defaults registration uses:
    /// active, ordinary user role.
    pub fn new(
        name: String,
        username: Option<String>,
        email: Option<String>,
        birth_date: Option<Date>,
    ) -> Self {
        Self {
            name,
            username,
            email,
            birth_date,
            role: UserRole::User,
            is_active: true,
        }
    }
}

// =============================================================================
// Credential
// =============================================================================

/// Password credential, one-to-one with an identity. Holds only the argon2
/// hash; never serialized out of the core.
#[derive(Debug, Clone, FromRow)]
pub struct UserCredential {
    pub id: Uuid,
    pub user_id: Uuid,
    pub password_hash: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Fields for a not-yet-persisted credential
#[derive(Debug, Clone)]
pub struct NewCredential {
    pub user_id: Uuid,
    pub password_hash: String,
}

// =============================================================================
// Token Bundle
// =============================================================================

/// The pair of tokens handed to a client after register/login/refresh.
/// Never persisted server-side; validity is entirely signature + timestamps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenBundle {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

// =============================================================================
// Auth Requests
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, with = "iso_date::option")]
    pub birth_date: Option<Date>,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_is_admin() {
        assert!(UserRole::Admin.is_admin());
        assert!(!UserRole::User.is_admin());
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&UserRole::Admin).unwrap();
        assert_eq!(json, "\"admin\"");
    }

    #[test]
    fn test_new_user_defaults() {
        let user = NewUser::new("Ann".to_string(), Some("ann".to_string()), None, None);
        assert!(user.is_active);
        assert_eq!(user.role, UserRole::User);
    }
}
