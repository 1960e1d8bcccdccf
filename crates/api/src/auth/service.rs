//! Credential orchestration: registration, login, and token refresh
//!
//! Composes the token codec, the identity/credential stores, and the
//! password hasher. The registration write spans two stores with no
//! transaction between them; consistency is kept by a compensating delete
//! of the identity when the credential half fails.

use std::sync::Arc;

use keystone_shared::{
    AuthError, LoginRequest, NewCredential, NewUser, RegisterRequest, TokenBundle, User, UserRole,
};
use time::Date;
use uuid::Uuid;

use crate::auth::jwt::{Claims, JwtManager};
use crate::auth::password::{hash_password, verify_password};
use crate::store::{CredentialStore, UserStore};

/// Minimum age for registration
const MINIMUM_AGE: i32 = 13;

/// Usernames that can never be registered
const RESERVED_USERNAMES: &[&str] = &[
    "admin",
    "administrator",
    "root",
    "system",
    "api",
    "www",
    "mail",
    "ftp",
    "support",
    "help",
    "test",
    "demo",
    "guest",
    "user",
    "default",
];

/// Authentication service over the identity and credential stores
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    credentials: Arc<dyn CredentialStore>,
    jwt: JwtManager,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        credentials: Arc<dyn CredentialStore>,
        jwt: JwtManager,
    ) -> Self {
        Self {
            users,
            credentials,
            jwt,
        }
    }

    /// Register a new user and issue a first token bundle.
    ///
    /// If hashing or credential creation fails after the identity record was
    /// created, the identity is deleted before the error propagates, so no
    /// orphan identity survives a failed registration.
    pub async fn register(&self, req: RegisterRequest) -> Result<TokenBundle, AuthError> {
        if let Some(birth_date) = req.birth_date {
            if is_under_age(birth_date) {
                return Err(AuthError::UserUnderAge);
            }
        }

        let username = req.username.filter(|u| !u.is_empty());
        let email = req.email.filter(|e| !e.is_empty());

        if let Some(name) = &username {
            if RESERVED_USERNAMES.contains(&name.as_str()) {
                return Err(AuthError::Validation("Username is reserved".to_string()));
            }
        }
        if username.is_none() && email.is_none() {
            return Err(AuthError::Validation(
                "A username or email is required".to_string(),
            ));
        }

        let user = self
            .users
            .create(NewUser::new(req.name, username, email, req.birth_date))
            .await?;

        let password_hash = match hash_password(&req.password) {
            Ok(hash) => hash,
            Err(e) => {
                self.compensate_registration(user.id).await;
                return Err(AuthError::Internal(e.to_string()));
            }
        };

        if let Err(e) = self
            .credentials
            .create(NewCredential {
                user_id: user.id,
                password_hash,
            })
            .await
        {
            self.compensate_registration(user.id).await;
            return Err(e);
        }

        tracing::info!(user_id = %user.id, "User registered");
        self.jwt.issue(&user).map_err(AuthError::from)
    }

    /// Delete the identity created by a registration whose credential half
    /// failed. A failed compensation is logged, not surfaced; the original
    /// error is what the caller sees.
    async fn compensate_registration(&self, user_id: Uuid) {
        if let Err(e) = self.users.delete(user_id).await {
            tracing::error!(user_id = %user_id, error = %e, "Failed to delete user after registration failure");
        }
    }

    /// Login by username or email. Lookup, credential, and password failures
    /// all fold into `Unauthorized` so a caller cannot tell which half failed.
    pub async fn login(&self, req: LoginRequest) -> Result<TokenBundle, AuthError> {
        let user = if let Some(username) = req.username.as_deref().filter(|u| !u.is_empty()) {
            self.users.find_by_username(username).await
        } else if let Some(email) = req.email.as_deref().filter(|e| !e.is_empty()) {
            self.users.find_by_email(email).await
        } else {
            return Err(AuthError::Validation(
                "A username or email is required".to_string(),
            ));
        }
        .map_err(|_| AuthError::Unauthorized)?;

        let credential = self
            .credentials
            .find_by_user_id(user.id)
            .await
            .map_err(|_| AuthError::Unauthorized)?;

        match verify_password(&req.password, &credential.password_hash) {
            Ok(true) => {}
            _ => return Err(AuthError::Unauthorized),
        }

        if !user.is_active {
            return Err(AuthError::Forbidden);
        }

        tracing::info!(user_id = %user.id, "User logged in");
        self.jwt.issue(&user).map_err(AuthError::from)
    }

    /// Exchange a refresh token for a brand-new bundle (both halves rotate).
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenBundle, AuthError> {
        let user = self.user_for_refresh_token(refresh_token).await?;
        self.jwt.issue(&user).map_err(AuthError::from)
    }

    /// Mint a new access token from a refresh token, leaving the caller's
    /// refresh token untouched. Used by the request gate's silent renewal.
    pub async fn refresh_access_token(&self, refresh_token: &str) -> Result<String, AuthError> {
        let user = self.user_for_refresh_token(refresh_token).await?;
        self.jwt.issue_access_token(&user).map_err(AuthError::from)
    }

    /// Verify the refresh token, then confirm the subject still exists and
    /// is active. Verification failures propagate as-is, preserving the
    /// expired/invalid distinction.
    async fn user_for_refresh_token(&self, refresh_token: &str) -> Result<User, AuthError> {
        let claims = self.jwt.verify_refresh_token(refresh_token)?;

        let user = self
            .users
            .find_by_id(claims.sub)
            .await
            .map_err(|_| AuthError::Unauthorized)?;
        if !user.is_active {
            return Err(AuthError::Forbidden);
        }

        Ok(user)
    }

    /// Validate an access token for resource access
    pub fn validate(&self, token: &str) -> Result<Claims, AuthError> {
        self.jwt.verify_access_token(token).map_err(AuthError::from)
    }

    /// Reactivate a user account. Admin only.
    pub async fn activate_user(
        &self,
        target_id: Uuid,
        caller_role: UserRole,
    ) -> Result<User, AuthError> {
        if !caller_role.is_admin() {
            return Err(AuthError::Forbidden);
        }

        let mut user = self.users.find_by_id(target_id).await?;
        user.is_active = true;
        let user = self.users.update(&user).await?;

        tracing::info!(user_id = %user.id, "User activated");
        Ok(user)
    }

    /// Deactivate a user account. Permitted to the account owner or an admin.
    pub async fn deactivate_user(
        &self,
        target_id: Uuid,
        caller_id: Uuid,
        caller_role: UserRole,
    ) -> Result<User, AuthError> {
        if !caller_role.is_admin() && caller_id != target_id {
            return Err(AuthError::Forbidden);
        }

        let mut user = self.users.find_by_id(target_id).await?;
        user.is_active = false;
        let user = self.users.update(&user).await?;

        tracing::info!(user_id = %user.id, "User deactivated");
        Ok(user)
    }

    /// Fetch an identity by id (used by profile handlers)
    pub async fn user_by_id(&self, id: Uuid) -> Result<User, AuthError> {
        self.users.find_by_id(id).await
    }

    /// Access token lifetime in seconds, for `expires_in`
    pub fn access_token_ttl_seconds(&self) -> i64 {
        self.jwt.access_token_ttl_seconds()
    }

    /// Refresh token lifetime, for the refresh cookie max-age
    pub fn refresh_ttl(&self) -> time::Duration {
        self.jwt.refresh_ttl()
    }
}

/// Age gate: calendar-year difference, minus one if the birthday has not
/// yet occurred this year.
fn is_under_age(birth_date: Date) -> bool {
    let today = time::OffsetDateTime::now_utc().date();
    let mut age = today.year() - birth_date.year();
    if today.ordinal() < birth_date.ordinal() {
        age -= 1;
    }
    age < MINIMUM_AGE
}
