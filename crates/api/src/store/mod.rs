//! Persistence interfaces for identities and credentials
//!
//! The auth core consumes these traits, never a concrete database. A
//! lookup miss is `AuthError::NotFound`, distinct from other store
//! failures; a unique-constraint conflict is `AuthError::UserExists` and
//! is authoritative when concurrent registrations race on the same
//! username or email.

pub mod postgres;

pub use postgres::{PgCredentialStore, PgUserStore};

use async_trait::async_trait;
use keystone_shared::{AuthError, NewCredential, NewUser, User, UserCredential};
use uuid::Uuid;

/// Store for identity records
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create(&self, user: NewUser) -> Result<User, AuthError>;
    async fn find_by_id(&self, id: Uuid) -> Result<User, AuthError>;
    async fn find_by_username(&self, username: &str) -> Result<User, AuthError>;
    async fn find_by_email(&self, email: &str) -> Result<User, AuthError>;
    async fn update(&self, user: &User) -> Result<User, AuthError>;
    async fn delete(&self, id: Uuid) -> Result<(), AuthError>;
}

/// Store for password-credential records (one-to-one with identities)
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn create(&self, credential: NewCredential) -> Result<UserCredential, AuthError>;
    async fn find_by_user_id(&self, user_id: Uuid) -> Result<UserCredential, AuthError>;
    async fn update_password(&self, user_id: Uuid, password_hash: &str) -> Result<(), AuthError>;
    async fn delete(&self, user_id: Uuid) -> Result<(), AuthError>;
}
