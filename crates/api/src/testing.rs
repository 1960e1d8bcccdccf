//! In-memory store doubles and fixtures for tests

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use keystone_shared::{AuthError, NewCredential, NewUser, User, UserCredential, UserRole};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::{AuthService, JwtManager};
use crate::config::Config;
use crate::state::AppState;
use crate::store::{CredentialStore, UserStore};

pub const TEST_JWT_SECRET: &str = "test-jwt-secret-at-least-32-chars!!!";

/// In-memory identity store that records creates and deletes, with an
/// injectable create failure
#[derive(Default)]
pub struct MemUserStore {
    users: Mutex<Vec<User>>,
    created: Mutex<Vec<Uuid>>,
    deleted: Mutex<Vec<Uuid>>,
    create_calls: AtomicUsize,
    fail_next_create: AtomicBool,
}

impl MemUserStore {
    pub fn fail_next_create(&self) {
        self.fail_next_create.store(true, Ordering::SeqCst);
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn created_ids(&self) -> Vec<Uuid> {
        self.created.lock().unwrap().clone()
    }

    pub fn deleted_ids(&self) -> Vec<Uuid> {
        self.deleted.lock().unwrap().clone()
    }

    /// Seed a user directly, bypassing the create bookkeeping
    pub fn insert(&self, user: User) -> User {
        self.users.lock().unwrap().push(user.clone());
        user
    }
}

#[async_trait]
impl UserStore for MemUserStore {
    async fn create(&self, user: NewUser) -> Result<User, AuthError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_next_create.swap(false, Ordering::SeqCst) {
            return Err(AuthError::Database("injected create failure".to_string()));
        }

        let mut users = self.users.lock().unwrap();
        let taken = users.iter().any(|u| {
            (user.username.is_some() && u.username == user.username)
                || (user.email.is_some() && u.email == user.email)
        });
        if taken {
            return Err(AuthError::UserExists);
        }

        let now = OffsetDateTime::now_utc();
        let created = User {
            id: Uuid::new_v4(),
            name: user.name,
            username: user.username,
            email: user.email,
            birth_date: user.birth_date,
            is_active: user.is_active,
            role: user.role,
            created_at: now,
            updated_at: now,
        };
        users.push(created.clone());
        self.created.lock().unwrap().push(created.id);
        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<User, AuthError> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or(AuthError::NotFound)
    }

    async fn find_by_username(&self, username: &str) -> Result<User, AuthError> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.username.as_deref() == Some(username))
            .cloned()
            .ok_or(AuthError::NotFound)
    }

    async fn find_by_email(&self, email: &str) -> Result<User, AuthError> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email.as_deref() == Some(email))
            .cloned()
            .ok_or(AuthError::NotFound)
    }

    async fn update(&self, user: &User) -> Result<User, AuthError> {
        let mut users = self.users.lock().unwrap();
        let existing = users
            .iter_mut()
            .find(|u| u.id == user.id)
            .ok_or(AuthError::NotFound)?;
        *existing = User {
            updated_at: OffsetDateTime::now_utc(),
            ..user.clone()
        };
        Ok(existing.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<(), AuthError> {
        let mut users = self.users.lock().unwrap();
        let before = users.len();
        users.retain(|u| u.id != id);
        if users.len() == before {
            return Err(AuthError::NotFound);
        }
        self.deleted.lock().unwrap().push(id);
        Ok(())
    }
}

/// In-memory credential store with an injectable create failure
#[derive(Default)]
pub struct MemCredentialStore {
    credentials: Mutex<Vec<UserCredential>>,
    fail_next_create: AtomicBool,
}

impl MemCredentialStore {
    pub fn fail_next_create(&self) {
        self.fail_next_create.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl CredentialStore for MemCredentialStore {
    async fn create(&self, credential: NewCredential) -> Result<UserCredential, AuthError> {
        if self.fail_next_create.swap(false, Ordering::SeqCst) {
            return Err(AuthError::Database("injected create failure".to_string()));
        }

        let mut credentials = self.credentials.lock().unwrap();
        if credentials.iter().any(|c| c.user_id == credential.user_id) {
            return Err(AuthError::UserExists);
        }

        let now = OffsetDateTime::now_utc();
        let created = UserCredential {
            id: Uuid::new_v4(),
            user_id: credential.user_id,
            password_hash: credential.password_hash,
            created_at: now,
            updated_at: now,
        };
        credentials.push(created.clone());
        Ok(created)
    }

    async fn find_by_user_id(&self, user_id: Uuid) -> Result<UserCredential, AuthError> {
        self.credentials
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.user_id == user_id)
            .cloned()
            .ok_or(AuthError::NotFound)
    }

    async fn update_password(&self, user_id: Uuid, password_hash: &str) -> Result<(), AuthError> {
        let mut credentials = self.credentials.lock().unwrap();
        let existing = credentials
            .iter_mut()
            .find(|c| c.user_id == user_id)
            .ok_or(AuthError::NotFound)?;
        existing.password_hash = password_hash.to_string();
        existing.updated_at = OffsetDateTime::now_utc();
        Ok(())
    }

    async fn delete(&self, user_id: Uuid) -> Result<(), AuthError> {
        self.credentials
            .lock()
            .unwrap()
            .retain(|c| c.user_id != user_id);
        Ok(())
    }
}

/// A plain active user fixture
pub fn test_user() -> User {
    let now = OffsetDateTime::now_utc();
    User {
        id: Uuid::new_v4(),
        name: "Test User".to_string(),
        username: Some("testuser".to_string()),
        email: None,
        birth_date: None,
        is_active: true,
        role: UserRole::User,
        created_at: now,
        updated_at: now,
    }
}

/// An admin fixture
pub fn test_admin() -> User {
    User {
        name: "Test Admin".to_string(),
        username: Some("testadmin".to_string()),
        role: UserRole::Admin,
        ..test_user()
    }
}

/// An auth service over fresh in-memory stores, 15-minute access tokens
pub fn test_service() -> (AuthService, Arc<MemUserStore>, Arc<MemCredentialStore>) {
    let users = Arc::new(MemUserStore::default());
    let credentials = Arc::new(MemCredentialStore::default());
    let jwt = JwtManager::new(TEST_JWT_SECRET, 15);
    let service = AuthService::new(users.clone(), credentials.clone(), jwt);
    (service, users, credentials)
}

/// Router-level state over in-memory stores
pub fn test_state() -> (AppState, Arc<MemUserStore>, Arc<MemCredentialStore>) {
    let (auth, users, credentials) = test_service();
    let config = Config {
        bind_address: "127.0.0.1:0".to_string(),
        database_url: "postgres://unused".to_string(),
        database_max_connections: 1,
        jwt_secret: TEST_JWT_SECRET.to_string(),
        access_token_ttl_minutes: 15,
    };
    (AppState::from_parts(config, auth), users, credentials)
}
