//! PostgreSQL-backed store implementations

use async_trait::async_trait;
use keystone_shared::{AuthError, NewCredential, NewUser, User, UserCredential};
use sqlx::PgPool;
use uuid::Uuid;

use super::{CredentialStore, UserStore};

/// Identity store backed by the `users` table
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, user: NewUser) -> Result<User, AuthError> {
        let created = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, name, username, email, birth_date, is_active, role, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, NOW(), NOW())
            RETURNING id, name, username, email, birth_date, is_active, role, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&user.name)
        .bind(&user.username)
        .bind(&user.email)
        .bind(user.birth_date)
        .bind(user.is_active)
        .bind(user.role)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<User, AuthError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, username, email, birth_date, is_active, role, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> Result<User, AuthError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, username, email, birth_date, is_active, role, created_at, updated_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<User, AuthError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, username, email, birth_date, is_active, role, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn update(&self, user: &User) -> Result<User, AuthError> {
        let updated = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET name = $2, username = $3, email = $4, birth_date = $5,
                is_active = $6, role = $7, updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, username, email, birth_date, is_active, role, created_at, updated_at
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.username)
        .bind(&user.email)
        .bind(user.birth_date)
        .bind(user.is_active)
        .bind(user.role)
        .fetch_one(&self.pool)
        .await?;

        Ok(updated)
    }

    async fn delete(&self, id: Uuid) -> Result<(), AuthError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AuthError::from)?;

        if result.rows_affected() == 0 {
            return Err(AuthError::NotFound);
        }

        Ok(())
    }
}

/// Credential store backed by the `user_credentials` table
#[derive(Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn create(&self, credential: NewCredential) -> Result<UserCredential, AuthError> {
        let created = sqlx::query_as::<_, UserCredential>(
            r#"
            INSERT INTO user_credentials (id, user_id, password_hash, created_at, updated_at)
            VALUES ($1, $2, $3, NOW(), NOW())
            RETURNING id, user_id, password_hash, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(credential.user_id)
        .bind(&credential.password_hash)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn find_by_user_id(&self, user_id: Uuid) -> Result<UserCredential, AuthError> {
        let credential = sqlx::query_as::<_, UserCredential>(
            r#"
            SELECT id, user_id, password_hash, created_at, updated_at
            FROM user_credentials
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(credential)
    }

    async fn update_password(&self, user_id: Uuid, password_hash: &str) -> Result<(), AuthError> {
        let result = sqlx::query(
            r#"
            UPDATE user_credentials
            SET password_hash = $2, updated_at = NOW()
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .bind(password_hash)
        .execute(&self.pool)
        .await
        .map_err(AuthError::from)?;

        if result.rows_affected() == 0 {
            return Err(AuthError::NotFound);
        }

        Ok(())
    }

    async fn delete(&self, user_id: Uuid) -> Result<(), AuthError> {
        sqlx::query("DELETE FROM user_credentials WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(AuthError::from)?;

        Ok(())
    }
}
