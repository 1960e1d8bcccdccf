//! Shared application state

use std::sync::Arc;

use sqlx::PgPool;

use crate::auth::{AuthService, JwtManager};
use crate::config::Config;
use crate::store::{PgCredentialStore, PgUserStore};

/// State handed to every handler and middleware. Cheap to clone; nothing in
/// it is mutated after startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub auth: AuthService,
}

impl AppState {
    /// Build the production state: Postgres-backed stores and a JWT manager
    /// keyed with the configured secret.
    pub fn new(config: Config, pool: PgPool) -> Self {
        let jwt = JwtManager::new(&config.jwt_secret, config.access_token_ttl_minutes);
        let users = Arc::new(PgUserStore::new(pool.clone()));
        let credentials = Arc::new(PgCredentialStore::new(pool));
        let auth = AuthService::new(users, credentials, jwt);

        Self {
            config: Arc::new(config),
            auth,
        }
    }

    /// Build state from an already-assembled service (used by tests with
    /// in-memory stores).
    pub fn from_parts(config: Config, auth: AuthService) -> Self {
        Self {
            config: Arc::new(config),
            auth,
        }
    }
}
