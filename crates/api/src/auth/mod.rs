//! Authentication module for Keystone

pub mod jwt;
pub mod middleware;
pub mod password;
pub mod rbac;
pub mod service;

pub use jwt::{Claims, JwtManager, TokenPurpose};
pub use middleware::{
    optional_auth, require_auth, AuthUser, NEW_ACCESS_TOKEN_HEADER, REFRESH_COOKIE,
    TOKEN_TYPE_HEADER,
};
pub use password::{hash_password, verify_password};
pub use rbac::{require_admin, require_owner, require_owner_or_admin};
pub use service::AuthService;
