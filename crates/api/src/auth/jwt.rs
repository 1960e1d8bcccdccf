//! JWT token generation and validation
//!
//! Tokens are stateless: validity is determined entirely by the HS256
//! signature and the embedded timestamps. Access and refresh tokens share
//! the signing secret but carry an explicit purpose discriminant, so a
//! refresh token is never accepted where an access token is required.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use keystone_shared::{AuthError, TokenBundle, User, UserRole};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

/// Issuer embedded in every token the core signs
pub const TOKEN_ISSUER: &str = "keystone-api";

/// Refresh tokens live this many times longer than access tokens
pub const REFRESH_TTL_MULTIPLIER: i64 = 7;

/// JWT claims structure for Keystone-issued tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: Uuid,
    /// User role
    pub role: UserRole,
    /// Token purpose (access or refresh)
    pub purpose: TokenPurpose,
    /// Issuer
    pub iss: String,
    /// Issued at
    pub iat: i64,
    /// Not before
    pub nbf: i64,
    /// Expiration
    pub exp: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenPurpose {
    Access,
    Refresh,
}

/// JWT manager for token operations
#[derive(Clone)]
pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl: Duration,
}

impl JwtManager {
    /// Create a new JWT manager
    pub fn new(secret: &str, access_ttl_minutes: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_ttl: Duration::minutes(access_ttl_minutes),
        }
    }

    /// Issue an access/refresh pair for a user.
    ///
    /// The refresh token's expiry is always strictly later than the access
    /// token's: both are stamped from the same instant and the refresh
    /// lifetime is a fixed multiple of the access lifetime.
    pub fn issue(&self, user: &User) -> Result<TokenBundle, JwtError> {
        let now = OffsetDateTime::now_utc();
        let access_token = self.sign(user, now, self.access_ttl, TokenPurpose::Access)?;
        let refresh_token = self.sign(user, now, self.refresh_ttl(), TokenPurpose::Refresh)?;

        Ok(TokenBundle {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.access_token_ttl_seconds(),
        })
    }

    /// Issue only a new access token. Used by silent renewal so the caller's
    /// refresh token is not rotated on every renewed request.
    pub fn issue_access_token(&self, user: &User) -> Result<String, JwtError> {
        let now = OffsetDateTime::now_utc();
        self.sign(user, now, self.access_ttl, TokenPurpose::Access)
    }

    fn sign(
        &self,
        user: &User,
        now: OffsetDateTime,
        ttl: Duration,
        purpose: TokenPurpose,
    ) -> Result<String, JwtError> {
        let claims = Claims {
            sub: user.id,
            role: user.role,
            purpose,
            iss: TOKEN_ISSUER.to_string(),
            iat: now.unix_timestamp(),
            nbf: now.unix_timestamp(),
            exp: (now + ttl).unix_timestamp(),
        };

        // Explicit algorithm prevents algorithm confusion attacks
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| JwtError::Encoding(e.to_string()))
    }

    /// Validate signature and timestamps, without checking purpose.
    ///
    /// Distinguishes `Expired` (well-formed, well-signed, past its expiry)
    /// from `Invalid` (bad signature, malformed structure, wrong algorithm,
    /// empty input). Only `Expired` is eligible for silent renewal.
    pub fn verify(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // No clock-skew leeway: renewal must trigger exactly at expiry
        validation.leeway = 0;
        validation.validate_nbf = true;

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
                _ => JwtError::Invalid,
            })
    }

    /// Validate an access token specifically
    pub fn verify_access_token(&self, token: &str) -> Result<Claims, JwtError> {
        let claims = self.verify(token)?;
        if claims.purpose != TokenPurpose::Access {
            return Err(JwtError::WrongPurpose);
        }
        Ok(claims)
    }

    /// Validate a refresh token specifically
    pub fn verify_refresh_token(&self, token: &str) -> Result<Claims, JwtError> {
        let claims = self.verify(token)?;
        if claims.purpose != TokenPurpose::Refresh {
            return Err(JwtError::WrongPurpose);
        }
        Ok(claims)
    }

    /// Get access token lifetime in seconds
    pub fn access_token_ttl_seconds(&self) -> i64 {
        self.access_ttl.whole_seconds()
    }

    /// Get refresh token lifetime (also the refresh cookie max-age)
    pub fn refresh_ttl(&self) -> Duration {
        self.access_ttl * REFRESH_TTL_MULTIPLIER as i32
    }
}

#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("Token has expired")]
    Expired,
    #[error("Invalid token")]
    Invalid,
    #[error("Wrong token purpose")]
    WrongPurpose,
    #[error("Token encoding failed: {0}")]
    Encoding(String),
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => AuthError::ExpiredToken,
            JwtError::Invalid | JwtError::WrongPurpose => AuthError::InvalidToken,
            JwtError::Encoding(msg) => AuthError::Internal(msg),
        }
    }
}
