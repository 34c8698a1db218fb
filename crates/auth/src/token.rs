//! Session token issuance and validation (HS256 JWT).
//!
//! The service is a pure function of (secret, clock, input): it holds no
//! mutable state and can be shared freely across request tasks.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use thiserror::Error;
use uuid::Uuid;

use fieldops_core::{OrganizationId, UserId};

use crate::claims::{Claims, TokenKind};

/// Access token lifetime in seconds.
pub const ACCESS_TOKEN_TTL_SECS: i64 = 900;

/// Refresh token lifetime in days.
pub const REFRESH_TOKEN_TTL_DAYS: i64 = 7;

const ALGORITHM: Algorithm = Algorithm::HS256;

/// Why a presented token was rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token is malformed")]
    Malformed,

    #[error("token signature is invalid")]
    SignatureInvalid,

    #[error("token has expired")]
    Expired,

    #[error("expected {expected} token, got {found} token")]
    WrongType { expected: TokenKind, found: TokenKind },
}

/// Signing failed. Indicates a misconfigured key, never a transient condition.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("failed to sign token: {0}")]
pub struct SigningError(pub String);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenConfigError {
    #[error("token signing secret must not be empty")]
    EmptySecret,
}

/// Source of "now" for issuance and expiry checks.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at a single instant (tests, replay).
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Explicit token configuration injected into [`TokenService`].
///
/// Lifetimes are fixed at [`ACCESS_TOKEN_TTL_SECS`] and
/// [`REFRESH_TOKEN_TTL_DAYS`]; only the secret varies per deployment.
#[derive(Clone)]
pub struct TokenConfig {
    secret: Vec<u8>,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenConfig {
    pub fn new(secret: impl Into<Vec<u8>>) -> Result<Self, TokenConfigError> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(TokenConfigError::EmptySecret);
        }
        Ok(Self {
            secret,
            access_ttl: Duration::seconds(ACCESS_TOKEN_TTL_SECS),
            refresh_ttl: Duration::days(REFRESH_TOKEN_TTL_DAYS),
        })
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    pub fn ttl_for(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        }
    }
}

impl std::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("secret", &"[REDACTED]")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish()
    }
}

/// Freshly issued access + refresh tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Issues and validates signed session tokens.
#[derive(Clone)]
pub struct TokenService {
    config: TokenConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("config", &self.config)
            .field("algorithm", &ALGORITHM)
            .finish()
    }
}

impl TokenService {
    pub fn new(config: TokenConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: TokenConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(&config.secret),
            decoding_key: DecodingKey::from_secret(&config.secret),
            config,
            clock,
        }
    }

    pub fn config(&self) -> &TokenConfig {
        &self.config
    }

    /// Current time according to the injected clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Access token lifetime in whole seconds (the `expires_in` of responses).
    pub fn access_expires_in(&self) -> i64 {
        self.config.access_ttl.num_seconds()
    }

    pub fn generate_access_token(
        &self,
        user_id: UserId,
        organization_id: OrganizationId,
        email: &str,
        role: &str,
    ) -> Result<String, SigningError> {
        self.generate(TokenKind::Access, user_id, organization_id, email, role)
    }

    pub fn generate_refresh_token(
        &self,
        user_id: UserId,
        organization_id: OrganizationId,
        email: &str,
        role: &str,
    ) -> Result<String, SigningError> {
        self.generate(TokenKind::Refresh, user_id, organization_id, email, role)
    }

    pub fn generate_token_pair(
        &self,
        user_id: UserId,
        organization_id: OrganizationId,
        email: &str,
        role: &str,
    ) -> Result<IssuedPair, SigningError> {
        Ok(IssuedPair {
            access_token: self.generate_access_token(user_id, organization_id, email, role)?,
            refresh_token: self.generate_refresh_token(user_id, organization_id, email, role)?,
        })
    }

    fn generate(
        &self,
        kind: TokenKind,
        user_id: UserId,
        organization_id: OrganizationId,
        email: &str,
        role: &str,
    ) -> Result<String, SigningError> {
        let now = self.clock.now();
        let claims = Claims {
            user_id,
            organization_id,
            email: email.to_string(),
            role: role.to_string(),
            token_type: kind,
            iat: now.timestamp(),
            exp: (now + self.config.ttl_for(kind)).timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::new(ALGORITHM), &claims, &self.encoding_key)
            .map_err(|e| SigningError(e.to_string()))
    }

    /// Verify signature, algorithm and expiry; return the embedded claims.
    ///
    /// Only HS256 is accepted. A header naming another known algorithm is
    /// `SignatureInvalid`; `none` does not parse as a header and is `Malformed`.
    pub fn validate_token(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(ALGORITHM);
        validation.algorithms = vec![ALGORITHM];
        // Expiry is checked below against the injected clock, with zero leeway.
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::InvalidSignature
                | ErrorKind::InvalidAlgorithm
                | ErrorKind::InvalidAlgorithmName
                | ErrorKind::MissingAlgorithm => TokenError::SignatureInvalid,
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed,
            }
        })?;

        let claims = data.claims;
        if claims.exp <= self.clock.now().timestamp() {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }

    /// Validate and require the given token kind.
    pub fn validate_kind(&self, token: &str, expected: TokenKind) -> Result<Claims, TokenError> {
        let claims = self.validate_token(token)?;
        if claims.token_type != expected {
            return Err(TokenError::WrongType {
                expected,
                found: claims.token_type,
            });
        }
        Ok(claims)
    }

    pub fn validate_access_token(&self, token: &str) -> Result<Claims, TokenError> {
        self.validate_kind(token, TokenKind::Access)
    }

    pub fn validate_refresh_token(&self, token: &str) -> Result<Claims, TokenError> {
        self.validate_kind(token, TokenKind::Refresh)
    }
}
