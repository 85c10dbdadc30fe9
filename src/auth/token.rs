use crate::config::JwtConfig;
use crate::error::AppError;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifetime of an email-verification token.
pub fn verification_ttl() -> Duration {
    Duration::hours(1)
}

/// Distinguishes special-purpose tokens from session tokens.
///
/// Session tokens carry no purpose at all. Every consumer must check this claim
/// before trusting a token, since both kinds share one signing key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenPurpose {
    EmailVerification,
}

/// Represents the claims encoded within a JWT (JSON Web Token).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject: the stringified user id for sessions, the email for verification.
    pub sub: String,
    /// Expiration timestamp (seconds since epoch).
    pub exp: usize,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<TokenPurpose>,
}

impl Claims {
    pub fn session(user_id: i32) -> Self {
        Self {
            sub: user_id.to_string(),
            exp: 0,
            purpose: None,
        }
    }

    pub fn email_verification(email: &str) -> Self {
        Self {
            sub: email.to_string(),
            exp: 0,
            purpose: Some(TokenPurpose::EmailVerification),
        }
    }
}

/// A token that failed signature, format or expiry checks.
#[derive(Debug)]
pub struct InvalidToken(jsonwebtoken::errors::Error);

impl InvalidToken {
    pub fn is_expired(&self) -> bool {
        matches!(
            self.0.kind(),
            jsonwebtoken::errors::ErrorKind::ExpiredSignature
        )
    }
}

impl fmt::Display for InvalidToken {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Invalid token: {:?}", self.0.kind())
    }
}

impl std::error::Error for InvalidToken {}

/// Issues and verifies signed, time-limited bearer tokens.
///
/// Built once at startup from `JwtConfig` and shared by every request handler.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    algorithm: Algorithm,
    session_ttl: Duration,
}

impl TokenIssuer {
    pub fn new(config: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            algorithm: config.algorithm,
            session_ttl: config.access_token_ttl,
        }
    }

    /// Signs `claims` with an expiration of now + `ttl`.
    ///
    /// Any `exp` already present in `claims` is overwritten.
    pub fn issue(&self, mut claims: Claims, ttl: Duration) -> Result<String, AppError> {
        let expiration = Utc::now()
            .checked_add_signed(ttl)
            .ok_or_else(|| AppError::InternalServerError("Token expiry out of range".into()))?
            .timestamp();
        claims.exp = usize::try_from(expiration)
            .map_err(|_| AppError::InternalServerError("Token expiry out of range".into()))?;

        encode(&Header::new(self.algorithm), &claims, &self.encoding)
            .map_err(|e| AppError::InternalServerError(format!("Failed to generate token: {}", e)))
    }

    /// Issues a session token for `user_id` with the configured lifetime.
    pub fn issue_session(&self, user_id: i32) -> Result<String, AppError> {
        self.issue(Claims::session(user_id), self.session_ttl)
    }

    /// Issues a one-hour email-verification token for `email`.
    pub fn issue_verification(&self, email: &str) -> Result<String, AppError> {
        self.issue(Claims::email_verification(email), verification_ttl())
    }

    /// Checks signature, format and expiry, and decodes the claims.
    ///
    /// The purpose and subject are not interpreted here; callers decide what
    /// kind of token they accept.
    pub fn verify(&self, token: &str) -> Result<Claims, InvalidToken> {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;
        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(InvalidToken)
    }
}
