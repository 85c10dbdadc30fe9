pub mod extractors;
pub mod identity;
pub mod mailer;
pub mod middleware;
pub mod password;
pub mod token;

use serde::{Deserialize, Serialize};
use validator::Validate;

pub use extractors::{BearerToken, VerifiedUser};
pub use identity::{AuthServiceClient, IdentityProvider};
pub use mailer::{LogMailer, MailError, Mailer};
pub use middleware::IdentityMiddleware;
pub use password::{hash_password, validate_password_bytes, verify_password};
pub use token::{Claims, InvalidToken, TokenIssuer, TokenPurpose};

/// Represents the payload for a new user signup request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SignupRequest {
    /// Must be a valid email format.
    #[validate(email)]
    pub email: String,
    /// Non-empty and at most 72 bytes, the most bcrypt hashes.
    #[validate(length(min = 1), custom = "validate_password_bytes")]
    pub password: String,
}

/// Represents the payload for a user login request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Payload for asking for a fresh verification email.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ResendVerificationRequest {
    #[validate(email)]
    pub email: String,
}

/// Query string of `GET /auth/verify`.
#[derive(Debug, Deserialize)]
pub struct VerifyQuery {
    pub token: String,
}

/// Response to a successful signup.
#[derive(Debug, Serialize, Deserialize)]
pub struct SignupResponse {
    pub id: i32,
    pub email: String,
    pub message: String,
}

/// Response to a successful login.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

impl TokenResponse {
    pub fn bearer(access_token: String) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_string(),
        }
    }
}

/// A plain `{ "message": ... }` response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
