use std::sync::Arc;
use validator::Validate;

use crate::auth::mailer::verification_link;
use crate::auth::{
    hash_password, verify_password, LoginRequest, Mailer, MessageResponse,
    ResendVerificationRequest, SignupRequest, SignupResponse, TokenIssuer, TokenPurpose,
    TokenResponse,
};
use crate::error::AppError;
use crate::models::{NewUser, User, UserInfo};
use crate::store::CredentialStore;

pub const VERIFICATION_SENT: &str = "Verification email sent";
pub const VERIFICATION_NOT_SENT: &str =
    "Account created, but the verification email could not be sent. Request a new one.";
pub const EMAIL_VERIFIED: &str = "Email successfully verified";

/// Signup, login, email verification and token introspection.
///
/// Constructed once at startup and shared by every request handler.
pub struct AuthService {
    users: Arc<dyn CredentialStore>,
    tokens: TokenIssuer,
    mailer: Arc<dyn Mailer>,
    frontend_url: String,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn CredentialStore>,
        tokens: TokenIssuer,
        mailer: Arc<dyn Mailer>,
        frontend_url: impl Into<String>,
    ) -> Self {
        Self {
            users,
            tokens,
            mailer,
            frontend_url: frontend_url.into(),
        }
    }

    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    /// Registers an unverified user and mails a verification link.
    ///
    /// A failed mail does not undo the signup; the account stays unverified
    /// until `resend_verification` succeeds.
    pub async fn signup(&self, req: SignupRequest) -> Result<SignupResponse, AppError> {
        req.validate()?;

        if self.users.find_by_email(&req.email).await?.is_some() {
            return Err(AppError::Conflict("User already exists".into()));
        }

        let password_hash = hash_password(&req.password)?;
        let user = self
            .users
            .insert(NewUser {
                email: req.email,
                password_hash,
            })
            .await?;
        log::info!("user {} signed up", user.id);

        let message = if self.send_verification(&user).await? {
            VERIFICATION_SENT
        } else {
            VERIFICATION_NOT_SENT
        };

        Ok(SignupResponse {
            id: user.id,
            email: user.email,
            message: message.to_string(),
        })
    }

    /// Exchanges correct credentials of a verified user for a session token.
    pub async fn login(&self, req: LoginRequest) -> Result<TokenResponse, AppError> {
        req.validate()?;

        let user = match self.users.find_by_email(&req.email).await? {
            Some(user) if verify_password(&req.password, &user.password_hash) => user,
            _ => return Err(AppError::Unauthorized("Invalid credentials".into())),
        };

        if !user.is_verified {
            return Err(AppError::Forbidden("Email not verified".into()));
        }

        let access_token = self.tokens.issue_session(user.id)?;
        log::info!("user {} logged in", user.id);
        Ok(TokenResponse::bearer(access_token))
    }

    /// Marks the account named by a verification token as verified.
    pub async fn verify_email(&self, token: &str) -> Result<MessageResponse, AppError> {
        let claims = self
            .tokens
            .verify(token)
            .map_err(|_| AppError::BadRequest("Invalid or expired token".into()))?;

        if claims.purpose != Some(TokenPurpose::EmailVerification) {
            return Err(AppError::BadRequest("Invalid token type".into()));
        }
        if claims.sub.is_empty() {
            return Err(AppError::BadRequest("Invalid token".into()));
        }

        let user = self
            .users
            .find_by_email(&claims.sub)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;

        if !user.is_verified {
            self.users.mark_verified(user.id).await?;
            log::info!("user {} verified their email", user.id);
        }

        Ok(MessageResponse::new(EMAIL_VERIFIED))
    }

    /// Resolves a session token into the caller's identity.
    ///
    /// This is what the task service calls through `GET /auth/me`.
    pub async fn introspect(&self, token: &str) -> Result<UserInfo, AppError> {
        let claims = self
            .tokens
            .verify(token)
            .map_err(|e| {
                log::debug!("introspection rejected token: {}", e);
                if e.is_expired() {
                    AppError::Unauthorized("Token has expired".into())
                } else {
                    AppError::Unauthorized("Invalid token".into())
                }
            })?;

        if claims.purpose.is_some() {
            return Err(AppError::Unauthorized("Invalid token type".into()));
        }
        let user_id: i32 = claims
            .sub
            .parse()
            .map_err(|_| AppError::Unauthorized("Invalid token".into()))?;

        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;

        Ok(UserInfo::from(&user))
    }

    /// Issues and mails a fresh verification link to an unverified user.
    pub async fn resend_verification(
        &self,
        req: ResendVerificationRequest,
    ) -> Result<MessageResponse, AppError> {
        req.validate()?;

        let user = self
            .users
            .find_by_email(&req.email)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;

        if user.is_verified {
            return Err(AppError::BadRequest("Email already verified".into()));
        }

        if self.send_verification(&user).await? {
            Ok(MessageResponse::new(VERIFICATION_SENT))
        } else {
            Err(AppError::ServiceUnavailable(
                "Verification email could not be sent".into(),
            ))
        }
    }

    /// Returns whether the mail transport accepted the message.
    async fn send_verification(&self, user: &User) -> Result<bool, AppError> {
        let token = self.tokens.issue_verification(&user.email)?;
        let link = verification_link(&self.frontend_url, &token);

        match self.mailer.send_verification(&user.email, &link).await {
            Ok(()) => Ok(true),
            Err(e) => {
                log::error!("verification email for user {} not sent: {}", user.id, e);
                Ok(false)
            }
        }
    }
}
