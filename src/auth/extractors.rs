use actix_web::dev::Payload;
use actix_web::http::header::{HeaderMap, AUTHORIZATION};
use actix_web::{Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use std::future::{ready, Ready};

use crate::error::AppError;
use crate::models::UserInfo;

/// Pulls the token out of an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Missing or invalid authorization header".into()))
}

/// The raw bearer token of the request.
///
/// Rejects the request with `AppError::Unauthorized` when the header is absent
/// or does not use the `Bearer` scheme.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

impl FromRequest for BearerToken {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(
            bearer_token(req.headers())
                .map(|token| BearerToken(token.to_string()))
                .map_err(Into::into),
        )
    }
}

/// The caller's identity as resolved by `IdentityMiddleware`, required to
/// have a verified email. Unverified callers get 403.
///
/// Only usable on routes wrapped by that middleware; elsewhere the identity is
/// missing from the request extensions and extraction fails with 401.
#[derive(Debug, Clone)]
pub struct VerifiedUser(pub UserInfo);

impl VerifiedUser {
    pub fn id(&self) -> i32 {
        self.0.id
    }
}

impl FromRequest for VerifiedUser {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let result = match req.extensions().get::<UserInfo>() {
            Some(user) if user.is_verified => Ok(VerifiedUser(user.clone())),
            Some(_) => Err(AppError::Forbidden("Email not verified".into())),
            None => Err(AppError::Unauthorized(
                "Identity not found in request. Ensure IdentityMiddleware is active.".into(),
            )),
        };
        ready(result.map_err(Into::into))
    }
}
