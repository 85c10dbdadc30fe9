use actix_web::{get, post, web, HttpResponse, Responder};

use crate::{
    auth::{BearerToken, LoginRequest, ResendVerificationRequest, SignupRequest, VerifyQuery},
    error::AppError,
    services::AuthService,
};

/// Register a new user
///
/// Creates an unverified account and mails a verification link.
///
/// ## Responses:
/// - `200 OK`: `{id, email, message}`.
/// - `400 Bad Request`: The email is already registered.
/// - `422 Unprocessable Entity`: Malformed email or empty password.
#[post("/signup")]
pub async fn signup(
    service: web::Data<AuthService>,
    body: web::Json<SignupRequest>,
) -> Result<impl Responder, AppError> {
    let created = service.signup(body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(created))
}

/// Login user
///
/// ## Responses:
/// - `200 OK`: `{access_token, token_type}`.
/// - `401 Unauthorized`: Unknown email or wrong password.
/// - `403 Forbidden`: Correct credentials but the email is not verified.
#[post("/login")]
pub async fn login(
    service: web::Data<AuthService>,
    body: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    let token = service.login(body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(token))
}

/// Verify user email from the link sent at signup.
#[get("/verify")]
pub async fn verify_email(
    service: web::Data<AuthService>,
    query: web::Query<VerifyQuery>,
) -> Result<impl Responder, AppError> {
    let message = service.verify_email(&query.token).await?;
    Ok(HttpResponse::Ok().json(message))
}

/// Get the current user from a session token.
///
/// This is the introspection endpoint the task service delegates to.
#[get("/me")]
pub async fn me(
    service: web::Data<AuthService>,
    token: BearerToken,
) -> Result<impl Responder, AppError> {
    let user = service.introspect(&token.0).await?;
    Ok(HttpResponse::Ok().json(user))
}

/// Send a new verification link to an unverified account.
#[post("/resend-verification")]
pub async fn resend_verification(
    service: web::Data<AuthService>,
    body: web::Json<ResendVerificationRequest>,
) -> Result<impl Responder, AppError> {
    let message = service.resend_verification(body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(message))
}
