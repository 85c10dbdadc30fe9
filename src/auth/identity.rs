//! Identity delegation from the task service to the authentication service.
//!
//! The task service never inspects tokens itself. Every protected request
//! forwards the caller's bearer token to `GET /auth/me` and trusts the
//! `UserInfo` that comes back. Results are not cached between requests.

use async_trait::async_trait;
use reqwest::{header::AUTHORIZATION, StatusCode};
use std::time::Duration;

use crate::error::AppError;
use crate::models::UserInfo;

/// Resolves a bearer token into the caller's identity.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Fails with `Unauthorized` when the token is rejected and with
    /// `ServiceUnavailable` when the identity source cannot be reached.
    async fn introspect(&self, token: &str) -> Result<UserInfo, AppError>;
}

/// HTTP client for the authentication service's introspection endpoint.
///
/// One request per call with a fixed timeout and no retry.
#[derive(Debug, Clone)]
pub struct AuthServiceClient {
    http: reqwest::Client,
    introspect_url: String,
}

impl AuthServiceClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::InternalServerError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            introspect_url: format!("{}/auth/me", base_url.trim_end_matches('/')),
        })
    }

    pub fn introspect_url(&self) -> &str {
        &self.introspect_url
    }
}

#[async_trait]
impl IdentityProvider for AuthServiceClient {
    async fn introspect(&self, token: &str) -> Result<UserInfo, AppError> {
        let response = self
            .http
            .get(&self.introspect_url)
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .send()
            .await
            .map_err(|e| {
                log::error!("introspection request to {} failed: {}", self.introspect_url, e);
                AppError::ServiceUnavailable("Failed to connect to Auth Service".into())
            })?;

        if response.status() != StatusCode::OK {
            log::warn!(
                "auth service rejected token with status {}",
                response.status()
            );
            return Err(AppError::Unauthorized("Invalid token".into()));
        }

        response.json::<UserInfo>().await.map_err(|e| {
            if e.is_timeout() {
                log::error!("introspection response from {} timed out", self.introspect_url);
                AppError::ServiceUnavailable("Failed to connect to Auth Service".into())
            } else {
                log::warn!("unreadable introspection response: {}", e);
                AppError::Unauthorized("Authentication failed".into())
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_introspect_url_normalises_trailing_slash() {
        let client = AuthServiceClient::new("http://auth:8001/", Duration::from_secs(5)).unwrap();
        assert_eq!(client.introspect_url(), "http://auth:8001/auth/me");
    }

    #[actix_rt::test]
    async fn test_connection_refused_is_service_unavailable() {
        // Bind then drop a listener so the port is known to be closed.
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let client = AuthServiceClient::new(
            &format!("http://127.0.0.1:{}", port),
            Duration::from_secs(1),
        )
        .unwrap();

        let err = client.introspect("token").await.unwrap_err();
        assert!(matches!(err, AppError::ServiceUnavailable(_)), "got {:?}", err);
    }
}
