#![allow(dead_code)]

use actix_web::dev::ServerHandle;
use actix_web::{web, App, HttpServer};
use async_trait::async_trait;
use chrono::Duration;
use jsonwebtoken::Algorithm;
use std::collections::HashMap;
use std::net::TcpListener;
use std::sync::{Arc, Mutex};

use taskboard::auth::{IdentityProvider, MailError, Mailer, TokenIssuer};
use taskboard::config::JwtConfig;
use taskboard::models::UserInfo;
use taskboard::routes;
use taskboard::services::AuthService;
use taskboard::store::MemoryCredentialStore;
use taskboard::AppError;

pub const FRONTEND_URL: &str = "http://localhost:5173";

/// Keeps every verification link instead of sending it.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingMailer {
    /// Token from the most recent link mailed to `email`.
    pub fn token_for(&self, email: &str) -> Option<String> {
        let sent = self.sent.lock().unwrap();
        sent.iter()
            .rev()
            .find(|(to, _)| to == email)
            .and_then(|(_, link)| link.split("token=").nth(1))
            .map(str::to_string)
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_verification(&self, email: &str, link: &str) -> Result<(), MailError> {
        self.sent
            .lock()
            .unwrap()
            .push((email.to_string(), link.to_string()));
        Ok(())
    }
}

pub fn token_issuer() -> TokenIssuer {
    TokenIssuer::new(&JwtConfig {
        secret: "integration-test-secret".to_string(),
        algorithm: Algorithm::HS256,
        access_token_ttl: Duration::minutes(30),
    })
}

/// An auth service over an empty in-memory store.
pub fn auth_service() -> (web::Data<AuthService>, Arc<RecordingMailer>) {
    let mailer = Arc::new(RecordingMailer::default());
    let service = AuthService::new(
        Arc::new(MemoryCredentialStore::default()),
        token_issuer(),
        mailer.clone(),
        FRONTEND_URL,
    );
    (web::Data::new(service), mailer)
}

/// Resolves a fixed set of tokens; anything else is unauthorized.
pub struct StaticIdentity {
    users: HashMap<String, UserInfo>,
}

impl StaticIdentity {
    pub fn new(users: &[(&str, i32, bool)]) -> Self {
        let users = users
            .iter()
            .map(|(token, id, is_verified)| {
                (
                    token.to_string(),
                    UserInfo {
                        id: *id,
                        email: format!("{}@x.com", token),
                        is_verified: *is_verified,
                        role: "user".to_string(),
                    },
                )
            })
            .collect();
        Self { users }
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentity {
    async fn introspect(&self, token: &str) -> Result<UserInfo, AppError> {
        self.users
            .get(token)
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("Invalid token".into()))
    }
}

/// Runs the auth routes on an ephemeral port. Returns the base URL.
pub fn spawn_auth_server(service: web::Data<AuthService>) -> (String, ServerHandle) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind ephemeral port");
    let port = listener.local_addr().unwrap().port();

    let server = HttpServer::new(move || {
        App::new()
            .app_data(service.clone())
            .configure(routes::auth_config)
    })
    .workers(1)
    .listen(listener)
    .expect("Failed to listen")
    .run();

    let handle = server.handle();
    actix_rt::spawn(server);
    (format!("http://127.0.0.1:{}", port), handle)
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token))
}
