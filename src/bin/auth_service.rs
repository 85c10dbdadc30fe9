use actix_web::{middleware::Logger, web, App, HttpServer};
use std::io;
use std::sync::Arc;

use taskboard::auth::{LogMailer, TokenIssuer};
use taskboard::config::AuthConfig;
use taskboard::routes::{self, health};
use taskboard::services::AuthService;
use taskboard::store::{postgres, CredentialStore, MemoryCredentialStore, PgCredentialStore};

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AuthConfig::from_env().map_err(|e| {
        log::error!("invalid configuration: {}", e);
        io::Error::new(io::ErrorKind::InvalidInput, e)
    })?;

    let users: Arc<dyn CredentialStore> = match &config.database_url {
        Some(url) => {
            let pool = postgres::connect_credentials(url)
                .await
                .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
            Arc::new(PgCredentialStore::new(pool))
        }
        None => {
            log::warn!("DATABASE_URL not set; accounts are kept in memory and lost on restart");
            Arc::new(MemoryCredentialStore::default())
        }
    };

    let service = web::Data::new(AuthService::new(
        users,
        TokenIssuer::new(&config.jwt),
        Arc::new(LogMailer),
        config.frontend_url.clone(),
    ));
    let name = web::Data::new(health::ServiceName("auth"));
    let frontend_url = config.frontend_url.clone();

    log::info!("Starting auth service at {}", config.server.server_url());
    HttpServer::new(move || {
        App::new()
            .app_data(service.clone())
            .app_data(name.clone())
            .wrap(routes::cors(&frontend_url))
            .wrap(Logger::default())
            .service(health::health)
            .configure(routes::auth_config)
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await
}
