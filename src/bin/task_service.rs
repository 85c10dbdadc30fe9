use actix_web::{middleware::Logger, web, App, HttpServer};
use std::io;
use std::sync::Arc;

use taskboard::auth::{AuthServiceClient, IdentityMiddleware};
use taskboard::config::TaskConfig;
use taskboard::routes::{self, health};
use taskboard::services::TaskService;
use taskboard::store::{postgres, MemoryTaskStore, PgTaskStore, TaskStore};

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = TaskConfig::from_env().map_err(|e| {
        log::error!("invalid configuration: {}", e);
        io::Error::new(io::ErrorKind::InvalidInput, e)
    })?;

    let store: Arc<dyn TaskStore> = match &config.database_url {
        Some(url) => {
            let pool = postgres::connect_tasks(url)
                .await
                .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
            Arc::new(PgTaskStore::new(pool))
        }
        None => {
            log::warn!("DATABASE_URL not set; tasks are kept in memory and lost on restart");
            Arc::new(MemoryTaskStore::default())
        }
    };

    let client = AuthServiceClient::new(&config.auth_service_url, config.auth_timeout)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    log::info!("delegating identity checks to {}", client.introspect_url());
    let identity = IdentityMiddleware::new(Arc::new(client));

    let service = web::Data::new(TaskService::new(store));
    let name = web::Data::new(health::ServiceName("tasks"));
    let frontend_url = config.frontend_url.clone();

    log::info!("Starting task service at {}", config.server.server_url());
    HttpServer::new(move || {
        App::new()
            .app_data(service.clone())
            .app_data(name.clone())
            .wrap(routes::cors(&frontend_url))
            .wrap(Logger::default())
            .service(health::health)
            .configure(routes::tasks_config(identity.clone()))
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await
}
