use actix_web::{get, web, HttpResponse, Responder};
use chrono::Utc;
use serde_json::json;

/// Name reported by the health endpoint, registered as app data by each binary.
#[derive(Debug, Clone, Copy)]
pub struct ServiceName(pub &'static str);

/// Health check endpoint
///
/// Returns the current status of the service and timestamp.
#[get("/health")]
pub async fn health(name: Option<web::Data<ServiceName>>) -> impl Responder {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "service": name.map(|n| n.0),
        "timestamp": Utc::now()
    }))
}
