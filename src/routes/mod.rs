pub mod auth;
pub mod health;
pub mod tasks;

use actix_cors::Cors;
use actix_web::web;

use crate::auth::IdentityMiddleware;

/// Routes of the authentication service.
pub fn auth_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .service(auth::signup)
            .service(auth::login)
            .service(auth::verify_email)
            .service(auth::me)
            .service(auth::resend_verification),
    );
}

/// Routes of the task service. Everything under `/tasks` resolves the caller
/// through `identity`; `/tags` is public.
pub fn tasks_config(identity: IdentityMiddleware) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        cfg.service(tasks::list_tags).service(
            web::scope("/tasks")
                .wrap(identity)
                .service(tasks::list_tasks)
                .service(tasks::create_task)
                .service(tasks::get_task)
                .service(tasks::update_task),
        );
    }
}

/// CORS policy for the browser frontend served from `frontend_url`.
pub fn cors(frontend_url: &str) -> Cors {
    Cors::default()
        .allowed_origin(frontend_url.trim_end_matches('/'))
        .allow_any_method()
        .allow_any_header()
        .max_age(3600)
}
