use actix_web::{get, post, put, web, HttpResponse, Responder};

use crate::{
    auth::VerifiedUser,
    error::AppError,
    models::{TaskInput, TaskQuery, TaskUpdate},
    services::TaskService,
};

/// Retrieves the caller's tasks.
///
/// ## Query Parameters:
/// - `tags` (optional): Comma-separated tag names.
/// - `mode` (optional): `any` (default) keeps tasks with at least one listed tag,
///   `all` keeps tasks carrying every listed tag.
///
/// ## Responses:
/// - `200 OK`: JSON array of tasks ordered by id.
/// - `401 Unauthorized` / `503 Service Unavailable`: Identity delegation failed.
/// - `403 Forbidden`: The caller's email is not verified.
#[get("")]
pub async fn list_tasks(
    user: VerifiedUser,
    service: web::Data<TaskService>,
    query: web::Query<TaskQuery>,
) -> Result<impl Responder, AppError> {
    let tasks = service.list_tasks(user.id(), &query).await?;
    Ok(HttpResponse::Ok().json(tasks))
}

/// Creates a task owned by the caller, creating unknown tags on the way.
#[post("")]
pub async fn create_task(
    user: VerifiedUser,
    service: web::Data<TaskService>,
    body: web::Json<TaskInput>,
) -> Result<impl Responder, AppError> {
    let task = service.create_task(user.id(), body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(task))
}

/// Retrieves one of the caller's tasks.
///
/// ## Responses:
/// - `404 Not Found`: No such task, or it belongs to another user.
#[get("/{id}")]
pub async fn get_task(
    user: VerifiedUser,
    service: web::Data<TaskService>,
    task_id: web::Path<i32>,
) -> Result<impl Responder, AppError> {
    let task = service.get_task(task_id.into_inner(), user.id()).await?;
    Ok(HttpResponse::Ok().json(task))
}

/// Replaces the title and description of one of the caller's tasks.
#[put("/{id}")]
pub async fn update_task(
    user: VerifiedUser,
    service: web::Data<TaskService>,
    task_id: web::Path<i32>,
    body: web::Json<TaskUpdate>,
) -> Result<impl Responder, AppError> {
    let task = service
        .update_task(task_id.into_inner(), user.id(), body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(task))
}

/// Lists every tag. No authentication is required.
#[get("/tags")]
pub async fn list_tags(service: web::Data<TaskService>) -> Result<impl Responder, AppError> {
    let tags = service.list_tags().await?;
    Ok(HttpResponse::Ok().json(tags))
}
