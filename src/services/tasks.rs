use std::sync::Arc;
use validator::Validate;

use crate::error::AppError;
use crate::models::{Tag, Task, TaskInput, TaskQuery, TaskUpdate};
use crate::store::TaskStore;

/// Task CRUD and tag listing for already-identified callers.
///
/// Identity resolution happens before these methods run (see
/// `IdentityMiddleware`); every `owner` argument is a verified user id.
pub struct TaskService {
    store: Arc<dyn TaskStore>,
}

impl TaskService {
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        Self { store }
    }

    pub async fn list_tasks(&self, owner: i32, query: &TaskQuery) -> Result<Vec<Task>, AppError> {
        let filter = query.tag_filter();
        self.store.list_tasks(owner, filter.as_ref()).await
    }

    /// A task owned by another user is reported as not found.
    pub async fn get_task(&self, id: i32, owner: i32) -> Result<Task, AppError> {
        self.store
            .find_task(id, owner)
            .await?
            .ok_or_else(|| AppError::NotFound("Task not found".into()))
    }

    pub async fn create_task(&self, owner: i32, mut input: TaskInput) -> Result<Task, AppError> {
        input.validate()?;
        input.tag_names = normalize_tag_names(input.tag_names)?;

        let task = self.store.create_task(owner, input).await?;
        log::info!("user {} created task {}", owner, task.id);
        Ok(task)
    }

    /// Only title and description change; tags stay as they were.
    pub async fn update_task(
        &self,
        id: i32,
        owner: i32,
        input: TaskUpdate,
    ) -> Result<Task, AppError> {
        input.validate()?;

        self.store
            .update_task(id, owner, &input.title, &input.description)
            .await?
            .ok_or_else(|| AppError::NotFound("Task not found".into()))
    }

    pub async fn list_tags(&self) -> Result<Vec<Tag>, AppError> {
        self.store.list_tags().await
    }
}

/// Width of the `tags.name` column, in characters.
pub const MAX_TAG_NAME_LEN: usize = 255;

/// Drops repeated names, keeping first occurrences. Names are matched exactly,
/// so `Home` and `home` are different tags; blank or overlong names are rejected.
fn normalize_tag_names(names: Vec<String>) -> Result<Vec<String>, AppError> {
    let mut unique: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        if name.trim().is_empty() {
            return Err(AppError::ValidationError("Tag names must not be empty".into()));
        }
        if name.chars().count() > MAX_TAG_NAME_LEN {
            return Err(AppError::ValidationError(format!(
                "Tag names must be at most {} characters",
                MAX_TAG_NAME_LEN
            )));
        }
        if !unique.contains(&name) {
            unique.push(name);
        }
    }
    Ok(unique)
}
