//! Record stores for both services.
//!
//! Each service talks to its store only through these traits, so the backing
//! engine is chosen at startup: Postgres when `DATABASE_URL` is set, otherwise
//! the in-memory implementation.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::error::AppError;
use crate::models::{NewUser, Tag, TagFilter, Task, TaskInput, User};

pub use memory::{MemoryCredentialStore, MemoryTaskStore};
pub use postgres::{PgCredentialStore, PgTaskStore};

/// Persisted user accounts. Emails are unique.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    async fn find_by_id(&self, id: i32) -> Result<Option<User>, AppError>;

    /// Inserts an unverified user with the default role.
    /// Fails with `Conflict` if the email is already registered.
    async fn insert(&self, new_user: NewUser) -> Result<User, AppError>;

    /// Sets `is_verified`. Fails with `NotFound` for an unknown id.
    async fn mark_verified(&self, id: i32) -> Result<(), AppError>;
}

/// Persisted tasks and the global tag set.
///
/// Every task lookup is scoped to an owner: a task owned by someone else is
/// reported exactly like a missing one.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Tasks of `owner` ordered by id, optionally restricted by a tag filter.
    async fn list_tasks(&self, owner: i32, filter: Option<&TagFilter>)
        -> Result<Vec<Task>, AppError>;

    async fn find_task(&self, id: i32, owner: i32) -> Result<Option<Task>, AppError>;

    /// Inserts the task and associates it with each tag in `input.tag_names`,
    /// creating tags that do not exist yet.
    async fn create_task(&self, owner: i32, input: TaskInput) -> Result<Task, AppError>;

    /// Replaces title and description. Returns `None` if `owner` has no such task.
    async fn update_task(
        &self,
        id: i32,
        owner: i32,
        title: &str,
        description: &str,
    ) -> Result<Option<Task>, AppError>;

    async fn list_tags(&self) -> Result<Vec<Tag>, AppError>;
}
