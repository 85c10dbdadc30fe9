//! In-process stores with the same observable behaviour as the Postgres ones.
//!
//! Ids are assigned sequentially from 1. Data lives only as long as the process.

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{CredentialStore, TaskStore};
use crate::error::AppError;
use crate::models::user::DEFAULT_ROLE;
use crate::models::{NewUser, Tag, TagFilter, Task, TaskInput, TaskRow, User};

#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    users: RwLock<Vec<User>>,
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<User>, AppError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn insert(&self, new_user: NewUser) -> Result<User, AppError> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.email == new_user.email) {
            return Err(AppError::Conflict("User already exists".into()));
        }

        let user = User {
            id: users.len() as i32 + 1,
            email: new_user.email,
            password_hash: new_user.password_hash,
            role: DEFAULT_ROLE.to_string(),
            is_verified: false,
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn mark_verified(&self, id: i32) -> Result<(), AppError> {
        let mut users = self.users.write().await;
        match users.iter_mut().find(|u| u.id == id) {
            Some(user) => {
                user.is_verified = true;
                Ok(())
            }
            None => Err(AppError::NotFound("User not found".into())),
        }
    }
}

#[derive(Debug, Default)]
struct TaskTables {
    tasks: Vec<TaskRow>,
    tags: Vec<Tag>,
    /// (task_id, tag_id) pairs.
    task_tags: Vec<(i32, i32)>,
}

impl TaskTables {
    fn get_or_create_tag(&mut self, name: &str) -> Tag {
        if let Some(tag) = self.tags.iter().find(|t| t.name == name) {
            return tag.clone();
        }
        let tag = Tag {
            id: self.tags.len() as i32 + 1,
            name: name.to_string(),
        };
        self.tags.push(tag.clone());
        tag
    }

    fn tag_names(&self, task_id: i32) -> Vec<String> {
        // Tags are stored in id order, matching the Postgres store's ORDER BY.
        self.tags
            .iter()
            .filter(|tag| self.task_tags.contains(&(task_id, tag.id)))
            .map(|tag| tag.name.clone())
            .collect()
    }

    fn assemble(&self, row: &TaskRow) -> Task {
        Task::from_row(row.clone(), self.tag_names(row.id))
    }
}

#[derive(Debug, Default)]
pub struct MemoryTaskStore {
    tables: RwLock<TaskTables>,
}

#[async_trait]
impl TaskStore for MemoryTaskStore {
    async fn list_tasks(
        &self,
        owner: i32,
        filter: Option<&TagFilter>,
    ) -> Result<Vec<Task>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .tasks
            .iter()
            .filter(|row| row.user_id == owner)
            .map(|row| tables.assemble(row))
            .filter(|task| filter.map_or(true, |f| f.matches(&task.tags)))
            .collect())
    }

    async fn find_task(&self, id: i32, owner: i32) -> Result<Option<Task>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .tasks
            .iter()
            .find(|row| row.id == id && row.user_id == owner)
            .map(|row| tables.assemble(row)))
    }

    async fn create_task(&self, owner: i32, input: TaskInput) -> Result<Task, AppError> {
        let mut tables = self.tables.write().await;

        let row = TaskRow {
            id: tables.tasks.len() as i32 + 1,
            title: input.title,
            description: input.description,
            user_id: owner,
        };
        for name in &input.tag_names {
            let tag = tables.get_or_create_tag(name);
            if !tables.task_tags.contains(&(row.id, tag.id)) {
                tables.task_tags.push((row.id, tag.id));
            }
        }
        tables.tasks.push(row.clone());

        Ok(tables.assemble(&row))
    }

    async fn update_task(
        &self,
        id: i32,
        owner: i32,
        title: &str,
        description: &str,
    ) -> Result<Option<Task>, AppError> {
        let mut tables = self.tables.write().await;
        let row = match tables
            .tasks
            .iter_mut()
            .find(|row| row.id == id && row.user_id == owner)
        {
            Some(row) => {
                row.title = title.to_string();
                row.description = description.to_string();
                row.clone()
            }
            None => return Ok(None),
        };
        Ok(Some(tables.assemble(&row)))
    }

    async fn list_tags(&self) -> Result<Vec<Tag>, AppError> {
        Ok(self.tables.read().await.tags.clone())
    }
}
