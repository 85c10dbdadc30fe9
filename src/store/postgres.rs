use async_trait::async_trait;
use sqlx::migrate::Migrator;
use sqlx::postgres::{PgConnection, PgPool, PgPoolOptions};
use std::collections::HashMap;
use std::time::Duration;

use super::{CredentialStore, TaskStore};
use crate::error::AppError;
use crate::models::{NewUser, Tag, TagFilter, TagMode, Task, TaskInput, TaskRow, User};

const USER_COLUMNS: &str = "id, email, password_hash, role, is_verified";
const TASK_COLUMNS: &str = "t.id, t.title, t.description, t.user_id";

/// Opens a connection pool to `database_url`.
pub async fn connect(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
}

/// Connects and brings the `users` schema up to date.
pub async fn connect_credentials(database_url: &str) -> Result<PgPool, sqlx::Error> {
    let pool = connect(database_url).await?;
    let mut migrator = sqlx::migrate!("./migrations/auth");
    run_shared(&mut migrator, &pool).await?;
    Ok(pool)
}

/// Connects and brings the `tasks`/`tags` schema up to date.
pub async fn connect_tasks(database_url: &str) -> Result<PgPool, sqlx::Error> {
    let pool = connect(database_url).await?;
    let mut migrator = sqlx::migrate!("./migrations/tasks");
    run_shared(&mut migrator, &pool).await?;
    Ok(pool)
}

/// Both services may share one database and therefore one `_sqlx_migrations`
/// table. Versions are unique across `migrations/auth` and `migrations/tasks`,
/// and each migrator skips the versions the other one applied.
async fn run_shared(migrator: &mut Migrator, pool: &PgPool) -> Result<(), sqlx::Error> {
    migrator.set_ignore_missing(true);
    migrator.run(pool).await?;
    Ok(())
}

#[derive(Debug, Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE email = $1",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn insert(&self, new_user: NewUser) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (email, password_hash) VALUES ($1, $2) RETURNING {}",
            USER_COLUMNS
        ))
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::Conflict(_) => AppError::Conflict("User already exists".into()),
            other => other,
        })
    }

    async fn mark_verified(&self, id: i32) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE users SET is_verified = TRUE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("User not found".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct PgTaskStore {
    pool: PgPool,
}

impl PgTaskStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Loads the tags of every task in `rows` with one query and attaches them.
    async fn attach_tags(&self, rows: Vec<TaskRow>) -> Result<Vec<Task>, AppError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i32> = rows.iter().map(|row| row.id).collect();
        let pairs = sqlx::query_as::<_, (i32, String)>(
            "SELECT tt.task_id, g.name FROM task_tags tt \
             JOIN tags g ON g.id = tt.tag_id \
             WHERE tt.task_id = ANY($1) \
             ORDER BY g.id",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_task: HashMap<i32, Vec<String>> = HashMap::new();
        for (task_id, name) in pairs {
            by_task.entry(task_id).or_default().push(name);
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let tags = by_task.remove(&row.id).unwrap_or_default();
                Task::from_row(row, tags)
            })
            .collect())
    }
}

/// Returns the tag called `name`, inserting it first if needed.
///
/// `ON CONFLICT` makes concurrent creators of the same name converge on one row.
pub async fn get_or_create_tag(conn: &mut PgConnection, name: &str) -> Result<Tag, AppError> {
    let tag = sqlx::query_as::<_, Tag>(
        "INSERT INTO tags (name) VALUES ($1) \
         ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name \
         RETURNING id, name",
    )
    .bind(name)
    .fetch_one(&mut *conn)
    .await?;
    Ok(tag)
}

#[async_trait]
impl TaskStore for PgTaskStore {
    async fn list_tasks(
        &self,
        owner: i32,
        filter: Option<&TagFilter>,
    ) -> Result<Vec<Task>, AppError> {
        let rows = match filter {
            None => {
                sqlx::query_as::<_, TaskRow>(&format!(
                    "SELECT {} FROM tasks t WHERE t.user_id = $1 ORDER BY t.id",
                    TASK_COLUMNS
                ))
                .bind(owner)
                .fetch_all(&self.pool)
                .await?
            }
            Some(filter) if filter.mode == TagMode::Any => {
                sqlx::query_as::<_, TaskRow>(&format!(
                    "SELECT {} FROM tasks t \
                     WHERE t.user_id = $1 AND EXISTS ( \
                         SELECT 1 FROM task_tags tt JOIN tags g ON g.id = tt.tag_id \
                         WHERE tt.task_id = t.id AND g.name = ANY($2)) \
                     ORDER BY t.id",
                    TASK_COLUMNS
                ))
                .bind(owner)
                .bind(&filter.names)
                .fetch_all(&self.pool)
                .await?
            }
            Some(filter) => {
                // A task qualifies when it matches as many distinct tags as were requested.
                sqlx::query_as::<_, TaskRow>(&format!(
                    "SELECT {} FROM tasks t \
                     JOIN task_tags tt ON tt.task_id = t.id \
                     JOIN tags g ON g.id = tt.tag_id \
                     WHERE t.user_id = $1 AND g.name = ANY($2) \
                     GROUP BY t.id, t.title, t.description, t.user_id \
                     HAVING COUNT(DISTINCT g.id) = $3 \
                     ORDER BY t.id",
                    TASK_COLUMNS
                ))
                .bind(owner)
                .bind(&filter.names)
                .bind(filter.names.len() as i64)
                .fetch_all(&self.pool)
                .await?
            }
        };

        self.attach_tags(rows).await
    }

    async fn find_task(&self, id: i32, owner: i32) -> Result<Option<Task>, AppError> {
        let row = sqlx::query_as::<_, TaskRow>(&format!(
            "SELECT {} FROM tasks t WHERE t.id = $1 AND t.user_id = $2",
            TASK_COLUMNS
        ))
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(self.attach_tags(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn create_task(&self, owner: i32, input: TaskInput) -> Result<Task, AppError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, TaskRow>(
            "INSERT INTO tasks (title, description, user_id) VALUES ($1, $2, $3) \
             RETURNING id, title, description, user_id",
        )
        .bind(&input.title)
        .bind(&input.description)
        .bind(owner)
        .fetch_one(&mut *tx)
        .await?;

        let mut tags = Vec::with_capacity(input.tag_names.len());
        for name in &input.tag_names {
            let tag = get_or_create_tag(&mut tx, name).await?;
            sqlx::query(
                "INSERT INTO task_tags (task_id, tag_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(row.id)
            .bind(tag.id)
            .execute(&mut *tx)
            .await?;
            tags.push(tag);
        }

        tx.commit().await?;

        tags.sort_by_key(|tag| tag.id);
        tags.dedup_by_key(|tag| tag.id);
        Ok(Task::from_row(
            row,
            tags.into_iter().map(|tag| tag.name).collect(),
        ))
    }

    async fn update_task(
        &self,
        id: i32,
        owner: i32,
        title: &str,
        description: &str,
    ) -> Result<Option<Task>, AppError> {
        let row = sqlx::query_as::<_, TaskRow>(
            "UPDATE tasks SET title = $1, description = $2 \
             WHERE id = $3 AND user_id = $4 \
             RETURNING id, title, description, user_id",
        )
        .bind(title)
        .bind(description)
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(self.attach_tags(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn list_tags(&self) -> Result<Vec<Tag>, AppError> {
        let tags = sqlx::query_as::<_, Tag>("SELECT id, name FROM tags ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(tags)
    }
}
