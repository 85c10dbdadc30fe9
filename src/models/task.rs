use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A tag shared by all users. Names are unique and never change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Tag {
    pub id: i32,
    pub name: String,
}

/// A task row as stored in the `tasks` table, without its tags.
#[derive(Debug, Clone, FromRow)]
pub struct TaskRow {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub user_id: i32,
}

/// A task as returned by the API, with the names of its tags attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: i32,
    pub title: String,
    pub description: String,
    /// Identifier of the user who owns the task.
    pub user_id: i32,
    pub tags: Vec<String>,
}

impl Task {
    pub fn from_row(row: TaskRow, tags: Vec<String>) -> Self {
        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            user_id: row.user_id,
            tags,
        }
    }
}

/// Body of `POST /tasks`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TaskInput {
    /// Must be between 1 and 200 characters.
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 1000))]
    pub description: String,
    /// Tag names, matched exactly (case-sensitive). Unknown names are created.
    #[serde(default)]
    pub tag_names: Vec<String>,
}

/// Body of `PUT /tasks/{id}`. Tags cannot be changed through an update.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TaskUpdate {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 1000))]
    pub description: String,
}

/// How a multi-tag filter combines its tags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagMode {
    /// The task carries at least one of the requested tags.
    #[default]
    Any,
    /// The task carries every requested tag; extra tags are allowed.
    All,
}

/// Query parameters of `GET /tasks`.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TaskQuery {
    /// Comma-separated tag names.
    pub tags: Option<String>,
    #[serde(default)]
    pub mode: TagMode,
}

impl TaskQuery {
    pub fn tag_filter(&self) -> Option<TagFilter> {
        self.tags
            .as_deref()
            .and_then(|raw| TagFilter::parse(raw, self.mode))
    }
}

/// A parsed tag filter: distinct, non-empty names plus the combination mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagFilter {
    pub names: Vec<String>,
    pub mode: TagMode,
}

impl TagFilter {
    /// Splits `raw` on commas, trimming each entry and dropping blanks and repeats.
    /// Returns `None` when nothing is left, which means "no filter".
    pub fn parse(raw: &str, mode: TagMode) -> Option<Self> {
        let mut names: Vec<String> = Vec::new();
        for name in raw.split(',').map(str::trim).filter(|n| !n.is_empty()) {
            if !names.iter().any(|existing| existing == name) {
                names.push(name.to_string());
            }
        }

        if names.is_empty() {
            None
        } else {
            Some(Self { names, mode })
        }
    }

    /// Whether a task carrying `task_tags` passes the filter.
    pub fn matches(&self, task_tags: &[String]) -> bool {
        let carried = |name: &String| task_tags.iter().any(|t| t == name);
        match self.mode {
            TagMode::Any => self.names.iter().any(carried),
            TagMode::All => self.names.iter().all(carried),
        }
    }
}
