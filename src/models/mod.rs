pub mod task;
pub mod user;

pub use task::{Tag, TagFilter, TagMode, Task, TaskInput, TaskQuery, TaskRow, TaskUpdate};
pub use user::{NewUser, User, UserInfo};
