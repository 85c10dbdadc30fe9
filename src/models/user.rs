use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const DEFAULT_ROLE: &str = "user";

/// A stored account. Owned by the authentication service.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i32,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub is_verified: bool,
}

/// Fields needed to insert a user; everything else takes its default.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
}

/// The identity payload returned by `/auth/me`.
///
/// The task service deserializes this from the introspection response and
/// trusts it for the rest of the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: i32,
    pub email: String,
    pub is_verified: bool,
    pub role: String,
}

impl From<&User> for UserInfo {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            is_verified: user.is_verified,
            role: user.role.clone(),
        }
    }
}
