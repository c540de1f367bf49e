use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// User entity representing a complete user record from the database.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub avatar: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
    pub is_active: bool,
}

/// Data structure for creating a new user.
///
/// Contains only the fields required for user creation.
/// Password should be hashed before creating.
#[derive(Debug, Clone)]
pub struct UserForCreate {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

impl UserForCreate {
    /// Create a new `UserForCreate` instance.
    pub fn new(username: String, email: String, password_hash: String) -> Self {
        Self {
            username,
            email,
            password_hash,
        }
    }
}

/// Data structure for appending a message to the room log.
///
/// The store assigns the id; the creation timestamp is stamped here so
/// persistence order and timestamp order agree.
#[derive(Debug, Clone)]
pub struct MessageForCreate {
    pub user: String,
    pub avatar: Option<String>,
    pub text: String,
    pub file_path: Option<String>,
}

impl MessageForCreate {
    /// A plain text message from a named author.
    pub fn text(user: impl Into<String>, avatar: Option<String>, text: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            avatar,
            text: text.into(),
            file_path: None,
        }
    }
}
