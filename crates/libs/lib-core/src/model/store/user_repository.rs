//! # User Repository
//!
//! Provides database access layer for user-related operations.
//!
//! This module implements the repository pattern for user data access,
//! providing a clean abstraction over SQL queries.

use super::models::{User, UserForCreate};
use super::DbPool;
use sqlx::query_as;

/// User repository for database operations.
///
/// Provides methods for creating and retrieving user records.
/// All methods are async and return `Result` types for proper error handling.
pub struct UserRepository;

impl UserRepository {
    /// Find a user by their email address.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(User))` - User found with matching email
    /// * `Ok(None)` - No user found with that email
    /// * `Err(sqlx::Error)` - Database error occurred
    pub async fn find_by_email(pool: &DbPool, email: &str) -> Result<Option<User>, sqlx::Error> {
        query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// Find a user by their username.
    pub async fn find_by_username(pool: &DbPool, username: &str) -> Result<Option<User>, sqlx::Error> {
        query_as::<_, User>("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(pool)
            .await
    }

    /// Find a user by id.
    ///
    /// Used at socket admission time to resolve the connecting identity
    /// (display name, avatar) from the verified credential's subject.
    pub async fn find_by_id(pool: &DbPool, id: i64) -> Result<Option<User>, sqlx::Error> {
        query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Create a new user using `UserForCreate`.
    ///
    /// # Errors
    ///
    /// Returns `sqlx::Error` if:
    /// - Username already exists (UNIQUE constraint violation)
    /// - Email already exists (UNIQUE constraint violation)
    /// - Database connection fails
    pub async fn create_with(pool: &DbPool, user_data: UserForCreate) -> Result<User, sqlx::Error> {
        Self::create(pool, &user_data.username, &user_data.email, &user_data.password_hash).await
    }

    /// Create a new user in the database.
    ///
    /// # Arguments
    ///
    /// * `pool` - Database connection pool
    /// * `username` - The username for the new user (must be unique)
    /// * `email` - The email address for the new user (must be unique)
    /// * `password_hash` - The hashed password (use `lib_auth::hash_password`)
    ///
    /// # Returns
    ///
    /// * `Ok(User)` - The newly created user with generated ID and timestamps
    /// * `Err(sqlx::Error)` - Database error (e.g., constraint violation for duplicate email/username)
    pub async fn create(
        pool: &DbPool,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO users (username, email, password_hash) VALUES (?, ?, ?)"
        )
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .execute(pool)
        .await?;

        let id = result.last_insert_rowid();

        query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_one(pool)
            .await
    }

    /// Update the avatar URL for a user.
    pub async fn set_avatar(pool: &DbPool, id: i64, avatar: &str) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET avatar = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?")
            .bind(avatar)
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Update the last login timestamp for a user.
    ///
    /// # Note
    ///
    /// This method does not verify that the user exists. If the user ID is invalid,
    /// it will succeed but not update any rows.
    pub async fn update_last_login(pool: &DbPool, id: i64) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET last_login = CURRENT_TIMESTAMP WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }
}
