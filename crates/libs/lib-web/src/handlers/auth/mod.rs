//! # Authentication Handlers
//!
//! HTTP request handlers for user authentication endpoints.
//!
//! ## Overview
//!
//! This module implements the authentication flow including:
//! - User signup with email/password
//! - User login with email or username
//! - JWT token generation
//!
//! The token returned here is the bearer credential a chat socket presents
//! when it connects.

use axum::{
    extract::{Json, State},
    http::StatusCode,
};
use lib_auth::{encode_jwt, hash_password, verify_password};
use lib_core::model::store::user_repository::UserRepository;
use lib_core::{Config, DbPool};
use shared::dto::{AuthResponse, ErrorResponse, LoginRequest, SignupRequest, UserInfo};
use tracing::{debug, error, info, instrument, warn};

/// Signup handler - creates a new user account.
///
/// # Validation
///
/// - Username must be at least 3 characters
/// - Email must contain '@' symbol
/// - Email and username must be unique
/// - Password must be at least 8 characters (validated in hash_password)
///
/// # Returns
///
/// * `Ok((StatusCode::CREATED, AuthResponse))` - User created, JWT issued
/// * `Err((StatusCode, ErrorResponse))` - Validation error, duplicate user, or server error
#[instrument(skip(pool, config, req), fields(username = %req.username, email = %req.email))]
pub async fn signup(
    State(pool): State<DbPool>,
    State(config): State<Config>,
    Json(req): Json<SignupRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), (StatusCode, Json<ErrorResponse>)> {
    info!("[SIGNUP] new user signup request");

    if req.username.len() < 3 {
        warn!("[SIGNUP] username too short");
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "Username must be at least 3 characters".to_string(),
            }),
        ));
    }

    if !req.email.contains('@') {
        warn!("[SIGNUP] invalid email format");
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "Invalid email format".to_string(),
            }),
        ));
    }

    match UserRepository::find_by_email(&pool, &req.email).await {
        Ok(Some(_)) => {
            warn!("[SIGNUP] email already registered: {}", req.email);
            return Err((
                StatusCode::CONFLICT,
                Json(ErrorResponse {
                    error: "Email already registered".to_string(),
                }),
            ));
        }
        Ok(None) => {}
        Err(e) => {
            error!("[SIGNUP] database error checking email: {}", e);
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Database error".to_string(),
                }),
            ));
        }
    }

    match UserRepository::find_by_username(&pool, &req.username).await {
        Ok(Some(_)) => {
            warn!("[SIGNUP] username already taken: {}", req.username);
            return Err((
                StatusCode::CONFLICT,
                Json(ErrorResponse {
                    error: "Username already taken".to_string(),
                }),
            ));
        }
        Ok(None) => {}
        Err(e) => {
            error!("[SIGNUP] database error checking username: {}", e);
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Database error".to_string(),
                }),
            ));
        }
    }

    // Hash password
    debug!("[SIGNUP] hashing password...");
    let password_hash = match hash_password(&req.password) {
        Ok(hash) => hash,
        Err(e) => {
            warn!("[SIGNUP] password hashing failed: {}", e);
            return Err((StatusCode::BAD_REQUEST, Json(ErrorResponse { error: e })));
        }
    };

    // Create user
    debug!("[SIGNUP] creating user in database...");
    let user = match UserRepository::create(&pool, &req.username, &req.email, &password_hash).await
    {
        Ok(user) => user,
        Err(e) => {
            error!("[SIGNUP] failed to create user: {}", e);
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to create user".to_string(),
                }),
            ));
        }
    };

    // Generate JWT
    debug!("[SIGNUP] generating JWT token...");
    let token = match encode_jwt(
        user.id,
        user.username.clone(),
        &config.jwt_secret,
        config.jwt_expiration_hours,
    ) {
        Ok(token) => token,
        Err(e) => {
            error!("[SIGNUP] JWT encoding failed: {}", e);
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to generate token".to_string(),
                }),
            ));
        }
    };

    info!("[SIGNUP] user created and authenticated: {} (id {})", user.username, user.id);

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: UserInfo {
                id: user.id.to_string(),
                username: user.username.clone(),
                email: user.email,
                avatar: user.avatar,
                created_at: user.created_at.to_string(),
            },
            token,
            message: "Signup successful".to_string(),
        }),
    ))
}

/// Login handler - authenticates existing user.
///
/// # Authentication
///
/// - Accepts either email (contains '@') or username
/// - Verifies password using Argon2
/// - Checks if account is active
/// - Updates last_login timestamp
/// - Generates JWT token with user claims
pub async fn login(
    State(pool): State<DbPool>,
    State(config): State<Config>,
    Json(req): Json<LoginRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), (StatusCode, Json<ErrorResponse>)> {
    info!("[LOGIN] login attempt");
    debug!("[LOGIN] identifier: {}", req.email_or_username);

    // Find user by email or username
    let user = if req.email_or_username.contains('@') {
        UserRepository::find_by_email(&pool, &req.email_or_username).await
    } else {
        UserRepository::find_by_username(&pool, &req.email_or_username).await
    };

    let user = match user {
        Ok(Some(user)) => user,
        Ok(None) => {
            warn!("[LOGIN] user not found: {}", req.email_or_username);
            return Err((
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse {
                    error: "Invalid credentials".to_string(),
                }),
            ));
        }
        Err(e) => {
            error!("[LOGIN] database error: {}", e);
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Database error".to_string(),
                }),
            ));
        }
    };

    // Check if user is active
    if !user.is_active {
        warn!("[LOGIN] account deactivated: {}", user.username);
        return Err((
            StatusCode::FORBIDDEN,
            Json(ErrorResponse {
                error: "Account is deactivated".to_string(),
            }),
        ));
    }

    // Verify password
    let is_valid = match verify_password(&req.password, &user.password_hash) {
        Ok(valid) => valid,
        Err(e) => {
            error!("[LOGIN] password verification error: {}", e);
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Authentication error".to_string(),
                }),
            ));
        }
    };

    if !is_valid {
        warn!("[LOGIN] invalid password for user: {}", user.username);
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                error: "Invalid credentials".to_string(),
            }),
        ));
    }

    // Update last login
    let _ = UserRepository::update_last_login(&pool, user.id).await;

    // Generate JWT
    let token = match encode_jwt(
        user.id,
        user.username.clone(),
        &config.jwt_secret,
        config.jwt_expiration_hours,
    ) {
        Ok(token) => token,
        Err(e) => {
            error!("[LOGIN] JWT encoding failed: {}", e);
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to generate token".to_string(),
                }),
            ));
        }
    };

    info!("[LOGIN] user authenticated: {} (id {})", user.username, user.id);

    Ok((
        StatusCode::OK,
        Json(AuthResponse {
            user: UserInfo {
                id: user.id.to_string(),
                username: user.username.clone(),
                email: user.email,
                avatar: user.avatar,
                created_at: user.created_at.to_string(),
            },
            token,
            message: "Login successful".to_string(),
        }),
    ))
}

#[cfg(test)]
mod tests;
