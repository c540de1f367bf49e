//! # Login Tests
//!
//! Tests for user login functionality.

use super::*;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use lib_auth::hash_password;
use lib_core::model::store::user_repository::UserRepository;

#[tokio::test]
async fn test_login_success_with_email() {
    // Arrange
    let pool = setup_test_db().await;
    let config = test_config();

    let password = "TestPassword123!";
    let password_hash = hash_password(password)
        .expect("Password hashing should succeed in test");
    UserRepository::create(&pool, "testuser", "test@example.com", &password_hash)
        .await
        .expect("User creation should succeed in test");

    let app = test_app(pool, config);

    let login_req = LoginRequest {
        email_or_username: "test@example.com".to_string(),
        password: password.to_string(),
    };

    // Act
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/login")
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_string(&login_req).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let auth_response: AuthResponse = serde_json::from_slice(&body).unwrap();

    assert_eq!(auth_response.user.username, "testuser");
    assert_eq!(auth_response.user.email, "test@example.com");
    assert_eq!(auth_response.message, "Login successful");
    assert!(!auth_response.token.is_empty());
}

#[tokio::test]
async fn test_login_success_with_username() {
    let pool = setup_test_db().await;
    let config = test_config();

    let password = "TestPassword123!";
    let password_hash = hash_password(password).unwrap();
    UserRepository::create(&pool, "testuser", "test@example.com", &password_hash)
        .await
        .unwrap();

    let app = test_app(pool, config);

    let login_req = LoginRequest {
        email_or_username: "testuser".to_string(),
        password: password.to_string(),
    };

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/login")
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_string(&login_req).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_login_wrong_password() {
    let pool = setup_test_db().await;
    let config = test_config();

    let password_hash = hash_password("CorrectPassword123!").unwrap();
    UserRepository::create(&pool, "testuser", "test@example.com", &password_hash)
        .await
        .unwrap();

    let app = test_app(pool, config);

    let login_req = LoginRequest {
        email_or_username: "testuser".to_string(),
        password: "WrongPassword123!".to_string(),
    };

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/login")
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_string(&login_req).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_unknown_user() {
    let pool = setup_test_db().await;
    let config = test_config();
    let app = test_app(pool, config);

    let login_req = LoginRequest {
        email_or_username: "ghost".to_string(),
        password: "TestPassword123!".to_string(),
    };

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/login")
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_string(&login_req).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
