//! # Integration Tests
//!
//! Edge cases and integration tests for the authentication flow.

use super::*;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use lib_auth::decode_jwt;

#[tokio::test]
async fn test_signup_then_login() {
    // Arrange
    let pool = setup_test_db().await;
    let config = test_config();

    // Signup
    let signup_app = test_app(pool.clone(), config.clone());
    let signup_req = SignupRequest {
        username: "testuser".to_string(),
        email: "test@example.com".to_string(),
        password: "TestPassword123!".to_string(),
    };

    let signup_response = signup_app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/signup")
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_string(&signup_req).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(signup_response.status(), StatusCode::CREATED);

    // Login with the same credentials
    let login_app = test_app(pool, config);
    let login_req = LoginRequest {
        email_or_username: "test@example.com".to_string(),
        password: "TestPassword123!".to_string(),
    };

    // Act
    let login_response = login_app
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
    assert_eq!(login_response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_issued_token_verifies_as_socket_credential() {
    // The JWT returned by signup is the bearer credential the chat socket
    // presents; it must decode back to the same identity.
    let pool = setup_test_db().await;
    let config = test_config();

    let signup_req = SignupRequest {
        username: "socketuser".to_string(),
        email: "socket@example.com".to_string(),
        password: "TestPassword123!".to_string(),
    };

    let response = test_app(pool, config.clone())
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/signup")
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_string(&signup_req).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let auth_response: AuthResponse = serde_json::from_slice(&body).unwrap();

    let claims = decode_jwt(&auth_response.token, &config.jwt_secret)
        .expect("issued token should verify");
    assert_eq!(claims.username, "socketuser");
    assert_eq!(claims.sub, auth_response.user.id);
}
