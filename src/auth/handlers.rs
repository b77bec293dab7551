use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{
    app_state::AppState,
    auth::{
        dtos::{ErrorResponse, LoginRequest, LoginResponse},
        jwt::JwtService,
    },
    passwords,
};

/// Single-operator login: the credentials live in configuration, not in a
/// user table. An unconfigured password hash simply means nobody can log in.
pub async fn login(State(state): State<AppState>, Json(payload): Json<LoginRequest>) -> Response {
    if let Err(error) = payload.validate() {
        return (StatusCode::BAD_REQUEST, Json(ErrorResponse { error })).into_response();
    }

    let config = &state.config;

    let email_matches = payload.email.eq_ignore_ascii_case(config.admin_email());
    // Any hash problem (including the empty dev default) reads as a failed
    // verification, not a server error.
    let password_matches = email_matches
        && passwords::verify_password(&payload.password, config.admin_password_hash())
            .unwrap_or(false);

    if !password_matches {
        return (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                error: "Invalid credentials".to_string(),
            }),
        )
            .into_response();
    }

    let jwt_service = JwtService::new(config.jwt_secret());
    let token = match jwt_service.generate_token(config.admin_author_id()) {
        Ok(token) => token,
        Err(_) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to generate token".to_string(),
                }),
            )
                .into_response();
        }
    };

    (StatusCode::OK, Json(LoginResponse { token })).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_state::test_support::mock_state;
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    fn app(state: AppState) -> axum::Router {
        axum::Router::new()
            .route("/auth/login", axum::routing::post(login))
            .with_state(state)
    }

    #[tokio::test]
    async fn login_invalid_email_format() {
        let app = app(mock_state());

        let request = Request::builder()
            .method("POST")
            .uri("/auth/login")
            .header("content-type", "application/json")
            .body(Body::from(
                serde_json::json!({"email": "nope", "password": "x"}).to_string(),
            ))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn login_rejected_without_configured_hash() {
        // Default config carries an empty password hash.
        let state = mock_state();
        let email = state.config.admin_email().to_string();
        let app = app(state);

        let request = Request::builder()
            .method("POST")
            .uri("/auth/login")
            .header("content-type", "application/json")
            .body(Body::from(
                serde_json::json!({"email": email, "password": "whatever"}).to_string(),
            ))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn login_rejected_for_unknown_email() {
        let app = app(mock_state());

        let request = Request::builder()
            .method("POST")
            .uri("/auth/login")
            .header("content-type", "application/json")
            .body(Body::from(
                serde_json::json!({"email": "stranger@example.com", "password": "pw"}).to_string(),
            ))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
