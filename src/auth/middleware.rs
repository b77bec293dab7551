use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::{
    auth::{dtos::ErrorResponse, jwt::JwtService},
    config::Config,
};

/// Extractor guarding the admin routes: any handler that takes one of these
/// only runs for a request carrying a valid bearer token.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub operator_id: Uuid,
}

impl AuthenticatedUser {
    pub fn new(operator_id: Uuid) -> Self {
        Self { operator_id }
    }
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .map(|s| s.to_string());

        async move {
            let auth_header = auth_header.ok_or(AuthError::MissingToken)?;

            let token = auth_header
                .strip_prefix("Bearer ")
                .ok_or(AuthError::InvalidTokenFormat)?;

            let config = Config::from_env().map_err(|_| AuthError::InternalError)?;
            let jwt_service = JwtService::new(config.jwt_secret());

            let claims = jwt_service
                .verify_token(token)
                .map_err(|_| AuthError::InvalidToken)?;

            let operator_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidToken)?;

            Ok(AuthenticatedUser::new(operator_id))
        }
    }
}

#[derive(Debug)]
pub enum AuthError {
    MissingToken,
    InvalidTokenFormat,
    InvalidToken,
    InternalError,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::MissingToken => (StatusCode::UNAUTHORIZED, "Missing authorization token"),
            AuthError::InvalidTokenFormat => (StatusCode::UNAUTHORIZED, "Invalid token format"),
            AuthError::InvalidToken => (StatusCode::UNAUTHORIZED, "Invalid or expired token"),
            AuthError::InternalError => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        (
            status,
            Json(ErrorResponse {
                error: message.to_string(),
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Json, Router,
        body::{Body, to_bytes},
        http::{Request, StatusCode, header::AUTHORIZATION},
        response::Json as ResponseJson,
        routing::get,
    };
    use serde_json::{Value, json};
    use tower::ServiceExt;

    async fn protected_handler(auth_user: AuthenticatedUser) -> ResponseJson<Value> {
        Json(json!({
            "operator_id": auth_user.operator_id,
            "message": "Access granted"
        }))
    }

    fn create_test_app() -> Router {
        Router::new().route("/protected", get(protected_handler))
    }

    fn create_jwt_token(operator_id: Uuid) -> String {
        // Use the same config loading logic as the extractor
        let config = Config::from_env().expect("Failed to load config");
        let jwt_service = JwtService::new(config.jwt_secret());
        jwt_service
            .generate_token(operator_id)
            .expect("Failed to generate token")
    }

    fn create_expired_jwt_token(operator_id: Uuid) -> String {
        use crate::auth::jwt::Claims;
        use chrono::{Duration, Utc};
        use jsonwebtoken::{EncodingKey, Header, encode};

        let config = Config::from_env().expect("Failed to load config");
        let encoding_key = EncodingKey::from_secret(config.jwt_secret().as_bytes());

        let now = Utc::now();
        let expired_time = now - Duration::hours(1);

        let claims = Claims {
            sub: operator_id.to_string(),
            exp: expired_time.timestamp() as usize,
            iat: (expired_time - Duration::hours(24)).timestamp() as usize,
        };

        encode(&Header::default(), &claims, &encoding_key).expect("Failed to create expired token")
    }

    #[tokio::test]
    async fn missing_authorization_header() {
        let app = create_test_app();

        let request = Request::builder()
            .method("GET")
            .uri("/protected")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn malformed_authorization_header() {
        let app = create_test_app();

        let request = Request::builder()
            .method("GET")
            .uri("/protected")
            .header(AUTHORIZATION, "Basic dXNlcjpwYXNz")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn invalid_jwt_token() {
        let app = create_test_app();

        let request = Request::builder()
            .method("GET")
            .uri("/protected")
            .header(AUTHORIZATION, "Bearer invalid.jwt.token")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn expired_jwt_token() {
        let app = create_test_app();
        let operator_id = Uuid::new_v4();
        let expired_token = create_expired_jwt_token(operator_id);

        let request = Request::builder()
            .method("GET")
            .uri("/protected")
            .header(AUTHORIZATION, format!("Bearer {}", expired_token))
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn valid_jwt_token_passes_through() {
        let app = create_test_app();
        let operator_id = Uuid::new_v4();
        let token = create_jwt_token(operator_id);

        let request = Request::builder()
            .method("GET")
            .uri("/protected")
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["operator_id"], operator_id.to_string());
    }
}
