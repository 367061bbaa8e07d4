//! Authentication handlers
//!
//! Registration and password login. Both routes are public and rate limited.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::domain::entities::User;
use crate::error::AppError;
use crate::AppState;

/// Request to register a new account
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Login credentials
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Issued access token
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
}

/// POST /auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<User>, AppError> {
    let user = state
        .auth_service
        .register(&request.name, &request.email, &request.password)
        .await?;

    Ok(Json(user))
}

/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let access_token = state
        .auth_service
        .login(&request.email, &request.password)
        .await?;

    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer",
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_register_request() {
        let json = r#"{"name": "Ada", "email": "ada@example.com", "password": "secret1"}"#;
        let request: RegisterRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.name, "Ada");
        assert_eq!(request.email, "ada@example.com");
    }

    #[test]
    fn parse_register_missing_password() {
        let json = r#"{"name": "Ada", "email": "ada@example.com"}"#;
        let result: Result<RegisterRequest, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }

    #[test]
    fn token_response_shape() {
        let response = TokenResponse {
            access_token: "abc".to_string(),
            token_type: "bearer",
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["access_token"], "abc");
        assert_eq!(json["token_type"], "bearer");
    }
}
