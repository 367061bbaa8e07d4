//! Bearer token authentication middleware

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};

use crate::error::AppError;
use crate::AppState;

/// Extract the access token from the Authorization header
fn extract_bearer_token(request: &Request<Body>) -> Option<&str> {
    request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| {
            h.strip_prefix("Bearer ")
                .or_else(|| h.strip_prefix("bearer "))
        })
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Authentication middleware
///
/// Validates the access token and injects the active User into request
/// extensions. Missing or invalid tokens, unknown users and disabled
/// accounts all get 401.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_bearer_token(&request).ok_or(AppError::Unauthorized)?;

    let user = match state.auth_service.authenticate(token).await {
        Ok(user) => user,
        Err(AppError::Unauthorized) => return Err(AppError::Unauthorized),
        Err(e) => {
            tracing::error!(error = %e, "Failed to authenticate request");
            return Err(e);
        }
    };

    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request_with(header: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri("/api/users/me");
        if let Some(value) = header {
            builder = builder.header("Authorization", value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn extracts_bearer_token() {
        let request = request_with(Some("Bearer abc.def.ghi"));
        assert_eq!(extract_bearer_token(&request), Some("abc.def.ghi"));

        let request = request_with(Some("bearer abc"));
        assert_eq!(extract_bearer_token(&request), Some("abc"));
    }

    #[test]
    fn rejects_other_schemes_and_blank_tokens() {
        assert_eq!(extract_bearer_token(&request_with(None)), None);
        assert_eq!(extract_bearer_token(&request_with(Some("Basic dXNlcg=="))), None);
        assert_eq!(extract_bearer_token(&request_with(Some("Bearer   "))), None);
    }
}
