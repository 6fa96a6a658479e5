/**
 * Admin Authentication
 * Bearer-token gate in front of the /api/admin routes
 */
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};

use subtle::ConstantTimeEq;

use crate::routes::ApiError;
use crate::state::AppState;

/// Compare without short-circuiting on the first differing byte.
fn tokens_match(given: &[u8], expected: &[u8]) -> bool {
    given.ct_eq(expected).into()
}

fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
}

/// Middleware for the admin router.
///
/// Without a configured token every request passes.
pub async fn authenticate_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let Some(expected) = state.admin_token.as_deref() else {
        return next.run(request).await;
    };

    let rejection = match bearer_token(&request) {
        None => Some("Authorization required"),
        Some(token) if tokens_match(token.as_bytes(), expected.as_bytes()) => None,
        Some(_) => {
            tracing::warn!(uri = %request.uri(), "Rejected admin request with invalid token");
            Some("Invalid token")
        }
    };

    match rejection {
        None => next.run(request).await,
        Some(message) => ApiError::Unauthorized(message).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemStorage;
    use axum::body::Body;
    use axum::http::StatusCode;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app_with_token() -> axum::Router {
        let state = AppState::new(Arc::new(MemStorage::new())).with_admin_token("s3cret");
        crate::create_app(state)
    }

    async fn status_of(app: axum::Router, auth: Option<&str>) -> StatusCode {
        let mut builder = axum::http::Request::get("/api/admin/services");
        if let Some(value) = auth {
            builder = builder.header("authorization", value);
        }
        let res = app.oneshot(builder.body(Body::empty()).unwrap()).await.unwrap();
        res.status()
    }

    #[test]
    fn test_tokens_match() {
        assert!(tokens_match(b"abc", b"abc"));
        assert!(!tokens_match(b"abc", b"abd"));
        assert!(!tokens_match(b"abc", b"abcd"));
    }

    #[tokio::test]
    async fn test_missing_token_is_rejected() {
        assert_eq!(status_of(app_with_token(), None).await, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_wrong_token_is_rejected() {
        assert_eq!(
            status_of(app_with_token(), Some("Bearer nope")).await,
            StatusCode::UNAUTHORIZED
        );
    }

    #[tokio::test]
    async fn test_valid_token_is_accepted() {
        assert_eq!(
            status_of(app_with_token(), Some("Bearer s3cret")).await,
            StatusCode::OK
        );
    }

    #[tokio::test]
    async fn test_open_when_no_token_configured() {
        let app = crate::create_app(AppState::new(Arc::new(MemStorage::new())));
        assert_eq!(status_of(app, None).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_public_routes_do_not_need_token() {
        let res = app_with_token()
            .oneshot(
                axum::http::Request::get("/api/services")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }
}
