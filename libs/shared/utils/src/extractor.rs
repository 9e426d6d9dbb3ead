use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::typed_header::{TypedHeader, TypedHeaderRejection};
use headers::{authorization::Bearer, Authorization};

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::jwt::validate_token;

/// Validates the bearer token and stores the caller as a [`User`] extension.
pub async fn auth_middleware(
    State(config): State<Arc<AppConfig>>,
    bearer: Result<TypedHeader<Authorization<Bearer>>, TypedHeaderRejection>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let TypedHeader(Authorization(bearer)) = bearer.map_err(|rejection| {
        if rejection.is_missing() {
            AppError::Auth("Missing authorization header".to_string())
        } else {
            AppError::Auth("Invalid authorization header format".to_string())
        }
    })?;

    let user = validate_token(bearer.token(), &config.supabase_jwt_secret)
        .map_err(|e| AppError::Auth(e.to_string()))?;

    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

/// Rejects callers that are neither `subject_id` nor an admin.
pub fn ensure_acts_for(user: &User, subject_id: &str, action: &str) -> Result<(), AppError> {
    if user.acts_for(subject_id) {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!("Not authorized to {}", action)))
    }
}

#[cfg(test)]
mod tests {
    use axum::{http::StatusCode, middleware, routing::get, Extension, Router};
    use tower::ServiceExt;

    use super::*;
    use crate::test_utils::{JwtTestUtils, TestConfig, TestUser};

    fn app(config: Arc<AppConfig>) -> Router {
        Router::new()
            .route("/me", get(|Extension(user): Extension<User>| async move { user.id }))
            .layer(middleware::from_fn_with_state(config, auth_middleware))
    }

    fn request(auth: Option<String>) -> axum::http::Request<Body> {
        let mut builder = axum::http::Request::builder().uri("/me");
        if let Some(value) = auth {
            builder = builder.header("Authorization", value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn passes_valid_token_through() {
        let test_config = TestConfig::default();
        let user = TestUser::patient("patient@example.com");
        let token = JwtTestUtils::create_test_token(&user, &test_config.jwt_secret, Some(1));

        let response = app(test_config.to_arc())
            .oneshot(request(Some(format!("Bearer {}", token))))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn rejects_missing_or_bad_header() {
        let config = TestConfig::default().to_arc();

        let missing = app(config.clone()).oneshot(request(None)).await.unwrap();
        assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

        let wrong_scheme = app(config.clone())
            .oneshot(request(Some("Basic abc".to_string())))
            .await
            .unwrap();
        assert_eq!(wrong_scheme.status(), StatusCode::UNAUTHORIZED);

        let garbage = app(config)
            .oneshot(request(Some(format!("Bearer {}", JwtTestUtils::create_malformed_token()))))
            .await
            .unwrap();
        assert_eq!(garbage.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn only_subject_or_admin_may_act() {
        let professional = TestUser::professional("pro@example.com").to_user();
        let admin = TestUser::admin("admin@example.com").to_user();

        assert!(ensure_acts_for(&professional, &professional.id, "publish").is_ok());
        assert!(ensure_acts_for(&admin, &professional.id, "publish").is_ok());
        assert!(ensure_acts_for(&professional, "someone-else", "publish").is_err());
    }
}
