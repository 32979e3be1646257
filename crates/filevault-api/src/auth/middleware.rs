use crate::auth::jwt::JwtVerifier;
use crate::auth::models::OwnerContext;
use crate::error::HttpAppError;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use filevault_core::AppError;
use std::sync::Arc;

#[derive(Clone)]
pub struct AuthState {
    pub verifier: JwtVerifier,
}

impl AuthState {
    pub fn new(jwt_secret: &str) -> Self {
        Self {
            verifier: JwtVerifier::new(jwt_secret),
        }
    }
}

/// Resolves the bearer token to an `OwnerContext` or rejects with 401.
pub async fn auth_middleware(
    State(auth_state): State<Arc<AuthState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_header = match request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
    {
        Some(h) => h,
        None => {
            tracing::debug!("Rejected request without authorization header");
            return HttpAppError(AppError::Unauthorized(
                "Missing authorization header".to_string(),
            ))
            .into_response();
        }
    };

    let Some(token) = auth_header.strip_prefix("Bearer ") else {
        return HttpAppError(AppError::Unauthorized(
            "Invalid authorization header format".to_string(),
        ))
        .into_response();
    };

    match auth_state.verifier.verify(token.trim()) {
        Ok(owner_id) => {
            request.extensions_mut().insert(OwnerContext { owner_id });
            next.run(request).await
        }
        Err(e) => HttpAppError(e).into_response(),
    }
}
