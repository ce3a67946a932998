//! JWT authentication middleware.
//!
//! Validates the Bearer token of every request on protected routes and
//! injects the resulting [`Claims`] into request extensions.

use axum::{
    http::header::AUTHORIZATION,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::debug;

use crate::api::error::ApiError;
use crate::api::jwt::{Claims, JwtError, JwtService};

/// Why a request was not authenticated.
#[derive(Debug)]
pub enum JwtAuthError {
    /// Missing Authorization header
    MissingToken,
    /// Not a Bearer token
    InvalidFormat,
    /// Token validation failed
    InvalidToken(JwtError),
}

impl IntoResponse for JwtAuthError {
    fn into_response(self) -> Response {
        let message = match self {
            JwtAuthError::MissingToken => "Missing authorization token",
            JwtAuthError::InvalidFormat => "Invalid token format",
            JwtAuthError::InvalidToken(JwtError::TokenExpired) => "Token has expired",
            JwtAuthError::InvalidToken(_) => "Invalid token",
        };
        ApiError::unauthorized(message).into_response()
    }
}

/// Pull the token out of an `Authorization: Bearer ...` header.
fn extract_bearer_token<B>(request: &axum::http::Request<B>) -> Result<&str, JwtAuthError> {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .ok_or(JwtAuthError::MissingToken)?;

    auth_header
        .to_str()
        .map_err(|_| JwtAuthError::InvalidFormat)?
        .strip_prefix("Bearer ")
        .ok_or(JwtAuthError::InvalidFormat)
}

fn authenticate<B>(
    jwt_service: &JwtService,
    request: &axum::http::Request<B>,
) -> Result<Claims, JwtAuthError> {
    let token = extract_bearer_token(request)?;
    jwt_service
        .validate_token(token)
        .map_err(JwtAuthError::InvalidToken)
}

/// JWT authentication layer for use with axum's layer system.
#[derive(Clone)]
pub struct JwtAuthLayer {
    jwt_service: Arc<JwtService>,
}

impl JwtAuthLayer {
    pub fn new(jwt_service: Arc<JwtService>) -> Self {
        Self { jwt_service }
    }
}

impl<S> tower::Layer<S> for JwtAuthLayer {
    type Service = JwtAuthService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        JwtAuthService {
            inner,
            jwt_service: self.jwt_service.clone(),
        }
    }
}

/// Service produced by [`JwtAuthLayer`].
#[derive(Clone)]
pub struct JwtAuthService<S> {
    inner: S,
    jwt_service: Arc<JwtService>,
}

impl<S, B> tower::Service<axum::http::Request<B>> for JwtAuthService<S>
where
    S: tower::Service<axum::http::Request<B>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: axum::http::Request<B>) -> Self::Future {
        let claims = authenticate(&self.jwt_service, &request);
        let mut inner = self.inner.clone();

        Box::pin(async move {
            match claims {
                Ok(claims) => {
                    request.extensions_mut().insert(claims);
                    inner.call(request).await
                }
                Err(e) => {
                    debug!(path = %request.uri().path(), error = ?e, "Rejected unauthenticated request");
                    Ok(e.into_response())
                }
            }
        })
    }
}
