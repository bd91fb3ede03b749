use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::Method,
    web, Error, HttpMessage, ResponseError,
};
use futures::future::LocalBoxFuture;
use std::future::{ready, Ready};

use crate::services::auth_service::{verify_token, Claims, TokenUse};
use crate::state::AppState;
use crate::utils::AppError;

/// Bearer-token guard for everything under `/api`.
///
/// Verified `Claims` are stored in the request extensions for handlers to
/// take with `web::ReqData<Claims>`. Routes listed by [`is_public`] go through
/// without a token; if one is sent anyway and verifies, its claims are attached.
pub struct AuthMiddleware;

/// Routes reachable without a bearer token.
pub fn is_public(method: &Method, path: &str) -> bool {
    let path = path.trim_end_matches('/');
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    if *method == Method::POST {
        return matches!(
            path,
            "/api/auth/login" | "/api/auth/register" | "/api/auth/refresh"
        );
    }
    if *method != Method::GET {
        return false;
    }

    match segments.as_slice() {
        ["api", "jobs"] => true,
        ["api", "jobs", id] => *id != "mine",
        ["api", "subscriptions", "plans"] => true,
        ["api", "reviews", "institution", _] => true,
        ["api", "institutions", id] => *id != "profile",
        _ => false,
    }
}

fn bearer_token(req: &ServiceRequest) -> Result<Option<String>, AppError> {
    let Some(header_value) = req.headers().get("Authorization") else {
        return Ok(None);
    };
    let header_str = header_value
        .to_str()
        .map_err(|_| AppError::unauthorized("INVALID_TOKEN", "Invalid token format"))?;
    match header_str.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(Some(token.trim().to_string())),
        _ => Err(AppError::unauthorized("INVALID_TOKEN", "Invalid token format")),
    }
}

fn authenticate(req: &ServiceRequest) -> Result<Option<Claims>, AppError> {
    let Some(token) = bearer_token(req)? else {
        return Ok(None);
    };
    let state = req
        .app_data::<web::Data<AppState>>()
        .ok_or_else(|| AppError::Internal("Application state is not configured".into()))?;
    verify_token(&state.config.jwt, &token, TokenUse::Access).map(Some)
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService { service }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        // CORS preflight never carries credentials
        if req.method() == Method::OPTIONS {
            let fut = self.service.call(req);
            return Box::pin(async move { Ok(fut.await?.map_into_left_body()) });
        }

        let public = is_public(req.method(), req.path());

        let outcome = match authenticate(&req) {
            Ok(Some(claims)) => Ok(Some(claims)),
            Ok(None) if public => Ok(None),
            Ok(None) => Err(AppError::unauthorized("UNAUTHORIZED", "Missing authorization token")),
            // A bad token on a public route is ignored rather than rejected
            Err(_) if public => Ok(None),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(claims) => {
                if let Some(claims) = claims {
                    req.extensions_mut().insert(claims);
                }
                let fut = self.service.call(req);
                Box::pin(async move { Ok(fut.await?.map_into_left_body()) })
            }
            Err(err) => {
                log::debug!("🔒 Rejected {} {}: {}", req.method(), req.path(), err);
                let response = err.error_response();
                Box::pin(async move { Ok(req.into_response(response).map_into_right_body()) })
            }
        }
    }
}
