use std::time::Instant;

use actix_web::{web, HttpResponse};

use crate::api::response;
use crate::services::auth_service::{
    self, AuthResponse, Claims, LoginRequest, MeResponse, RefreshTokenRequest, RegisterRequest,
};
use crate::state::AppState;
use crate::utils::AppError;

#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "Auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Registration successful", body = AuthResponse),
        (status = 400, description = "Invalid email, weak password, missing name or bad userType"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn register(
    state: web::Data<AppState>,
    request: web::Json<RegisterRequest>,
) -> Result<HttpResponse, AppError> {
    let started = Instant::now();
    let email_str = request.email.as_deref().unwrap_or("N/A");
    log::info!("📝 POST /auth/register - email: {}", email_str);

    let response = auth_service::register(
        state.store(),
        &state.config.jwt,
        state.config.bcrypt_cost,
        &request,
    )
    .await
    .inspect_err(|e| log::warn!("❌ Registration failed: {} - {}", email_str, e))?;

    log::info!("✅ Registration successful: {}", response.user.id);
    Ok(response::created(started, "Registration successful", response))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 403, description = "Account inactive")
    )
)]
pub async fn login(
    state: web::Data<AppState>,
    request: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    let started = Instant::now();
    log::info!("🔐 POST /auth/login - email: {}", request.email);

    let response = auth_service::login(state.store(), &state.config.jwt, &request)
        .await
        .inspect_err(|e| log::warn!("❌ Login failed: {} - {}", request.email, e))?;

    log::info!("✅ Login successful: {}", response.user.id);
    Ok(response::ok(started, "Login successful", response))
}

#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    tag = "Auth",
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, description = "Token refreshed", body = AuthResponse),
        (status = 401, description = "Invalid refresh token")
    )
)]
pub async fn refresh_token(
    state: web::Data<AppState>,
    request: web::Json<RefreshTokenRequest>,
) -> Result<HttpResponse, AppError> {
    let started = Instant::now();
    log::info!("🔄 POST /auth/refresh");

    let response = auth_service::refresh_token(state.store(), &state.config.jwt, &request)
        .await
        .inspect_err(|e| log::warn!("❌ Token refresh failed: {}", e))?;

    log::info!("✅ Token refreshed for {}", response.user.id);
    Ok(response::ok(started, "Token refreshed", response))
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "Auth",
    responses(
        (status = 200, description = "Current user and profile completion", body = MeResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_me(
    state: web::Data<AppState>,
    claims: web::ReqData<Claims>,
) -> Result<HttpResponse, AppError> {
    let started = Instant::now();
    log::info!("👤 GET /auth/me - user: {}", claims.sub);

    let me = auth_service::me(state.store(), &claims).await?;
    Ok(response::ok(started, "User retrieved", me))
}
