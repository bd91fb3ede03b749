use std::time::Instant;

use actix_web::{web, HttpResponse};

use crate::api::response;
use crate::models::{PlatformStats, UserInfo};
use crate::services::admin_service::{self, UserList, UserListQuery, UserStatusRequest};
use crate::services::auth_service::Claims;
use crate::state::AppState;
use crate::utils::AppError;

// ==================== ADMIN ====================
// Every handler here is admin only (403 ADMIN_ONLY otherwise)

#[utoipa::path(
    get,
    path = "/api/admin/dashboard",
    tag = "Admin",
    responses(
        (status = 200, description = "Platform totals", body = PlatformStats),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = []))
)]
pub async fn dashboard(
    state: web::Data<AppState>,
    claims: web::ReqData<Claims>,
) -> Result<HttpResponse, AppError> {
    let started = Instant::now();
    log::info!("🛡️  GET /admin/dashboard - user: {}", claims.sub);

    let stats = admin_service::dashboard(state.store(), &claims).await?;
    Ok(response::ok(started, "Dashboard retrieved", stats))
}

#[utoipa::path(
    get,
    path = "/api/admin/users",
    tag = "Admin",
    params(UserListQuery),
    responses(
        (status = 200, description = "Users, newest first", body = UserList),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_users(
    state: web::Data<AppState>,
    claims: web::ReqData<Claims>,
    query: web::Query<UserListQuery>,
) -> Result<HttpResponse, AppError> {
    let started = Instant::now();
    let users = admin_service::list_users(state.store(), &claims, &query).await?;
    Ok(response::ok(started, "Users retrieved", users))
}

#[utoipa::path(
    patch,
    path = "/api/admin/users/{id}/status",
    tag = "Admin",
    params(("id" = String, Path, description = "User id")),
    request_body = UserStatusRequest,
    responses(
        (status = 200, description = "User updated", body = UserInfo),
        (status = 400, description = "Admins cannot deactivate themselves"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn set_user_status(
    state: web::Data<AppState>,
    claims: web::ReqData<Claims>,
    path: web::Path<String>,
    request: web::Json<UserStatusRequest>,
) -> Result<HttpResponse, AppError> {
    let started = Instant::now();
    let user = admin_service::set_user_status(state.store(), &claims, &path, &request).await?;
    Ok(response::ok(started, "User status updated", user))
}

#[utoipa::path(
    delete,
    path = "/api/admin/jobs/{id}",
    tag = "Admin",
    params(("id" = String, Path, description = "Job id")),
    responses(
        (status = 200, description = "Job removed"),
        (status = 404, description = "Job not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn remove_job(
    state: web::Data<AppState>,
    claims: web::ReqData<Claims>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let started = Instant::now();
    let id = path.into_inner();
    admin_service::remove_job(state.store(), &claims, &id).await?;
    Ok(response::ok(started, "Job removed", serde_json::json!({ "id": id })))
}
