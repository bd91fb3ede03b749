use std::time::Instant;

use actix_web::{web, HttpResponse};

use crate::api::response;
use crate::services::auth_service::Claims;
use crate::services::notification_service::{self, NotificationList, NotificationQuery};
use crate::state::AppState;
use crate::utils::AppError;

#[utoipa::path(
    get,
    path = "/api/notifications",
    tag = "Notifications",
    params(NotificationQuery),
    responses(
        (status = 200, description = "Newest notifications and the unread count", body = NotificationList)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_notifications(
    state: web::Data<AppState>,
    claims: web::ReqData<Claims>,
    query: web::Query<NotificationQuery>,
) -> Result<HttpResponse, AppError> {
    let started = Instant::now();
    log::debug!("🔔 GET /notifications - user: {}", claims.sub);

    let list = notification_service::list(state.store(), &claims, &query).await?;
    Ok(response::ok(started, "Notifications retrieved", list))
}

#[utoipa::path(
    get,
    path = "/api/notifications/unread-count",
    tag = "Notifications",
    responses(
        (status = 200, description = "Number of unread notifications")
    ),
    security(("bearer_auth" = []))
)]
pub async fn unread_count(
    state: web::Data<AppState>,
    claims: web::ReqData<Claims>,
) -> Result<HttpResponse, AppError> {
    let started = Instant::now();
    let count = notification_service::unread_count(state.store(), &claims).await?;
    Ok(response::ok(started, "Unread count retrieved", serde_json::json!({ "count": count })))
}

#[utoipa::path(
    patch,
    path = "/api/notifications/{id}/read",
    tag = "Notifications",
    params(("id" = String, Path, description = "Notification id")),
    responses(
        (status = 200, description = "Marked as read"),
        (status = 404, description = "Notification not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn mark_read(
    state: web::Data<AppState>,
    claims: web::ReqData<Claims>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let started = Instant::now();
    let id = path.into_inner();
    notification_service::mark_read(state.store(), &claims, &id).await?;
    Ok(response::ok(started, "Notification marked as read", serde_json::json!({ "id": id })))
}

#[utoipa::path(
    patch,
    path = "/api/notifications/read-all",
    tag = "Notifications",
    responses(
        (status = 200, description = "Number of notifications updated")
    ),
    security(("bearer_auth" = []))
)]
pub async fn mark_all_read(
    state: web::Data<AppState>,
    claims: web::ReqData<Claims>,
) -> Result<HttpResponse, AppError> {
    let started = Instant::now();
    let updated = notification_service::mark_all_read(state.store(), &claims).await?;
    log::info!("🔔 {} notifications marked read for {}", updated, claims.sub);
    Ok(response::ok(started, "All notifications marked as read", serde_json::json!({ "updated": updated })))
}

#[utoipa::path(
    delete,
    path = "/api/notifications/{id}",
    tag = "Notifications",
    params(("id" = String, Path, description = "Notification id")),
    responses(
        (status = 200, description = "Notification deleted"),
        (status = 404, description = "Notification not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_notification(
    state: web::Data<AppState>,
    claims: web::ReqData<Claims>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let started = Instant::now();
    let id = path.into_inner();
    notification_service::delete(state.store(), &claims, &id).await?;
    Ok(response::ok(started, "Notification deleted", serde_json::json!({ "id": id })))
}
