use std::time::Instant;

use actix_web::{web, HttpResponse};

use crate::api::response;
use crate::models::{Bookmark, BookmarkView};
use crate::services::auth_service::Claims;
use crate::services::bookmark_service::{self, BookmarkQuery, BookmarkStatus, CreateBookmarkRequest};
use crate::state::AppState;
use crate::utils::AppError;

#[utoipa::path(
    post,
    path = "/api/bookmarks",
    tag = "Bookmarks",
    request_body = CreateBookmarkRequest,
    responses(
        (status = 201, description = "Job bookmarked", body = Bookmark),
        (status = 404, description = "Job not found"),
        (status = 409, description = "Already bookmarked")
    ),
    security(("bearer_auth" = []))
)]
pub async fn add_bookmark(
    state: web::Data<AppState>,
    claims: web::ReqData<Claims>,
    request: web::Json<CreateBookmarkRequest>,
) -> Result<HttpResponse, AppError> {
    let started = Instant::now();
    log::info!("🔖 POST /bookmarks - user: {}, job: {}", claims.sub, request.job_id);

    let bookmark = bookmark_service::add(state.store(), &claims, &request).await?;
    Ok(response::created(started, "Job bookmarked", bookmark))
}

#[utoipa::path(
    get,
    path = "/api/bookmarks",
    tag = "Bookmarks",
    params(BookmarkQuery),
    responses(
        (status = 200, description = "Saved jobs, newest first", body = Vec<BookmarkView>)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_bookmarks(
    state: web::Data<AppState>,
    claims: web::ReqData<Claims>,
    query: web::Query<BookmarkQuery>,
) -> Result<HttpResponse, AppError> {
    let started = Instant::now();
    log::info!("🔖 GET /bookmarks - user: {}, category: {:?}", claims.sub, query.category);

    let bookmarks = bookmark_service::list(state.store(), &claims, &query).await?;
    Ok(response::ok(started, "Bookmarks retrieved", bookmarks))
}

#[utoipa::path(
    get,
    path = "/api/bookmarks/check/{job_id}",
    tag = "Bookmarks",
    params(("job_id" = String, Path, description = "Job id")),
    responses(
        (status = 200, description = "Whether the job is bookmarked", body = BookmarkStatus)
    ),
    security(("bearer_auth" = []))
)]
pub async fn check_bookmark(
    state: web::Data<AppState>,
    claims: web::ReqData<Claims>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let started = Instant::now();
    let status = bookmark_service::check(state.store(), &claims, &path).await?;
    Ok(response::ok(started, "Bookmark status retrieved", status))
}

#[utoipa::path(
    delete,
    path = "/api/bookmarks/{job_id}",
    tag = "Bookmarks",
    params(("job_id" = String, Path, description = "Job id")),
    responses(
        (status = 200, description = "Bookmark removed"),
        (status = 404, description = "Bookmark not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn remove_bookmark(
    state: web::Data<AppState>,
    claims: web::ReqData<Claims>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let started = Instant::now();
    let job_id = path.into_inner();
    log::info!("🔖 DELETE /bookmarks/{} - user: {}", job_id, claims.sub);

    bookmark_service::remove(state.store(), &claims, &job_id).await?;
    Ok(response::ok(started, "Bookmark removed", serde_json::json!({ "job_id": job_id })))
}
