use std::time::Instant;

use actix_web::{web, HttpResponse};

use crate::api::response;
use crate::models::{Job, JobDetail, JobQuery};
use crate::services::auth_service::Claims;
use crate::services::job_service::{self, JobRequest, JobSearchResponse};
use crate::state::AppState;
use crate::utils::AppError;

#[utoipa::path(
    get,
    path = "/api/jobs",
    tag = "Jobs",
    params(
        ("q" = Option<String>, Query, description = "Text in title, description or subject"),
        ("subject" = Option<String>, Query, description = "Subject contains"),
        ("location" = Option<String>, Query, description = "Location contains"),
        ("job_type" = Option<String>, Query, description = "full_time, part_time, contract, temporary, internship"),
        ("min_salary" = Option<i64>, Query, description = "Jobs paying at least this much"),
        ("sort" = Option<String>, Query, description = "newest (default) or salary"),
        ("page" = Option<u64>, Query, description = "Page number, from 1"),
        ("limit" = Option<u64>, Query, description = "Page size, 1-50 (default 10)")
    ),
    responses(
        (status = 200, description = "Open jobs", body = JobSearchResponse)
    )
)]
pub async fn search_jobs(
    state: web::Data<AppState>,
    query: web::Query<JobQuery>,
) -> Result<HttpResponse, AppError> {
    let started = Instant::now();
    log::info!("🔎 GET /jobs - q: {:?}, page: {}", query.q, query.page());

    let result = job_service::search_jobs(state.store(), &query).await?;
    log::info!("✅ {} jobs matched", result.pagination.total);
    Ok(response::ok(started, "Jobs retrieved", result))
}

#[utoipa::path(
    get,
    path = "/api/jobs/{id}",
    tag = "Jobs",
    params(("id" = String, Path, description = "Job id")),
    responses(
        (status = 200, description = "Job with institution summary", body = JobDetail),
        (status = 404, description = "Job not found")
    )
)]
pub async fn get_job(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let started = Instant::now();
    let id = path.into_inner();
    log::info!("📄 GET /jobs/{}", id);

    let job = job_service::get_job(state.store(), &id).await?;
    Ok(response::ok(started, "Job retrieved", job))
}

#[utoipa::path(
    get,
    path = "/api/jobs/mine",
    tag = "Jobs",
    responses(
        (status = 200, description = "The institution's jobs, including closed ones", body = Vec<Job>),
        (status = 403, description = "Caller is not an institution")
    ),
    security(("bearer_auth" = []))
)]
pub async fn my_jobs(
    state: web::Data<AppState>,
    claims: web::ReqData<Claims>,
) -> Result<HttpResponse, AppError> {
    let started = Instant::now();
    log::info!("📂 GET /jobs/mine - user: {}", claims.sub);

    let jobs = job_service::my_jobs(state.store(), &claims).await?;
    Ok(response::ok(started, "Jobs retrieved", jobs))
}

#[utoipa::path(
    post,
    path = "/api/jobs",
    tag = "Jobs",
    request_body = JobRequest,
    responses(
        (status = 201, description = "Job posted", body = Job),
        (status = 400, description = "Invalid job fields"),
        (status = 403, description = "Not an institution or job post limit reached"),
        (status = 422, description = "Institution profile incomplete")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_job(
    state: web::Data<AppState>,
    claims: web::ReqData<Claims>,
    request: web::Json<JobRequest>,
) -> Result<HttpResponse, AppError> {
    let started = Instant::now();
    log::info!("📢 POST /jobs - user: {}", claims.sub);

    let job = job_service::create_job(
        state.store(),
        state.config.free_job_post_limit,
        &claims,
        request.into_inner(),
    )
    .await
    .inspect_err(|e| log::warn!("❌ Job post rejected for {}: {}", claims.sub, e))?;

    Ok(response::created(started, "Job posted", job))
}

#[utoipa::path(
    put,
    path = "/api/jobs/{id}",
    tag = "Jobs",
    params(("id" = String, Path, description = "Job id")),
    request_body = JobRequest,
    responses(
        (status = 200, description = "Job updated", body = Job),
        (status = 403, description = "Not the job owner"),
        (status = 404, description = "Job not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_job(
    state: web::Data<AppState>,
    claims: web::ReqData<Claims>,
    path: web::Path<String>,
    request: web::Json<JobRequest>,
) -> Result<HttpResponse, AppError> {
    let started = Instant::now();
    let id = path.into_inner();
    log::info!("✏️  PUT /jobs/{} - user: {}", id, claims.sub);

    let job = job_service::update_job(
        state.store(),
        state.config.free_job_post_limit,
        &claims,
        &id,
        request.into_inner(),
    )
    .await?;
    Ok(response::ok(started, "Job updated", job))
}

#[utoipa::path(
    delete,
    path = "/api/jobs/{id}",
    tag = "Jobs",
    params(("id" = String, Path, description = "Job id")),
    responses(
        (status = 200, description = "Job deleted"),
        (status = 403, description = "Not the job owner"),
        (status = 404, description = "Job not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_job(
    state: web::Data<AppState>,
    claims: web::ReqData<Claims>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let started = Instant::now();
    let id = path.into_inner();
    log::info!("🗑️  DELETE /jobs/{} - user: {}", id, claims.sub);

    job_service::delete_job(state.store(), &claims, &id).await?;
    Ok(response::ok(started, "Job deleted", serde_json::json!({ "id": id })))
}
