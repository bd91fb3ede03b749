use std::time::Instant;

use actix_web::{web, HttpResponse};

use crate::api::{metrics, response};
use crate::models::{Application, ApplicationView};
use crate::services::application_service::{
    self, SubmitApplicationRequest, UpdateStatusRequest,
};
use crate::services::auth_service::Claims;
use crate::state::AppState;
use crate::utils::AppError;

#[utoipa::path(
    post,
    path = "/api/applications",
    tag = "Applications",
    request_body = SubmitApplicationRequest,
    responses(
        (status = 201, description = "Application submitted", body = Application),
        (status = 400, description = "Missing job id or cover letter out of bounds"),
        (status = 403, description = "Caller is not a teacher or the account is inactive"),
        (status = 404, description = "Job not found"),
        (status = 409, description = "Already applied"),
        (status = 410, description = "Job closed or expired"),
        (status = 422, description = "Profile incomplete or resume missing")
    ),
    security(("bearer_auth" = []))
)]
pub async fn submit_application(
    state: web::Data<AppState>,
    claims: web::ReqData<Claims>,
    request: web::Json<SubmitApplicationRequest>,
) -> Result<HttpResponse, AppError> {
    let started = Instant::now();
    log::info!("📨 POST /applications - user: {}, job: {:?}", claims.sub, request.job_id);

    let application = application_service::submit_application(&state.store, &claims.sub, &request)
        .await
        .inspect_err(|e| log::warn!("❌ Application rejected for {}: {}", claims.sub, e))?;

    metrics::increment_applications_submitted();
    log::info!("✅ Application {} submitted to job {}", application.id, application.job_id);
    Ok(response::created(started, "Application submitted", application))
}

#[utoipa::path(
    get,
    path = "/api/applications/mine",
    tag = "Applications",
    responses(
        (status = 200, description = "The teacher's applications, newest first", body = Vec<ApplicationView>),
        (status = 403, description = "Caller is not a teacher")
    ),
    security(("bearer_auth" = []))
)]
pub async fn my_applications(
    state: web::Data<AppState>,
    claims: web::ReqData<Claims>,
) -> Result<HttpResponse, AppError> {
    let started = Instant::now();
    log::info!("📂 GET /applications/mine - user: {}", claims.sub);

    let applications = application_service::my_applications(state.store(), &claims).await?;
    Ok(response::ok(started, "Applications retrieved", applications))
}

#[utoipa::path(
    get,
    path = "/api/applications/job/{job_id}",
    tag = "Applications",
    params(("job_id" = String, Path, description = "Job id")),
    responses(
        (status = 200, description = "Applications received for the job", body = Vec<Application>),
        (status = 403, description = "Not the job owner"),
        (status = 404, description = "Job not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn job_applications(
    state: web::Data<AppState>,
    claims: web::ReqData<Claims>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let started = Instant::now();
    let job_id = path.into_inner();
    log::info!("📂 GET /applications/job/{} - user: {}", job_id, claims.sub);

    let applications = application_service::job_applications(state.store(), &claims, &job_id).await?;
    Ok(response::ok(started, "Applications retrieved", applications))
}

#[utoipa::path(
    patch,
    path = "/api/applications/{id}/status",
    tag = "Applications",
    params(("id" = String, Path, description = "Application id")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status changed", body = Application),
        (status = 400, description = "Unknown status or transition not allowed"),
        (status = 403, description = "Not the job owner"),
        (status = 404, description = "Application not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_status(
    state: web::Data<AppState>,
    claims: web::ReqData<Claims>,
    path: web::Path<String>,
    request: web::Json<UpdateStatusRequest>,
) -> Result<HttpResponse, AppError> {
    let started = Instant::now();
    let id = path.into_inner();
    log::info!("🔄 PATCH /applications/{}/status → {}", id, request.status);

    let application = application_service::update_status(&state.store, &claims, &id, &request)
        .await
        .inspect_err(|e| log::warn!("❌ Status change on {} failed: {}", id, e))?;
    Ok(response::ok(started, "Application status updated", application))
}

#[utoipa::path(
    post,
    path = "/api/applications/{id}/withdraw",
    tag = "Applications",
    params(("id" = String, Path, description = "Application id")),
    responses(
        (status = 200, description = "Application withdrawn", body = Application),
        (status = 400, description = "Application can no longer be withdrawn"),
        (status = 403, description = "Not the applicant"),
        (status = 404, description = "Application not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn withdraw(
    state: web::Data<AppState>,
    claims: web::ReqData<Claims>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let started = Instant::now();
    let id = path.into_inner();
    log::info!("↩️  POST /applications/{}/withdraw - user: {}", id, claims.sub);

    let application = application_service::withdraw(state.store(), &claims, &id).await?;
    Ok(response::ok(started, "Application withdrawn", application))
}
