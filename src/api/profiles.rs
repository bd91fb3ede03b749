use std::time::Instant;

use actix_web::{web, HttpResponse};

use crate::api::response;
use crate::services::auth_service::Claims;
use crate::services::profile_service::{
    self, InstitutionProfileRequest, InstitutionProfileResponse, PublicInstitution,
    TeacherProfileRequest, TeacherProfileResponse,
};
use crate::state::AppState;
use crate::utils::AppError;

// ==================== TEACHERS ====================

#[utoipa::path(
    get,
    path = "/api/teachers/profile",
    tag = "Profiles",
    responses(
        (status = 200, description = "Teacher profile and completion", body = TeacherProfileResponse),
        (status = 403, description = "Caller is not a teacher")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_teacher_profile(
    state: web::Data<AppState>,
    claims: web::ReqData<Claims>,
) -> Result<HttpResponse, AppError> {
    let started = Instant::now();
    log::info!("👩‍🏫 GET /teachers/profile - user: {}", claims.sub);

    let profile = profile_service::get_teacher_profile(state.store(), &claims).await?;
    Ok(response::ok(started, "Profile retrieved", profile))
}

#[utoipa::path(
    put,
    path = "/api/teachers/profile",
    tag = "Profiles",
    request_body = TeacherProfileRequest,
    responses(
        (status = 200, description = "Profile saved", body = TeacherProfileResponse),
        (status = 400, description = "Invalid phone, experience or URL"),
        (status = 403, description = "Caller is not a teacher")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_teacher_profile(
    state: web::Data<AppState>,
    claims: web::ReqData<Claims>,
    request: web::Json<TeacherProfileRequest>,
) -> Result<HttpResponse, AppError> {
    let started = Instant::now();
    log::info!("✏️  PUT /teachers/profile - user: {}", claims.sub);

    let profile =
        profile_service::update_teacher_profile(state.store(), &claims, request.into_inner()).await?;
    Ok(response::ok(started, "Profile saved", profile))
}

// ==================== INSTITUTIONS ====================

#[utoipa::path(
    get,
    path = "/api/institutions/profile",
    tag = "Profiles",
    responses(
        (status = 200, description = "Institution profile and completion", body = InstitutionProfileResponse),
        (status = 403, description = "Caller is not an institution")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_institution_profile(
    state: web::Data<AppState>,
    claims: web::ReqData<Claims>,
) -> Result<HttpResponse, AppError> {
    let started = Instant::now();
    log::info!("🏫 GET /institutions/profile - user: {}", claims.sub);

    let profile = profile_service::get_institution_profile(state.store(), &claims).await?;
    Ok(response::ok(started, "Profile retrieved", profile))
}

#[utoipa::path(
    put,
    path = "/api/institutions/profile",
    tag = "Profiles",
    request_body = InstitutionProfileRequest,
    responses(
        (status = 200, description = "Profile saved", body = InstitutionProfileResponse),
        (status = 400, description = "Invalid contact details, year or URL"),
        (status = 403, description = "Caller is not an institution")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_institution_profile(
    state: web::Data<AppState>,
    claims: web::ReqData<Claims>,
    request: web::Json<InstitutionProfileRequest>,
) -> Result<HttpResponse, AppError> {
    let started = Instant::now();
    log::info!("✏️  PUT /institutions/profile - user: {}", claims.sub);

    let profile =
        profile_service::update_institution_profile(state.store(), &claims, request.into_inner())
            .await?;
    Ok(response::ok(started, "Profile saved", profile))
}

#[utoipa::path(
    get,
    path = "/api/institutions/{user_id}",
    tag = "Profiles",
    params(("user_id" = String, Path, description = "Institution user id")),
    responses(
        (status = 200, description = "Public institution page", body = PublicInstitution),
        (status = 404, description = "Institution not found")
    )
)]
pub async fn get_public_institution(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let started = Instant::now();
    let user_id = path.into_inner();
    log::info!("🏫 GET /institutions/{}", user_id);

    let institution = profile_service::public_institution(state.store(), &user_id).await?;
    Ok(response::ok(started, "Institution retrieved", institution))
}
