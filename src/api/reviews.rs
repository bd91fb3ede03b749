use std::time::Instant;

use actix_web::{web, HttpResponse};

use crate::api::response;
use crate::models::Review;
use crate::services::auth_service::Claims;
use crate::services::review_service::{self, CreateReviewRequest, InstitutionReviews};
use crate::state::AppState;
use crate::utils::AppError;

#[utoipa::path(
    post,
    path = "/api/reviews",
    tag = "Reviews",
    request_body = CreateReviewRequest,
    responses(
        (status = 201, description = "Review posted", body = Review),
        (status = 400, description = "Invalid rating or comment"),
        (status = 404, description = "Institution not found"),
        (status = 409, description = "Institution already reviewed")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_review(
    state: web::Data<AppState>,
    claims: web::ReqData<Claims>,
    request: web::Json<CreateReviewRequest>,
) -> Result<HttpResponse, AppError> {
    let started = Instant::now();
    log::info!("⭐ POST /reviews - user: {}, institution: {}", claims.sub, request.institution_id);

    let review = review_service::create_review(state.store(), &claims, &request).await?;
    Ok(response::created(started, "Review posted", review))
}

#[utoipa::path(
    get,
    path = "/api/reviews/institution/{id}",
    tag = "Reviews",
    params(("id" = String, Path, description = "Institution user id")),
    responses(
        (status = 200, description = "Reviews newest first with the average rating", body = InstitutionReviews)
    )
)]
pub async fn institution_reviews(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let started = Instant::now();
    let reviews = review_service::institution_reviews(state.store(), &path).await?;
    Ok(response::ok(started, "Reviews retrieved", reviews))
}
