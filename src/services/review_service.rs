use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::database::{Store, StoreError};
use crate::models::{RatingSummary, Review, UserType};
use crate::services::auth_service::{load_active_user, require_user_type, Claims};
use crate::utils::validation::{bounded_text, new_id, non_empty, parse_id};
use crate::utils::AppError;

const COMMENT_MIN: usize = 10;
const COMMENT_MAX: usize = 1000;
const TITLE_MAX: usize = 100;

#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct CreateReviewRequest {
    pub institution_id: String,
    pub rating: Option<i64>,
    pub title: Option<String>,
    pub comment: Option<String>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct InstitutionReviews {
    pub reviews: Vec<Review>,
    pub average: f64,
    pub count: u64,
}

fn duplicate_review() -> AppError {
    AppError::conflict("DUPLICATE_REVIEW", "You have already reviewed this institution")
}

fn validate_rating(rating: Option<i64>) -> Result<u8, AppError> {
    let rating = rating.ok_or_else(|| AppError::bad_request("RATING_REQUIRED", "Rating is required"))?;
    if !(1..=5).contains(&rating) {
        return Err(AppError::bad_request("INVALID_RATING", "Rating must be between 1 and 5"));
    }
    Ok(rating as u8)
}

pub async fn create_review(
    store: &dyn Store,
    claims: &Claims,
    request: &CreateReviewRequest,
) -> Result<Review, AppError> {
    require_user_type(claims, UserType::Teacher)?;

    let rating = validate_rating(request.rating)?;
    let comment = bounded_text(
        request.comment.as_deref().unwrap_or_default(),
        COMMENT_MIN,
        COMMENT_MAX,
        "COMMENT_TOO_SHORT",
        "COMMENT_TOO_LONG",
        "Comment",
    )?;
    let title = non_empty(request.title.clone());
    if title.as_deref().is_some_and(|t| t.chars().count() > TITLE_MAX) {
        return Err(AppError::bad_request(
            "TITLE_TOO_LONG",
            format!("Title must be at most {} characters", TITLE_MAX),
        ));
    }

    let institution_id = parse_id(&request.institution_id, "INVALID_INSTITUTION_ID", "institution")?;
    let institution = store
        .find_user(&institution_id)
        .await?
        .filter(|u| u.user_type == UserType::Institution)
        .ok_or_else(|| AppError::not_found("INSTITUTION_NOT_FOUND", "Institution not found"))?;

    let author = load_active_user(store, &claims.sub).await?;
    let author_name = store
        .find_teacher_profile(&author.id)
        .await?
        .and_then(|p| p.full_name)
        .unwrap_or_else(|| author.name.clone());

    let review = Review {
        id: new_id(),
        author_id: author.id,
        author_name,
        institution_id: institution.id,
        rating,
        title,
        comment,
        created_at: Utc::now().timestamp(),
    };

    match store.insert_review(&review).await {
        Ok(()) => {}
        Err(StoreError::Duplicate(_)) => return Err(duplicate_review()),
        Err(e) => return Err(e.into()),
    }

    log::info!("⭐ Review {} ({}★) for institution {}", review.id, rating, review.institution_id);
    Ok(review)
}

pub async fn institution_reviews(
    store: &dyn Store,
    raw_institution_id: &str,
) -> Result<InstitutionReviews, AppError> {
    let institution_id = parse_id(raw_institution_id, "INVALID_INSTITUTION_ID", "institution")?;
    let reviews = store.list_institution_reviews(&institution_id).await?;
    let RatingSummary { average, count } = RatingSummary::from_reviews(&reviews);

    Ok(InstitutionReviews {
        reviews,
        average,
        count,
    })
}
