use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::database::{Store, StoreError};
use crate::models::{Bookmark, BookmarkView, UserType};
use crate::services::auth_service::{load_active_user, require_user_type, Claims};
use crate::services::job_service::load_job;
use crate::utils::validation::{new_id, parse_id};
use crate::utils::AppError;

const CATEGORY_MAX: usize = 50;

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreateBookmarkRequest {
    pub job_id: String,
    pub category: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct BookmarkQuery {
    pub category: Option<String>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct BookmarkStatus {
    pub bookmarked: bool,
    pub category: Option<String>,
}

fn already_bookmarked() -> AppError {
    AppError::conflict("ALREADY_BOOKMARKED", "Job is already bookmarked")
}

/// Trimmed category; blank means uncategorised.
fn normalize_category(raw: Option<&str>) -> Result<Option<String>, AppError> {
    let Some(category) = raw.map(str::trim).filter(|c| !c.is_empty()) else {
        return Ok(None);
    };
    if category.chars().count() > CATEGORY_MAX {
        return Err(AppError::bad_request(
            "CATEGORY_TOO_LONG",
            format!("Category must be at most {} characters", CATEGORY_MAX),
        ));
    }
    Ok(Some(category.to_string()))
}

pub async fn add(
    store: &dyn Store,
    claims: &Claims,
    request: &CreateBookmarkRequest,
) -> Result<Bookmark, AppError> {
    require_user_type(claims, UserType::Teacher)?;
    load_active_user(store, &claims.sub).await?;

    let category = normalize_category(request.category.as_deref())?;
    let job = load_job(store, &request.job_id).await?;

    if store.find_bookmark(&claims.sub, &job.id).await?.is_some() {
        return Err(already_bookmarked());
    }

    let bookmark = Bookmark {
        id: new_id(),
        teacher_id: claims.sub.clone(),
        job_id: job.id,
        category,
        created_at: Utc::now().timestamp(),
    };
    match store.insert_bookmark(&bookmark).await {
        Ok(()) => {}
        Err(StoreError::Duplicate(_)) => return Err(already_bookmarked()),
        Err(e) => return Err(e.into()),
    }

    log::info!("🔖 Bookmark added: {} → {}", claims.sub, bookmark.job_id);
    Ok(bookmark)
}

/// Newest first. Jobs deleted since they were saved come back as `job: null`.
pub async fn list(
    store: &dyn Store,
    claims: &Claims,
    query: &BookmarkQuery,
) -> Result<Vec<BookmarkView>, AppError> {
    require_user_type(claims, UserType::Teacher)?;

    let category = normalize_category(query.category.as_deref())?;
    let bookmarks = store.list_bookmarks(&claims.sub, category.as_deref()).await?;

    let mut views = Vec::with_capacity(bookmarks.len());
    for bookmark in bookmarks {
        let job = store
            .find_job(&bookmark.job_id)
            .await?
            .filter(|job| !job.is_deleted);
        views.push(BookmarkView { bookmark, job });
    }
    Ok(views)
}

pub async fn check(
    store: &dyn Store,
    claims: &Claims,
    raw_job_id: &str,
) -> Result<BookmarkStatus, AppError> {
    require_user_type(claims, UserType::Teacher)?;
    let job_id = parse_id(raw_job_id, "INVALID_JOB_ID", "job")?;

    let bookmark = store.find_bookmark(&claims.sub, &job_id).await?;
    Ok(BookmarkStatus {
        bookmarked: bookmark.is_some(),
        category: bookmark.and_then(|b| b.category),
    })
}

pub async fn remove(store: &dyn Store, claims: &Claims, raw_job_id: &str) -> Result<(), AppError> {
    require_user_type(claims, UserType::Teacher)?;
    load_active_user(store, &claims.sub).await?;
    let job_id = parse_id(raw_job_id, "INVALID_JOB_ID", "job")?;

    if !store.delete_bookmark(&claims.sub, &job_id).await? {
        return Err(AppError::not_found("BOOKMARK_NOT_FOUND", "Bookmark not found"));
    }
    log::info!("🔖 Bookmark removed: {} → {}", claims.sub, job_id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::ResponseError;
    use crate::database::MemoryStore;
    use crate::services::job_service::soft_delete;
    use crate::testing::{claims_for, sample_job, user, RacingStore};

    fn bookmark(job_id: &str, category: Option<&str>) -> CreateBookmarkRequest {
        CreateBookmarkRequest {
            job_id: job_id.to_string(),
            category: category.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_bookmark_lifecycle() {
        let store = MemoryStore::new();
        store.insert_user(&user("t1", UserType::Teacher)).await.unwrap();
        let claims = claims_for("t1", UserType::Teacher);
        let now = Utc::now().timestamp();
        let job = sample_job(&new_id(), "i1", now);
        store.insert_job(&job).await.unwrap();

        let saved = add(&store, &claims, &bookmark(&job.id, Some("  Dream schools "))).await.unwrap();
        assert_eq!(saved.category.as_deref(), Some("Dream schools"));

        let err = add(&store, &claims, &bookmark(&job.id, None)).await.unwrap_err();
        assert_eq!(err.code(), "ALREADY_BOOKMARKED");

        let status = check(&store, &claims, &job.id).await.unwrap();
        assert!(status.bookmarked);
        assert_eq!(status.category.as_deref(), Some("Dream schools"));

        remove(&store, &claims, &job.id).await.unwrap();
        let err = remove(&store, &claims, &job.id).await.unwrap_err();
        assert_eq!(err.code(), "BOOKMARK_NOT_FOUND");
        assert!(!check(&store, &claims, &job.id).await.unwrap().bookmarked);
    }

    #[tokio::test]
    async fn test_category_rules() {
        let store = MemoryStore::new();
        store.insert_user(&user("t1", UserType::Teacher)).await.unwrap();
        let claims = claims_for("t1", UserType::Teacher);
        let job = sample_job(&new_id(), "i1", Utc::now().timestamp());
        store.insert_job(&job).await.unwrap();

        let err = add(&store, &claims, &bookmark(&job.id, Some(&"x".repeat(51)))).await.unwrap_err();
        assert_eq!(err.code(), "CATEGORY_TOO_LONG");

        let saved = add(&store, &claims, &bookmark(&job.id, Some("   "))).await.unwrap();
        assert!(saved.category.is_none());
    }

    #[tokio::test]
    async fn test_list_filters_and_keeps_deleted_jobs() {
        let store = MemoryStore::new();
        store.insert_user(&user("t1", UserType::Teacher)).await.unwrap();
        let claims = claims_for("t1", UserType::Teacher);
        let now = Utc::now().timestamp();
        let kept = sample_job(&new_id(), "i1", now);
        let gone = sample_job(&new_id(), "i1", now);
        store.insert_job(&kept).await.unwrap();
        store.insert_job(&gone).await.unwrap();

        add(&store, &claims, &bookmark(&kept.id, Some("maths"))).await.unwrap();
        add(&store, &claims, &bookmark(&gone.id, None)).await.unwrap();
        soft_delete(&store, gone.clone()).await.unwrap();

        let all = list(&store, &claims, &BookmarkQuery { category: None }).await.unwrap();
        assert_eq!(all.len(), 2);
        let orphan = all.iter().find(|b| b.bookmark.job_id == gone.id).unwrap();
        assert!(orphan.job.is_none());

        let maths = list(&store, &claims, &BookmarkQuery { category: Some("maths".into()) })
            .await
            .unwrap();
        assert_eq!(maths.len(), 1);
        assert!(maths[0].job.is_some());

        // Deleted jobs cannot be bookmarked anew
        store.insert_user(&user("t2", UserType::Teacher)).await.unwrap();
        let err = add(&store, &claims_for("t2", UserType::Teacher), &bookmark(&gone.id, None))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "JOB_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_concurrent_bookmark_maps_to_conflict() {
        let store = RacingStore::new();
        store.insert_user(&user("t1", UserType::Teacher)).await.unwrap();
        let claims = claims_for("t1", UserType::Teacher);
        let job = sample_job(&new_id(), "i1", Utc::now().timestamp());
        store.insert_job(&job).await.unwrap();

        add(&store, &claims, &bookmark(&job.id, None)).await.unwrap();
        let err = add(&store, &claims, &bookmark(&job.id, Some("later"))).await.unwrap_err();
        assert_eq!(err.code(), "ALREADY_BOOKMARKED");
        assert_eq!(err.status_code().as_u16(), 409);
    }

    #[tokio::test]
    async fn test_deactivated_teacher_cannot_change_bookmarks() {
        let store = MemoryStore::new();
        store.insert_user(&user("t1", UserType::Teacher)).await.unwrap();
        let claims = claims_for("t1", UserType::Teacher);
        let job = sample_job(&new_id(), "i1", Utc::now().timestamp());
        store.insert_job(&job).await.unwrap();
        add(&store, &claims, &bookmark(&job.id, None)).await.unwrap();

        store.set_user_active("t1", false, Utc::now().timestamp()).await.unwrap();
        let err = add(&store, &claims, &bookmark(&job.id, None)).await.unwrap_err();
        assert_eq!(err.code(), "ACCOUNT_INACTIVE");
        let err = remove(&store, &claims, &job.id).await.unwrap_err();
        assert_eq!(err.code(), "ACCOUNT_INACTIVE");
        assert!(check(&store, &claims, &job.id).await.unwrap().bookmarked);
    }

    #[tokio::test]
    async fn test_institutions_cannot_bookmark() {
        let store = MemoryStore::new();
        let claims = claims_for("i1", UserType::Institution);
        let err = add(&store, &claims, &bookmark(&new_id(), None)).await.unwrap_err();
        assert_eq!(err.code(), "INVALID_USER_TYPE");
    }
}
