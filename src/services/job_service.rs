use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::database::Store;
use crate::models::{InstitutionSummary, Job, JobDetail, JobQuery, JobType, Pagination, UserType};
use crate::services::auth_service::{load_active_user, require_user_type, Claims};
use crate::services::subscription_service;
use crate::utils::validation::{bounded_text, clean_list, new_id, parse_id};
use crate::utils::{AppError, ACTION_COMPLETE_PROFILE, ACTION_UPGRADE_SUBSCRIPTION};

const TITLE_MIN: usize = 5;
const TITLE_MAX: usize = 150;
const DESCRIPTION_MIN: usize = 30;
const DESCRIPTION_MAX: usize = 5000;
const MAX_EXPERIENCE_REQUIRED: u32 = 60;
const DAY_SECS: i64 = 86_400;
const DEFAULT_EXPIRY_DAYS: i64 = 30;
const MAX_EXPIRY_DAYS: i64 = 180;

/// Body of `POST /api/jobs` and `PUT /api/jobs/{id}`.
///
/// On create the core fields are required; on update every field is optional
/// and only the ones sent are changed.
#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct JobRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub subject: Option<String>,
    pub location: Option<String>,
    pub job_type: Option<JobType>,
    pub experience_required: Option<u32>,
    pub salary_min: Option<i64>,
    pub salary_max: Option<i64>,
    pub qualifications: Option<Vec<String>>,
    pub skills: Option<Vec<String>>,
    pub vacancies: Option<u32>,
    /// Unix seconds
    #[serde(rename = "expiresAt")]
    pub expires_at: Option<i64>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct JobSearchResponse {
    pub jobs: Vec<Job>,
    pub pagination: Pagination,
}

fn required_text(value: Option<&str>, code: &'static str, field: &str) -> Result<String, AppError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| AppError::bad_request(code, format!("{} is required", field)))
}

fn check_expiry(expires_at: i64, now: i64) -> Result<(), AppError> {
    if expires_at <= now {
        return Err(AppError::bad_request("INVALID_EXPIRY", "Expiry date must be in the future"));
    }
    if expires_at > now + MAX_EXPIRY_DAYS * DAY_SECS {
        return Err(AppError::bad_request(
            "INVALID_EXPIRY",
            format!("Expiry date must be within {} days", MAX_EXPIRY_DAYS),
        ));
    }
    Ok(())
}

/// Applies the fields present in `request` to `job`, validating each one.
fn apply_request(job: &mut Job, request: JobRequest, now: i64) -> Result<(), AppError> {
    if let Some(title) = request.title.as_deref() {
        job.title = bounded_text(title, TITLE_MIN, TITLE_MAX, "TITLE_TOO_SHORT", "TITLE_TOO_LONG", "Title")?;
    }
    if let Some(description) = request.description.as_deref() {
        job.description = bounded_text(
            description,
            DESCRIPTION_MIN,
            DESCRIPTION_MAX,
            "DESCRIPTION_TOO_SHORT",
            "DESCRIPTION_TOO_LONG",
            "Description",
        )?;
    }
    if request.subject.is_some() {
        job.subject = required_text(request.subject.as_deref(), "MISSING_SUBJECT", "Subject")?;
    }
    if request.location.is_some() {
        job.location = required_text(request.location.as_deref(), "MISSING_LOCATION", "Location")?;
    }
    if let Some(job_type) = request.job_type {
        job.job_type = job_type;
    }
    if let Some(experience) = request.experience_required {
        if experience > MAX_EXPERIENCE_REQUIRED {
            return Err(AppError::bad_request(
                "INVALID_EXPERIENCE",
                format!("Required experience must be at most {} years", MAX_EXPERIENCE_REQUIRED),
            ));
        }
        job.experience_required = experience;
    }
    if request.salary_min.is_some() {
        job.salary_min = request.salary_min;
    }
    if request.salary_max.is_some() {
        job.salary_max = request.salary_max;
    }
    if let Some(qualifications) = request.qualifications {
        job.qualifications = clean_list(qualifications);
    }
    if let Some(skills) = request.skills {
        job.skills = clean_list(skills);
    }
    if let Some(vacancies) = request.vacancies {
        if vacancies < 1 {
            return Err(AppError::bad_request("INVALID_VACANCIES", "At least one vacancy is required"));
        }
        job.vacancies = vacancies;
    }
    if let Some(expires_at) = request.expires_at {
        check_expiry(expires_at, now)?;
        job.expires_at = expires_at;
    }
    if let Some(is_active) = request.is_active {
        job.is_active = is_active;
    }

    let negative = |v: Option<i64>| v.is_some_and(|s| s < 0);
    let inverted = matches!((job.salary_min, job.salary_max), (Some(min), Some(max)) if min > max);
    if negative(job.salary_min) || negative(job.salary_max) || inverted {
        return Err(AppError::bad_request(
            "INVALID_SALARY_RANGE",
            "Salary range must be non-negative with minimum not above maximum",
        ));
    }

    Ok(())
}

/// Rejects the post when the institution is at its plan's active-job cap.
async fn ensure_post_capacity(
    store: &dyn Store,
    institution_id: &str,
    free_limit: u64,
    now: i64,
) -> Result<(), AppError> {
    let Some(limit) =
        subscription_service::job_post_limit(store, institution_id, free_limit, now).await?
    else {
        return Ok(());
    };

    let open = store.count_open_institution_jobs(institution_id, now).await?;
    if open >= limit {
        return Err(AppError::forbidden(
            "JOB_POST_LIMIT_REACHED",
            format!("Your plan allows {} active job posts", limit),
        )
        .with_action(ACTION_UPGRADE_SUBSCRIPTION)
        .with_details(serde_json::json!({ "limit": limit, "active": open })));
    }
    Ok(())
}

/// Loads a job by path id; deleted jobs are reported as missing.
pub async fn load_job(store: &dyn Store, raw_id: &str) -> Result<Job, AppError> {
    let id = parse_id(raw_id, "INVALID_JOB_ID", "job")?;
    store
        .find_job(&id)
        .await?
        .filter(|job| !job.is_deleted)
        .ok_or_else(|| AppError::not_found("JOB_NOT_FOUND", "Job not found"))
}

/// Loads a job the caller owns.
pub async fn load_owned_job(store: &dyn Store, claims: &Claims, raw_id: &str) -> Result<Job, AppError> {
    require_user_type(claims, UserType::Institution)?;
    let job = load_job(store, raw_id).await?;
    if job.institution_id != claims.sub {
        return Err(AppError::forbidden("NOT_JOB_OWNER", "You do not own this job"));
    }
    Ok(job)
}

pub async fn create_job(
    store: &dyn Store,
    free_limit: u64,
    claims: &Claims,
    request: JobRequest,
) -> Result<Job, AppError> {
    require_user_type(claims, UserType::Institution)?;
    load_active_user(store, &claims.sub).await?;

    let complete = store
        .find_institution_profile(&claims.sub)
        .await?
        .map(|p| p.completion())
        .filter(|c| c.is_complete);
    if complete.is_none() {
        return Err(AppError::unprocessable(
            "PROFILE_INCOMPLETE",
            "Complete your institution profile before posting jobs",
        )
        .with_action(ACTION_COMPLETE_PROFILE));
    }

    let now = Utc::now().timestamp();
    ensure_post_capacity(store, &claims.sub, free_limit, now).await?;

    let mut job = Job {
        id: new_id(),
        institution_id: claims.sub.clone(),
        title: required_text(request.title.as_deref(), "MISSING_TITLE", "Title")?,
        description: required_text(request.description.as_deref(), "MISSING_DESCRIPTION", "Description")?,
        subject: required_text(request.subject.as_deref(), "MISSING_SUBJECT", "Subject")?,
        location: required_text(request.location.as_deref(), "MISSING_LOCATION", "Location")?,
        job_type: request
            .job_type
            .ok_or_else(|| AppError::bad_request("MISSING_JOB_TYPE", "Job type is required"))?,
        experience_required: 0,
        salary_min: None,
        salary_max: None,
        qualifications: Vec::new(),
        skills: Vec::new(),
        vacancies: 1,
        is_active: true,
        is_deleted: false,
        expires_at: now + DEFAULT_EXPIRY_DAYS * DAY_SECS,
        applications_count: 0,
        created_at: now,
        updated_at: now,
    };
    // New posts always start active
    let request = JobRequest {
        is_active: None,
        ..request
    };
    apply_request(&mut job, request, now)?;

    store.insert_job(&job).await?;
    log::info!("📢 Job posted: {} by {} ({})", job.id, claims.sub, job.title);

    Ok(job)
}

pub async fn search_jobs(store: &dyn Store, query: &JobQuery) -> Result<JobSearchResponse, AppError> {
    let now = Utc::now().timestamp();
    let (jobs, total) = store.search_jobs(query, now).await?;

    Ok(JobSearchResponse {
        jobs,
        pagination: Pagination::new(query.page(), query.limit(), total),
    })
}

pub async fn get_job(store: &dyn Store, raw_id: &str) -> Result<JobDetail, AppError> {
    let job = load_job(store, raw_id).await?;
    let institution = store
        .find_institution_profile(&job.institution_id)
        .await?
        .as_ref()
        .map(InstitutionSummary::from);

    Ok(JobDetail { job, institution })
}

pub async fn my_jobs(store: &dyn Store, claims: &Claims) -> Result<Vec<Job>, AppError> {
    require_user_type(claims, UserType::Institution)?;
    Ok(store.list_institution_jobs(&claims.sub).await?)
}

pub async fn update_job(
    store: &dyn Store,
    free_limit: u64,
    claims: &Claims,
    raw_id: &str,
    request: JobRequest,
) -> Result<Job, AppError> {
    let mut job = load_owned_job(store, claims, raw_id).await?;
    let now = Utc::now().timestamp();

    // Any change that puts a closed job back on the board counts against the cap
    let was_open = job.is_open(now);
    apply_request(&mut job, request, now)?;
    if !was_open && job.is_open(now) {
        ensure_post_capacity(store, &claims.sub, free_limit, now).await?;
    }

    job.updated_at = now;
    store.replace_job(&job).await?;
    log::info!("✏️  Job updated: {} (active: {})", job.id, job.is_active);

    Ok(job)
}

/// Soft delete: the job disappears everywhere but applications keep pointing at it.
pub async fn soft_delete(store: &dyn Store, mut job: Job) -> Result<(), AppError> {
    job.is_deleted = true;
    job.is_active = false;
    job.updated_at = Utc::now().timestamp();
    store.replace_job(&job).await?;
    Ok(())
}

pub async fn delete_job(store: &dyn Store, claims: &Claims, raw_id: &str) -> Result<(), AppError> {
    let job = load_owned_job(store, claims, raw_id).await?;
    let id = job.id.clone();
    soft_delete(store, job).await?;
    log::info!("🗑️  Job deleted: {} by {}", id, claims.sub);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use crate::testing::{claims_for, sample_job, seed_institution, user};

    fn post(title: &str) -> JobRequest {
        JobRequest {
            title: Some(title.to_string()),
            description: Some("Teach physics to senior secondary students, labs included.".into()),
            subject: Some("Physics".into()),
            location: Some("Bengaluru".into()),
            job_type: Some(JobType::FullTime),
            salary_min: Some(25_000),
            salary_max: Some(40_000),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_job_defaults() {
        let store = MemoryStore::new();
        seed_institution(&store, "i1").await;
        let claims = claims_for("i1", UserType::Institution);

        let job = create_job(&store, 3, &claims, post("Physics Teacher")).await.unwrap();
        let now = Utc::now().timestamp();
        assert!(job.is_open(now));
        assert_eq!(job.vacancies, 1);
        assert!(job.expires_at > now + 29 * DAY_SECS);
        assert!(job.expires_at <= now + 30 * DAY_SECS);
    }

    #[tokio::test]
    async fn test_create_job_requires_complete_profile() {
        let store = MemoryStore::new();
        store.insert_user(&user("i1", UserType::Institution)).await.unwrap();
        let claims = claims_for("i1", UserType::Institution);

        let err = create_job(&store, 3, &claims, post("Physics Teacher")).await.unwrap_err();
        assert_eq!(err.code(), "PROFILE_INCOMPLETE");
        assert_eq!(err.action(), Some(ACTION_COMPLETE_PROFILE));
    }

    #[tokio::test]
    async fn test_create_job_enforces_free_limit() {
        let store = MemoryStore::new();
        seed_institution(&store, "i1").await;
        let claims = claims_for("i1", UserType::Institution);

        create_job(&store, 1, &claims, post("Physics Teacher")).await.unwrap();
        let err = create_job(&store, 1, &claims, post("Chemistry Teacher")).await.unwrap_err();
        assert_eq!(err.code(), "JOB_POST_LIMIT_REACHED");
        assert_eq!(err.action(), Some(ACTION_UPGRADE_SUBSCRIPTION));
    }

    #[tokio::test]
    async fn test_job_field_validation() {
        let store = MemoryStore::new();
        seed_institution(&store, "i1").await;
        let claims = claims_for("i1", UserType::Institution);

        let err = create_job(&store, 3, &claims, post("Tea")).await.unwrap_err();
        assert_eq!(err.code(), "TITLE_TOO_SHORT");

        let mut inverted = post("Physics Teacher");
        inverted.salary_min = Some(50_000);
        let err = create_job(&store, 3, &claims, inverted).await.unwrap_err();
        assert_eq!(err.code(), "INVALID_SALARY_RANGE");

        let mut past = post("Physics Teacher");
        past.expires_at = Some(Utc::now().timestamp() - 10);
        let err = create_job(&store, 3, &claims, past).await.unwrap_err();
        assert_eq!(err.code(), "INVALID_EXPIRY");

        let mut far = post("Physics Teacher");
        far.expires_at = Some(Utc::now().timestamp() + 181 * DAY_SECS);
        let err = create_job(&store, 3, &claims, far).await.unwrap_err();
        assert_eq!(err.code(), "INVALID_EXPIRY");

        let mut none = post("Physics Teacher");
        none.vacancies = Some(0);
        let err = create_job(&store, 3, &claims, none).await.unwrap_err();
        assert_eq!(err.code(), "INVALID_VACANCIES");

        let teacher = claims_for("t1", UserType::Teacher);
        let err = create_job(&store, 3, &teacher, post("Physics Teacher")).await.unwrap_err();
        assert_eq!(err.code(), "INVALID_USER_TYPE");
    }

    #[tokio::test]
    async fn test_update_and_delete_are_owner_only() {
        let store = MemoryStore::new();
        seed_institution(&store, "i1").await;
        seed_institution(&store, "i2").await;
        let owner = claims_for("i1", UserType::Institution);
        let other = claims_for("i2", UserType::Institution);

        let job = create_job(&store, 3, &owner, post("Physics Teacher")).await.unwrap();

        let err = update_job(&store, 3, &other, &job.id, JobRequest::default()).await.unwrap_err();
        assert_eq!(err.code(), "NOT_JOB_OWNER");

        let closed = update_job(
            &store,
            3,
            &owner,
            &job.id,
            JobRequest {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert!(!closed.is_active);
        assert_eq!(closed.title, "Physics Teacher");

        delete_job(&store, &owner, &job.id).await.unwrap();
        let err = get_job(&store, &job.id).await.unwrap_err();
        assert_eq!(err.code(), "JOB_NOT_FOUND");
        assert!(my_jobs(&store, &owner).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reopening_respects_post_limit() {
        let store = MemoryStore::new();
        seed_institution(&store, "i1").await;
        let claims = claims_for("i1", UserType::Institution);
        let now = Utc::now().timestamp();

        // Lapsed but still flagged active: the sweeper has not closed it yet
        let mut lapsed = create_job(&store, 1, &claims, post("Physics Teacher")).await.unwrap();
        lapsed.expires_at = now - 1;
        store.replace_job(&lapsed).await.unwrap();
        create_job(&store, 1, &claims, post("Chemistry Teacher")).await.unwrap();

        let extend = || JobRequest {
            expires_at: Some(now + DAY_SECS),
            ..Default::default()
        };
        let err = update_job(&store, 1, &claims, &lapsed.id, extend()).await.unwrap_err();
        assert_eq!(err.code(), "JOB_POST_LIMIT_REACHED");
        assert_eq!(store.count_open_institution_jobs("i1", now).await.unwrap(), 1);

        let err = update_job(
            &store,
            1,
            &claims,
            &lapsed.id,
            JobRequest {
                is_active: Some(true),
                ..extend()
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code(), "JOB_POST_LIMIT_REACHED");

        // With room under the cap the same extension goes through
        let reopened = update_job(&store, 2, &claims, &lapsed.id, extend()).await.unwrap();
        assert!(reopened.is_open(now));
    }

    #[tokio::test]
    async fn test_editing_an_open_job_skips_limit_check() {
        let store = MemoryStore::new();
        seed_institution(&store, "i1").await;
        let claims = claims_for("i1", UserType::Institution);

        let job = create_job(&store, 1, &claims, post("Physics Teacher")).await.unwrap();
        let updated = update_job(
            &store,
            1,
            &claims,
            &job.id,
            JobRequest {
                title: Some("Senior Physics Teacher".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.title, "Senior Physics Teacher");
    }

    #[tokio::test]
    async fn test_search_only_lists_open_jobs() {
        let store = MemoryStore::new();
        let now = Utc::now().timestamp();

        store.insert_job(&sample_job(&new_id(), "i1", now)).await.unwrap();
        let mut expired = sample_job(&new_id(), "i1", now - 10);
        expired.expires_at = now - 1;
        store.insert_job(&expired).await.unwrap();
        let mut hidden = sample_job(&new_id(), "i1", now);
        hidden.is_active = false;
        store.insert_job(&hidden).await.unwrap();

        let result = search_jobs(
            &store,
            &JobQuery {
                q: Some("MATHEMATICS".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(result.jobs.len(), 1);
        assert_eq!(result.pagination.total, 1);
        assert_eq!(result.pagination.pages, 1);
    }

    #[tokio::test]
    async fn test_get_job_includes_institution() {
        let store = MemoryStore::new();
        seed_institution(&store, "i1").await;
        let job = sample_job(&new_id(), "i1", Utc::now().timestamp());
        store.insert_job(&job).await.unwrap();

        let detail = get_job(&store, &job.id).await.unwrap();
        assert_eq!(
            detail.institution.unwrap().institution_name.as_deref(),
            Some("Lakeview Public School")
        );

        let err = get_job(&store, "not-a-uuid").await.unwrap_err();
        assert_eq!(err.code(), "INVALID_JOB_ID");
    }
}
