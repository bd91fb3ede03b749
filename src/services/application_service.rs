use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;

use crate::database::{Store, StoreError};
use crate::models::{
    Application, ApplicationStatus, ApplicationView, NotificationKind, TeacherProfile, UserType,
};
use crate::services::auth_service::{load_active_user, require_user_type, Claims};
use crate::services::job_service::load_owned_job;
use crate::services::notification_service;
use crate::utils::validation::{bounded_text, new_id, parse_id};
use crate::utils::{AppError, ACTION_COMPLETE_PROFILE};

pub const COVER_LETTER_MIN: usize = 20;
pub const COVER_LETTER_MAX: usize = 3000;
const STATUS_NOTE_MAX: usize = 500;

#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct SubmitApplicationRequest {
    pub job_id: Option<String>,
    #[serde(rename = "coverLetter", alias = "cover_letter")]
    pub cover_letter: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateStatusRequest {
    pub status: String,
    pub note: Option<String>,
}

fn duplicate_application() -> AppError {
    AppError::conflict("DUPLICATE_APPLICATION", "You have already applied to this job")
}

fn profile_gate(code: &'static str, message: &str) -> AppError {
    AppError::unprocessable(code, message).with_action(ACTION_COMPLETE_PROFILE)
}

/// Validates the request body and returns `(job_id, cover_letter)`.
fn validate_submission(request: &SubmitApplicationRequest) -> Result<(String, String), AppError> {
    let raw_job_id = request
        .job_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::bad_request("MISSING_JOB_ID", "Job id is required"))?;
    let job_id = parse_id(raw_job_id, "INVALID_JOB_ID", "job")?;

    let cover_letter = request
        .cover_letter
        .as_deref()
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::bad_request("MISSING_COVER_LETTER", "Cover letter is required"))?;
    let cover_letter = bounded_text(
        cover_letter,
        COVER_LETTER_MIN,
        COVER_LETTER_MAX,
        "COVER_LETTER_TOO_SHORT",
        "COVER_LETTER_TOO_LONG",
        "Cover letter",
    )?;

    Ok((job_id, cover_letter))
}

/// Profile gate: required fields filled and a resume on file.
fn check_profile(profile: Option<TeacherProfile>) -> Result<TeacherProfile, AppError> {
    let profile = profile.ok_or_else(|| {
        profile_gate("PROFILE_NOT_FOUND", "Create your teacher profile before applying")
    })?;

    let completion = profile.completion();
    if !completion.is_complete {
        return Err(profile_gate(
            "PROFILE_INCOMPLETE",
            "Complete your teacher profile before applying",
        )
        .with_details(serde_json::json!({
            "missing_fields": completion.missing_fields,
            "percentage": completion.percentage,
        })));
    }
    if !profile.has_resume() {
        return Err(profile_gate("RESUME_REQUIRED", "Upload your resume before applying"));
    }
    Ok(profile)
}

// ==================== SUBMISSION ====================

/// Runs the full submission pipeline for `user_id`.
///
/// The insert, the counter increment and the notification are separate
/// writes; only the insert is guarded by the unique (job, teacher) index.
pub async fn submit_application(
    store: &Arc<dyn Store>,
    user_id: &str,
    request: &SubmitApplicationRequest,
) -> Result<Application, AppError> {
    let (job_id, cover_letter) = validate_submission(request)?;

    let user = store
        .find_user(user_id)
        .await?
        .ok_or_else(|| AppError::not_found("USER_NOT_FOUND", "User not found"))?;
    if user.user_type != UserType::Teacher {
        return Err(AppError::forbidden(
            "INVALID_USER_TYPE",
            "Only teachers can apply to jobs",
        ));
    }
    if !user.is_active {
        return Err(AppError::forbidden("ACCOUNT_INACTIVE", "Account is inactive"));
    }

    let profile = check_profile(store.find_teacher_profile(&user.id).await?)?;

    let job = store
        .find_job(&job_id)
        .await?
        .ok_or_else(|| AppError::not_found("JOB_NOT_FOUND", "Job not found"))?;
    if job.is_deleted {
        return Err(AppError::gone("JOB_DELETED", "This job has been removed"));
    }
    if !job.is_active {
        return Err(AppError::bad_request(
            "JOB_INACTIVE",
            "This job is no longer accepting applications",
        ));
    }
    let now = Utc::now().timestamp();
    if job.is_expired(now) {
        return Err(AppError::gone("JOB_EXPIRED", "This job posting has expired"));
    }
    let institution = store.find_institution_profile(&job.institution_id).await?;

    if store.find_application_for(&job.id, &user.id).await?.is_some() {
        return Err(duplicate_application());
    }

    let application = Application {
        id: new_id(),
        job_id: job.id.clone(),
        teacher_id: user.id.clone(),
        institution_id: job.institution_id.clone(),
        cover_letter,
        teacher_name: profile.full_name.clone().or_else(|| Some(user.name.clone())),
        resume_url: profile.resume_url.clone(),
        status: ApplicationStatus::Pending,
        status_note: None,
        applied_at: now,
        updated_at: now,
    };

    match store.insert_application(&application).await {
        Ok(()) => {}
        // Concurrent submission won the unique index
        Err(StoreError::Duplicate(_)) => return Err(duplicate_application()),
        Err(e) => return Err(e.into()),
    }
    store.increment_applications_count(&job.id).await?;

    log::info!(
        "📨 Application {} submitted: teacher {} → job {} ({})",
        application.id,
        user.id,
        job.id,
        institution.as_ref().map(|i| i.display_name()).unwrap_or("unknown institution")
    );

    let applicant = application.teacher_name.as_deref().unwrap_or("A teacher");
    notification_service::dispatch_detached(
        store.clone(),
        notification_service::build(
            &job.institution_id,
            NotificationKind::ApplicationReceived,
            "New application received",
            format!("{} applied for {}", applicant, job.title),
            Some(format!("/jobs/{}/applications", job.id)),
            Some(application.id.clone()),
        ),
    );

    Ok(application)
}

// ==================== LISTINGS ====================

pub async fn my_applications(
    store: &dyn Store,
    claims: &Claims,
) -> Result<Vec<ApplicationView>, AppError> {
    require_user_type(claims, UserType::Teacher)?;

    let applications = store.list_teacher_applications(&claims.sub).await?;
    let mut views = Vec::with_capacity(applications.len());
    for application in applications {
        let job_title = store
            .find_job(&application.job_id)
            .await?
            .map(|job| job.title);
        views.push(ApplicationView {
            application,
            job_title,
        });
    }
    Ok(views)
}

pub async fn job_applications(
    store: &dyn Store,
    claims: &Claims,
    raw_job_id: &str,
) -> Result<Vec<Application>, AppError> {
    let job = load_owned_job(store, claims, raw_job_id).await?;
    Ok(store.list_job_applications(&job.id).await?)
}

async fn load_application(store: &dyn Store, raw_id: &str) -> Result<Application, AppError> {
    let id = parse_id(raw_id, "INVALID_APPLICATION_ID", "application")?;
    store
        .find_application(&id)
        .await?
        .ok_or_else(|| AppError::not_found("APPLICATION_NOT_FOUND", "Application not found"))
}

fn parse_status(raw: &str) -> Option<ApplicationStatus> {
    let raw = raw.trim().to_ascii_lowercase();
    ApplicationStatus::ALL
        .into_iter()
        .find(|status| status.as_str() == raw)
}

// ==================== STATUS CHANGES ====================

pub async fn update_status(
    store: &Arc<dyn Store>,
    claims: &Claims,
    raw_id: &str,
    request: &UpdateStatusRequest,
) -> Result<Application, AppError> {
    require_user_type(claims, UserType::Institution)?;

    let next = parse_status(&request.status)
        .ok_or_else(|| AppError::bad_request("INVALID_STATUS", "Unknown application status"))?;
    let note = match request.note.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        Some(note) if note.chars().count() > STATUS_NOTE_MAX => {
            return Err(AppError::bad_request(
                "NOTE_TOO_LONG",
                format!("Note must be at most {} characters", STATUS_NOTE_MAX),
            ))
        }
        other => other.map(str::to_string),
    };

    load_active_user(store.as_ref(), &claims.sub).await?;
    let mut application = load_application(store.as_ref(), raw_id).await?;
    if application.institution_id != claims.sub {
        return Err(AppError::forbidden("NOT_JOB_OWNER", "You do not own this job"));
    }
    if !application.status.can_review_to(next) {
        return Err(AppError::bad_request(
            "INVALID_STATUS_TRANSITION",
            format!(
                "Cannot move an application from {} to {}",
                application.status.as_str(),
                next.as_str()
            ),
        ));
    }

    application.status = next;
    if note.is_some() {
        application.status_note = note;
    }
    application.updated_at = Utc::now().timestamp();
    store.replace_application(&application).await?;
    log::info!("📋 Application {} → {}", application.id, next.as_str());

    let job_title = store
        .find_job(&application.job_id)
        .await?
        .map(|job| job.title)
        .unwrap_or_else(|| "a job".to_string());
    notification_service::dispatch_detached(
        store.clone(),
        notification_service::build(
            &application.teacher_id,
            NotificationKind::ApplicationStatus,
            "Application status updated",
            format!("Your application for {} is now {}", job_title, next.as_str()),
            Some("/applications".to_string()),
            Some(application.id.clone()),
        ),
    );

    Ok(application)
}

/// Teacher pulls an application back. The job's application count is left as is.
pub async fn withdraw(
    store: &dyn Store,
    claims: &Claims,
    raw_id: &str,
) -> Result<Application, AppError> {
    require_user_type(claims, UserType::Teacher)?;
    load_active_user(store, &claims.sub).await?;

    let mut application = load_application(store, raw_id).await?;
    if application.teacher_id != claims.sub {
        return Err(AppError::forbidden(
            "NOT_APPLICATION_OWNER",
            "You can only withdraw your own applications",
        ));
    }
    if !application.status.can_withdraw() {
        return Err(AppError::bad_request(
            "INVALID_STATUS_TRANSITION",
            format!("Cannot withdraw an application that is {}", application.status.as_str()),
        ));
    }

    application.status = ApplicationStatus::Withdrawn;
    application.updated_at = Utc::now().timestamp();
    store.replace_application(&application).await?;
    log::info!("↩️  Application {} withdrawn by {}", application.id, claims.sub);

    Ok(application)
}
