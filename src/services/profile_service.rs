use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};

use crate::database::Store;
use crate::models::{
    InstitutionProfile, InstitutionType, ProfileCompletion, RatingSummary, TeacherProfile,
    UserType,
};
use crate::services::auth_service::{require_user_type, Claims};
use crate::utils::validation::{char_len, clean_list, is_valid_email, is_valid_phone, new_id, non_empty};
use crate::utils::AppError;

const MAX_EXPERIENCE_YEARS: i64 = 60;
const MAX_BIO_LEN: usize = 2000;
const EARLIEST_ESTABLISHED_YEAR: i32 = 1800;

/// Body of `PUT /api/teachers/profile`. Absent fields keep their stored value.
#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct TeacherProfileRequest {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub bio: Option<String>,
    pub subjects: Option<Vec<String>>,
    pub qualifications: Option<Vec<String>>,
    pub experience_years: Option<i64>,
    pub skills: Option<Vec<String>>,
    pub resume_url: Option<String>,
    pub photo_url: Option<String>,
}

/// Body of `PUT /api/institutions/profile`. Absent fields keep their stored value.
#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct InstitutionProfileRequest {
    pub institution_name: Option<String>,
    pub institution_type: Option<InstitutionType>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub website: Option<String>,
    pub description: Option<String>,
    pub established_year: Option<i32>,
    pub logo_url: Option<String>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct TeacherProfileResponse {
    pub profile: Option<TeacherProfile>,
    pub completion: ProfileCompletion,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct InstitutionProfileResponse {
    pub profile: Option<InstitutionProfile>,
    pub completion: ProfileCompletion,
}

/// Public institution page.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct PublicInstitution {
    pub profile: InstitutionProfile,
    pub rating: RatingSummary,
    pub open_jobs: usize,
}

pub async fn teacher_completion(store: &dyn Store, user_id: &str) -> Result<ProfileCompletion, AppError> {
    Ok(store
        .find_teacher_profile(user_id)
        .await?
        .map(|p| p.completion())
        .unwrap_or_else(|| ProfileCompletion::empty(&TeacherProfile::REQUIRED_FIELDS)))
}

pub async fn institution_completion(
    store: &dyn Store,
    user_id: &str,
) -> Result<ProfileCompletion, AppError> {
    Ok(store
        .find_institution_profile(user_id)
        .await?
        .map(|p| p.completion())
        .unwrap_or_else(|| ProfileCompletion::empty(&InstitutionProfile::REQUIRED_FIELDS)))
}

fn check_url(value: &Option<String>, field: &str) -> Result<(), AppError> {
    if let Some(url) = value.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(AppError::bad_request(
                "INVALID_URL",
                format!("{} must be an http(s) URL", field),
            ));
        }
    }
    Ok(())
}

fn check_phone(value: &Option<String>) -> Result<(), AppError> {
    if let Some(phone) = value.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
        if !is_valid_phone(phone) {
            return Err(AppError::bad_request(
                "INVALID_PHONE",
                "Phone number must contain 10 to 15 digits",
            ));
        }
    }
    Ok(())
}

// ==================== TEACHERS ====================

pub async fn get_teacher_profile(
    store: &dyn Store,
    claims: &Claims,
) -> Result<TeacherProfileResponse, AppError> {
    require_user_type(claims, UserType::Teacher)?;

    let profile = store.find_teacher_profile(&claims.sub).await?;
    let completion = profile
        .as_ref()
        .map(TeacherProfile::completion)
        .unwrap_or_else(|| ProfileCompletion::empty(&TeacherProfile::REQUIRED_FIELDS));

    Ok(TeacherProfileResponse { profile, completion })
}

pub async fn update_teacher_profile(
    store: &dyn Store,
    claims: &Claims,
    request: TeacherProfileRequest,
) -> Result<TeacherProfileResponse, AppError> {
    require_user_type(claims, UserType::Teacher)?;

    check_phone(&request.phone)?;
    if let Some(years) = request.experience_years {
        if !(0..=MAX_EXPERIENCE_YEARS).contains(&years) {
            return Err(AppError::bad_request(
                "INVALID_EXPERIENCE",
                format!("Experience must be between 0 and {} years", MAX_EXPERIENCE_YEARS),
            ));
        }
    }
    if let Some(bio) = request.bio.as_deref() {
        if char_len(bio) > MAX_BIO_LEN {
            return Err(AppError::bad_request(
                "BIO_TOO_LONG",
                format!("Bio must be at most {} characters", MAX_BIO_LEN),
            ));
        }
    }
    check_url(&request.resume_url, "resume_url")?;
    check_url(&request.photo_url, "photo_url")?;

    let now = Utc::now().timestamp();
    let mut profile = store
        .find_teacher_profile(&claims.sub)
        .await?
        .unwrap_or_else(|| TeacherProfile {
            id: new_id(),
            user_id: claims.sub.clone(),
            full_name: None,
            phone: None,
            location: None,
            bio: None,
            subjects: Vec::new(),
            qualifications: Vec::new(),
            experience_years: None,
            skills: Vec::new(),
            resume_url: None,
            photo_url: None,
            created_at: now,
            updated_at: now,
        });

    if request.full_name.is_some() {
        profile.full_name = non_empty(request.full_name);
    }
    if request.phone.is_some() {
        profile.phone = non_empty(request.phone);
    }
    if request.location.is_some() {
        profile.location = non_empty(request.location);
    }
    if request.bio.is_some() {
        profile.bio = non_empty(request.bio);
    }
    if let Some(subjects) = request.subjects {
        profile.subjects = clean_list(subjects);
    }
    if let Some(qualifications) = request.qualifications {
        profile.qualifications = clean_list(qualifications);
    }
    if let Some(years) = request.experience_years {
        profile.experience_years = Some(years as u32);
    }
    if let Some(skills) = request.skills {
        profile.skills = clean_list(skills);
    }
    if request.resume_url.is_some() {
        profile.resume_url = non_empty(request.resume_url);
    }
    if request.photo_url.is_some() {
        profile.photo_url = non_empty(request.photo_url);
    }
    profile.updated_at = now;

    store.save_teacher_profile(&profile).await?;

    let completion = profile.completion();
    log::info!(
        "👩‍🏫 Teacher profile saved: {} ({}% complete)",
        claims.sub,
        completion.percentage
    );

    Ok(TeacherProfileResponse {
        profile: Some(profile),
        completion,
    })
}

// ==================== INSTITUTIONS ====================

pub async fn get_institution_profile(
    store: &dyn Store,
    claims: &Claims,
) -> Result<InstitutionProfileResponse, AppError> {
    require_user_type(claims, UserType::Institution)?;

    let profile = store.find_institution_profile(&claims.sub).await?;
    let completion = profile
        .as_ref()
        .map(InstitutionProfile::completion)
        .unwrap_or_else(|| ProfileCompletion::empty(&InstitutionProfile::REQUIRED_FIELDS));

    Ok(InstitutionProfileResponse { profile, completion })
}

pub async fn update_institution_profile(
    store: &dyn Store,
    claims: &Claims,
    request: InstitutionProfileRequest,
) -> Result<InstitutionProfileResponse, AppError> {
    require_user_type(claims, UserType::Institution)?;

    check_phone(&request.contact_phone)?;
    if let Some(email) = request.contact_email.as_deref().map(str::trim).filter(|e| !e.is_empty()) {
        if !is_valid_email(email) {
            return Err(AppError::bad_request("INVALID_EMAIL", "Contact email is not valid"));
        }
    }
    if let Some(year) = request.established_year {
        let current = Utc::now().year();
        if !(EARLIEST_ESTABLISHED_YEAR..=current).contains(&year) {
            return Err(AppError::bad_request(
                "INVALID_ESTABLISHED_YEAR",
                format!("Established year must be between {} and {}", EARLIEST_ESTABLISHED_YEAR, current),
            ));
        }
    }
    check_url(&request.website, "website")?;
    check_url(&request.logo_url, "logo_url")?;

    let now = Utc::now().timestamp();
    let mut profile = store
        .find_institution_profile(&claims.sub)
        .await?
        .unwrap_or_else(|| InstitutionProfile {
            id: new_id(),
            user_id: claims.sub.clone(),
            institution_name: None,
            institution_type: None,
            address: None,
            city: None,
            state: None,
            contact_email: None,
            contact_phone: None,
            website: None,
            description: None,
            established_year: None,
            logo_url: None,
            created_at: now,
            updated_at: now,
        });

    if request.institution_name.is_some() {
        profile.institution_name = non_empty(request.institution_name);
    }
    if request.institution_type.is_some() {
        profile.institution_type = request.institution_type;
    }
    if request.address.is_some() {
        profile.address = non_empty(request.address);
    }
    if request.city.is_some() {
        profile.city = non_empty(request.city);
    }
    if request.state.is_some() {
        profile.state = non_empty(request.state);
    }
    if request.contact_email.is_some() {
        profile.contact_email = non_empty(request.contact_email).map(|e| e.to_lowercase());
    }
    if request.contact_phone.is_some() {
        profile.contact_phone = non_empty(request.contact_phone);
    }
    if request.website.is_some() {
        profile.website = non_empty(request.website);
    }
    if request.description.is_some() {
        profile.description = non_empty(request.description);
    }
    if request.established_year.is_some() {
        profile.established_year = request.established_year;
    }
    if request.logo_url.is_some() {
        profile.logo_url = non_empty(request.logo_url);
    }
    profile.updated_at = now;

    store.save_institution_profile(&profile).await?;

    let completion = profile.completion();
    log::info!(
        "🏫 Institution profile saved: {} ({}% complete)",
        claims.sub,
        completion.percentage
    );

    Ok(InstitutionProfileResponse {
        profile: Some(profile),
        completion,
    })
}

pub async fn public_institution(
    store: &dyn Store,
    user_id: &str,
) -> Result<PublicInstitution, AppError> {
    let not_found = || AppError::not_found("INSTITUTION_NOT_FOUND", "Institution not found");

    let user = store.find_user(user_id).await?.ok_or_else(not_found)?;
    if user.user_type != UserType::Institution || !user.is_active {
        return Err(not_found());
    }
    let profile = store
        .find_institution_profile(user_id)
        .await?
        .ok_or_else(not_found)?;

    let reviews = store.list_institution_reviews(user_id).await?;
    let now = Utc::now().timestamp();
    let open_jobs = store
        .list_institution_jobs(user_id)
        .await?
        .iter()
        .filter(|job| job.is_open(now))
        .count();

    Ok(PublicInstitution {
        profile,
        rating: RatingSummary::from_reviews(&reviews),
        open_jobs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use crate::testing::{claims_for, seed_institution, user};

    #[tokio::test]
    async fn test_teacher_profile_upsert_merges_fields() {
        let store = MemoryStore::new();
        let claims = claims_for("t1", UserType::Teacher);

        let first = update_teacher_profile(
            &store,
            &claims,
            TeacherProfileRequest {
                full_name: Some("  Meera Iyer ".into()),
                subjects: Some(vec!["Physics".into(), " ".into()]),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert!(!first.completion.is_complete);
        assert_eq!(first.profile.as_ref().unwrap().subjects, vec!["Physics"]);

        let second = update_teacher_profile(
            &store,
            &claims,
            TeacherProfileRequest {
                phone: Some("9876543210".into()),
                location: Some("Pune".into()),
                qualifications: Some(vec!["B.Ed".into()]),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let profile = second.profile.unwrap();
        assert_eq!(profile.full_name.as_deref(), Some("Meera Iyer"));
        assert!(second.completion.is_complete);
        assert_eq!(profile.id, first.profile.unwrap().id);
    }

    #[tokio::test]
    async fn test_teacher_profile_validation() {
        let store = MemoryStore::new();
        let claims = claims_for("t1", UserType::Teacher);

        let err = update_teacher_profile(
            &store,
            &claims,
            TeacherProfileRequest {
                phone: Some("12345".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code(), "INVALID_PHONE");

        let err = update_teacher_profile(
            &store,
            &claims,
            TeacherProfileRequest {
                experience_years: Some(61),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code(), "INVALID_EXPERIENCE");
    }

    #[tokio::test]
    async fn test_profile_endpoints_check_user_type() {
        let store = MemoryStore::new();
        let teacher = claims_for("t1", UserType::Teacher);
        let err = get_institution_profile(&store, &teacher).await.unwrap_err();
        assert_eq!(err.code(), "INVALID_USER_TYPE");

        let empty = get_teacher_profile(&store, &teacher).await.unwrap();
        assert!(empty.profile.is_none());
        assert_eq!(empty.completion.missing_fields.len(), 5);
    }

    #[tokio::test]
    async fn test_public_institution() {
        let store = MemoryStore::new();
        seed_institution(&store, "i1").await;
        store.insert_user(&user("t1", UserType::Teacher)).await.unwrap();

        let page = public_institution(&store, "i1").await.unwrap();
        assert_eq!(page.rating.count, 0);
        assert_eq!(page.open_jobs, 0);

        let err = public_institution(&store, "t1").await.unwrap_err();
        assert_eq!(err.code(), "INSTITUTION_NOT_FOUND");
    }
}
