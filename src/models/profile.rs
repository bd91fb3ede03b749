use serde::{Deserialize, Serialize};

/// Result of the profile completion check gating applications and job posts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ProfileCompletion {
    /// Share of all profile fields that are filled, rounded down.
    pub percentage: u8,
    /// True when every required field is filled.
    pub is_complete: bool,
    /// Required fields still missing.
    pub missing_fields: Vec<String>,
}

impl ProfileCompletion {
    fn from_checks(checks: &[(&str, bool, bool)]) -> Self {
        let filled = checks.iter().filter(|(_, present, _)| *present).count();
        let percentage = if checks.is_empty() {
            0
        } else {
            (filled * 100 / checks.len()) as u8
        };
        let missing_fields: Vec<String> = checks
            .iter()
            .filter(|(_, present, required)| *required && !*present)
            .map(|(name, _, _)| name.to_string())
            .collect();

        ProfileCompletion {
            percentage,
            is_complete: missing_fields.is_empty(),
            missing_fields,
        }
    }

    /// Completion for a user who never saved a profile.
    pub fn empty(required: &[&str]) -> Self {
        ProfileCompletion {
            percentage: 0,
            is_complete: false,
            missing_fields: required.iter().map(|f| f.to_string()).collect(),
        }
    }
}

fn filled(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

// ==================== TEACHER ====================

/// Documento da collection "teacher_profiles" (one per teacher user)
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct TeacherProfile {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub bio: Option<String>,
    #[serde(default)]
    pub subjects: Vec<String>,
    #[serde(default)]
    pub qualifications: Vec<String>,
    pub experience_years: Option<u32>,
    #[serde(default)]
    pub skills: Vec<String>,
    pub resume_url: Option<String>,
    pub photo_url: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl TeacherProfile {
    /// Fields that must be present before applying (the resume is checked separately).
    pub const REQUIRED_FIELDS: [&'static str; 5] =
        ["full_name", "phone", "location", "subjects", "qualifications"];

    pub fn completion(&self) -> ProfileCompletion {
        ProfileCompletion::from_checks(&[
            ("full_name", filled(&self.full_name), true),
            ("phone", filled(&self.phone), true),
            ("location", filled(&self.location), true),
            ("subjects", !self.subjects.is_empty(), true),
            ("qualifications", !self.qualifications.is_empty(), true),
            ("bio", filled(&self.bio), false),
            ("experience_years", self.experience_years.is_some(), false),
            ("skills", !self.skills.is_empty(), false),
            ("resume_url", self.has_resume(), false),
            ("photo_url", filled(&self.photo_url), false),
        ])
    }

    pub fn has_resume(&self) -> bool {
        filled(&self.resume_url)
    }
}

// ==================== INSTITUTION ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum InstitutionType {
    School,
    College,
    University,
    CoachingCenter,
    Other,
}

/// Documento da collection "institution_profiles" (one per institution user)
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct InstitutionProfile {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
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
    pub created_at: i64,
    pub updated_at: i64,
}

impl InstitutionProfile {
    /// Fields that must be present before posting jobs.
    pub const REQUIRED_FIELDS: [&'static str; 5] = [
        "institution_name",
        "institution_type",
        "city",
        "contact_email",
        "contact_phone",
    ];

    pub fn completion(&self) -> ProfileCompletion {
        ProfileCompletion::from_checks(&[
            ("institution_name", filled(&self.institution_name), true),
            ("institution_type", self.institution_type.is_some(), true),
            ("city", filled(&self.city), true),
            ("contact_email", filled(&self.contact_email), true),
            ("contact_phone", filled(&self.contact_phone), true),
            ("address", filled(&self.address), false),
            ("state", filled(&self.state), false),
            ("website", filled(&self.website), false),
            ("description", filled(&self.description), false),
            ("established_year", self.established_year.is_some(), false),
            ("logo_url", filled(&self.logo_url), false),
        ])
    }

    pub fn display_name(&self) -> &str {
        self.institution_name.as_deref().unwrap_or("An institution")
    }
}

/// Institution fields embedded when a job is "populated".
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct InstitutionSummary {
    pub user_id: String,
    pub institution_name: Option<String>,
    pub institution_type: Option<InstitutionType>,
    pub city: Option<String>,
    pub logo_url: Option<String>,
    pub website: Option<String>,
}

impl From<&InstitutionProfile> for InstitutionSummary {
    fn from(profile: &InstitutionProfile) -> Self {
        InstitutionSummary {
            user_id: profile.user_id.clone(),
            institution_name: profile.institution_name.clone(),
            institution_type: profile.institution_type,
            city: profile.city.clone(),
            logo_url: profile.logo_url.clone(),
            website: profile.website.clone(),
        }
    }
}
