use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    Reviewed,
    Shortlisted,
    Rejected,
    Accepted,
    Withdrawn,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 6] = [
        ApplicationStatus::Pending,
        ApplicationStatus::Reviewed,
        ApplicationStatus::Shortlisted,
        ApplicationStatus::Rejected,
        ApplicationStatus::Accepted,
        ApplicationStatus::Withdrawn,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Reviewed => "reviewed",
            ApplicationStatus::Shortlisted => "shortlisted",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Accepted => "accepted",
            ApplicationStatus::Withdrawn => "withdrawn",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ApplicationStatus::Rejected | ApplicationStatus::Accepted | ApplicationStatus::Withdrawn
        )
    }

    /// Moves an institution may make on an application.
    pub fn can_review_to(&self, next: ApplicationStatus) -> bool {
        let target_allowed = matches!(
            next,
            ApplicationStatus::Reviewed
                | ApplicationStatus::Shortlisted
                | ApplicationStatus::Rejected
                | ApplicationStatus::Accepted
        );
        target_allowed && !self.is_terminal() && *self != next
    }

    pub fn can_withdraw(&self) -> bool {
        matches!(self, ApplicationStatus::Pending | ApplicationStatus::Reviewed)
    }
}

/// Candidatura de um professor a uma vaga (collection "applications").
/// Unique on (job_id, teacher_id).
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Application {
    #[serde(rename = "_id")]
    pub id: String,
    pub job_id: String,
    pub teacher_id: String,
    pub institution_id: String,
    #[serde(rename = "coverLetter")]
    pub cover_letter: String,
    /// Snapshot of the profile at submission time
    pub teacher_name: Option<String>,
    pub resume_url: Option<String>,
    pub status: ApplicationStatus,
    pub status_note: Option<String>,
    pub applied_at: i64,
    pub updated_at: i64,
}

/// Application row with the job title joined in.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct ApplicationView {
    #[serde(flatten)]
    pub application: Application,
    pub job_title: Option<String>,
}
