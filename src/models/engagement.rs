use serde::{Deserialize, Serialize};

use super::job::Job;

// ==================== BOOKMARKS ====================

/// Vaga salva por um professor (collection "bookmarks").
/// Unique on (teacher_id, job_id).
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Bookmark {
    #[serde(rename = "_id")]
    pub id: String,
    pub teacher_id: String,
    pub job_id: String,
    pub category: Option<String>,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct BookmarkView {
    #[serde(flatten)]
    pub bookmark: Bookmark,
    /// None when the job was deleted since it was saved
    pub job: Option<Job>,
}

// ==================== NOTIFICATIONS ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    ApplicationReceived,
    ApplicationStatus,
    Subscription,
    System,
}

/// Collection "notifications"
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Notification {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub link: Option<String>,
    pub related_id: Option<String>,
    #[serde(default)]
    pub is_read: bool,
    pub created_at: i64,
}

// ==================== REVIEWS ====================

/// Avaliação de uma instituição feita por um professor (collection "reviews").
/// Unique on (author_id, institution_id).
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Review {
    #[serde(rename = "_id")]
    pub id: String,
    pub author_id: String,
    pub author_name: String,
    pub institution_id: String,
    pub rating: u8,
    pub title: Option<String>,
    pub comment: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
pub struct RatingSummary {
    /// Mean rating rounded to one decimal; 0 without reviews
    pub average: f64,
    pub count: u64,
}

impl RatingSummary {
    pub fn from_reviews(reviews: &[Review]) -> Self {
        if reviews.is_empty() {
            return RatingSummary { average: 0.0, count: 0 };
        }
        let total: u64 = reviews.iter().map(|r| u64::from(r.rating)).sum();
        let mean = total as f64 / reviews.len() as f64;
        RatingSummary {
            average: (mean * 10.0).round() / 10.0,
            count: reviews.len() as u64,
        }
    }
}
