use async_trait::async_trait;
use mongodb::error::{ErrorKind, WriteFailure};
use thiserror::Error;

use crate::models::{
    Application, Bookmark, InstitutionProfile, Job, JobQuery, Notification, PlatformStats, Review,
    Subscription, SubscriptionPlan, TeacherProfile, User, UserType,
};

/// Duplicate key error code reported by MongoDB.
const DUPLICATE_KEY: i32 = 11000;
/// Document failed collection schema validation.
const DOCUMENT_VALIDATION_FAILURE: i32 = 121;

/// Persistence failure as seen by the service layer.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique index rejected the write.
    #[error("duplicate key: {0}")]
    Duplicate(String),
    #[error("validation failed: {0}")]
    Validation(String),
    /// A stored value could not be read back into the expected shape.
    #[error("invalid identifier or value: {0}")]
    InvalidId(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<mongodb::error::Error> for StoreError {
    fn from(err: mongodb::error::Error) -> Self {
        match err.kind.as_ref() {
            ErrorKind::Write(WriteFailure::WriteError(write_error)) => match write_error.code {
                DUPLICATE_KEY => StoreError::Duplicate(write_error.message.clone()),
                DOCUMENT_VALIDATION_FAILURE => StoreError::Validation(write_error.message.clone()),
                _ => StoreError::Unavailable(err.to_string()),
            },
            ErrorKind::BsonDeserialization(e) => StoreError::InvalidId(e.to_string()),
            ErrorKind::BsonSerialization(e) => StoreError::Validation(e.to_string()),
            _ => StoreError::Unavailable(err.to_string()),
        }
    }
}

impl From<mongodb::bson::ser::Error> for StoreError {
    fn from(err: mongodb::bson::ser::Error) -> Self {
        StoreError::Validation(err.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Page window for admin listings.
#[derive(Debug, Clone, Copy)]
pub struct Page {
    pub skip: u64,
    pub limit: u64,
}

/// Everything the services need from persistence.
///
/// `MongoDB` is the production implementation; `MemoryStore` backs tests and
/// `memory://` local runs. Unique pairs (application per job/teacher, bookmark
/// per teacher/job, review per author/institution, user per email) must be
/// enforced by the implementation and reported as `StoreError::Duplicate`.
#[async_trait]
pub trait Store: Send + Sync {
    async fn ping(&self) -> StoreResult<()>;

    // users
    async fn insert_user(&self, user: &User) -> StoreResult<()>;
    async fn find_user(&self, id: &str) -> StoreResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn set_user_active(&self, id: &str, is_active: bool, now: i64) -> StoreResult<bool>;
    async fn record_login(&self, id: &str, at: i64) -> StoreResult<()>;
    async fn list_users(
        &self,
        user_type: Option<UserType>,
        page: Page,
    ) -> StoreResult<(Vec<User>, u64)>;

    // profiles (upsert keyed by user_id)
    async fn find_teacher_profile(&self, user_id: &str) -> StoreResult<Option<TeacherProfile>>;
    async fn save_teacher_profile(&self, profile: &TeacherProfile) -> StoreResult<()>;
    async fn find_institution_profile(
        &self,
        user_id: &str,
    ) -> StoreResult<Option<InstitutionProfile>>;
    async fn save_institution_profile(&self, profile: &InstitutionProfile) -> StoreResult<()>;

    // jobs
    async fn insert_job(&self, job: &Job) -> StoreResult<()>;
    async fn find_job(&self, id: &str) -> StoreResult<Option<Job>>;
    async fn replace_job(&self, job: &Job) -> StoreResult<()>;
    async fn search_jobs(&self, query: &JobQuery, now: i64) -> StoreResult<(Vec<Job>, u64)>;
    /// Non-deleted jobs of one institution, newest first.
    async fn list_institution_jobs(&self, institution_id: &str) -> StoreResult<Vec<Job>>;
    async fn count_open_institution_jobs(&self, institution_id: &str, now: i64) -> StoreResult<u64>;
    async fn increment_applications_count(&self, job_id: &str) -> StoreResult<()>;
    async fn deactivate_expired_jobs(&self, now: i64) -> StoreResult<u64>;

    // applications
    async fn insert_application(&self, application: &Application) -> StoreResult<()>;
    async fn find_application(&self, id: &str) -> StoreResult<Option<Application>>;
    async fn find_application_for(
        &self,
        job_id: &str,
        teacher_id: &str,
    ) -> StoreResult<Option<Application>>;
    async fn list_teacher_applications(&self, teacher_id: &str) -> StoreResult<Vec<Application>>;
    async fn list_job_applications(&self, job_id: &str) -> StoreResult<Vec<Application>>;
    async fn replace_application(&self, application: &Application) -> StoreResult<()>;

    // bookmarks
    async fn insert_bookmark(&self, bookmark: &Bookmark) -> StoreResult<()>;
    async fn find_bookmark(&self, teacher_id: &str, job_id: &str) -> StoreResult<Option<Bookmark>>;
    async fn list_bookmarks(
        &self,
        teacher_id: &str,
        category: Option<&str>,
    ) -> StoreResult<Vec<Bookmark>>;
    async fn delete_bookmark(&self, teacher_id: &str, job_id: &str) -> StoreResult<bool>;

    // notifications
    async fn insert_notification(&self, notification: &Notification) -> StoreResult<()>;
    async fn list_notifications(
        &self,
        user_id: &str,
        unread_only: bool,
        limit: u64,
    ) -> StoreResult<Vec<Notification>>;
    async fn count_unread_notifications(&self, user_id: &str) -> StoreResult<u64>;
    async fn mark_notification_read(&self, user_id: &str, id: &str) -> StoreResult<bool>;
    async fn mark_all_notifications_read(&self, user_id: &str) -> StoreResult<u64>;
    async fn delete_notification(&self, user_id: &str, id: &str) -> StoreResult<bool>;

    // subscriptions
    async fn upsert_plan(&self, plan: &SubscriptionPlan) -> StoreResult<()>;
    async fn list_plans(&self, audience: Option<UserType>) -> StoreResult<Vec<SubscriptionPlan>>;
    async fn find_plan(&self, code: &str) -> StoreResult<Option<SubscriptionPlan>>;
    async fn insert_subscription(&self, subscription: &Subscription) -> StoreResult<()>;
    async fn replace_subscription(&self, subscription: &Subscription) -> StoreResult<()>;
    async fn find_subscription_by_order(
        &self,
        user_id: &str,
        order_id: &str,
    ) -> StoreResult<Option<Subscription>>;
    async fn find_active_subscription(
        &self,
        user_id: &str,
        now: i64,
    ) -> StoreResult<Option<Subscription>>;
    async fn expire_subscriptions(&self, now: i64) -> StoreResult<u64>;

    // reviews
    async fn insert_review(&self, review: &Review) -> StoreResult<()>;
    async fn list_institution_reviews(&self, institution_id: &str) -> StoreResult<Vec<Review>>;

    // admin
    async fn platform_stats(&self, now: i64) -> StoreResult<PlatformStats>;
}
