//! Fixtures shared by the unit and HTTP tests.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{Config, JwtSettings};
use crate::database::{MemoryStore, Page, Store, StoreResult};
use crate::models::{
    Application, ApplicationStatus, Bookmark, InstitutionProfile, InstitutionType, Job, JobQuery,
    JobType, Notification, PlatformStats, Review, Subscription, SubscriptionPlan, TeacherProfile,
    User, UserType,
};
use crate::services::auth_service::{generate_access_token, verify_token, Claims, TokenUse};
use crate::services::payment_gateway::{verify_checkout_signature, GatewayOrder, PaymentGateway};
use crate::state::AppState;
use crate::utils::AppError;

pub const TEST_BCRYPT_COST: u32 = 4;
pub const TEST_RAZORPAY_KEY: &str = "rzp_test_key";
pub const TEST_RAZORPAY_SECRET: &str = "rzp_test_secret";

pub fn jwt_settings() -> JwtSettings {
    JwtSettings {
        secret: "test-secret-do-not-use".into(),
        issuer: "eduhire-api".into(),
        audience: "eduhire-web".into(),
        ttl_hours: 1,
        refresh_ttl_days: 1,
    }
}

pub fn test_config() -> Config {
    Config {
        host: "127.0.0.1".into(),
        port: 0,
        database_url: "memory://".into(),
        jwt: jwt_settings(),
        bcrypt_cost: TEST_BCRYPT_COST,
        cors_origins: vec!["http://localhost:3000".into()],
        razorpay: None,
        admin_seed: None,
        free_job_post_limit: 3,
        sweep_interval_secs: 3600,
    }
}

/// Gateway that hands out sequential order ids and signs with a fixed secret.
#[derive(Default)]
pub struct FakeGateway {
    orders: AtomicU64,
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    fn key_id(&self) -> Option<&str> {
        Some(TEST_RAZORPAY_KEY)
    }

    async fn create_order(
        &self,
        amount: i64,
        currency: &str,
        _receipt: &str,
    ) -> Result<GatewayOrder, AppError> {
        let n = self.orders.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(GatewayOrder {
            id: format!("order_test_{}", n),
            amount,
            currency: currency.to_string(),
        })
    }

    fn verify_signature(
        &self,
        order_id: &str,
        payment_id: &str,
        signature: &str,
    ) -> Result<bool, AppError> {
        Ok(verify_checkout_signature(
            TEST_RAZORPAY_SECRET,
            order_id,
            payment_id,
            signature,
        ))
    }
}

/// Hex signature the fake gateway accepts for this order/payment pair.
pub fn sign_checkout(order_id: &str, payment_id: &str) -> String {
    use hmac::{Hmac, Mac};
    let mut mac = Hmac::<sha2::Sha256>::new_from_slice(TEST_RAZORPAY_SECRET.as_bytes()).unwrap();
    mac.update(format!("{}|{}", order_id, payment_id).as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

pub fn test_state() -> AppState {
    AppState::new(
        Arc::new(MemoryStore::new()),
        Arc::new(FakeGateway::default()),
        test_config(),
    )
}

pub fn user(id: &str, user_type: UserType) -> User {
    User {
        id: id.to_string(),
        email: format!("{}@example.com", id),
        password_hash: "$2b$04$not-a-real-hash".into(),
        name: format!("User {}", id),
        user_type,
        is_active: true,
        last_login: None,
        created_at: 0,
        updated_at: 0,
    }
}

/// Claims as the auth middleware would attach them for this user.
pub fn claims_for(id: &str, user_type: UserType) -> Claims {
    let jwt = jwt_settings();
    let token = generate_access_token(&jwt, &user(id, user_type)).unwrap();
    verify_token(&jwt, &token, TokenUse::Access).unwrap()
}

pub fn complete_teacher(user_id: &str) -> TeacherProfile {
    TeacherProfile {
        id: format!("tp-{}", user_id),
        user_id: user_id.to_string(),
        full_name: Some("Meera Iyer".into()),
        phone: Some("+91 98765 43210".into()),
        location: Some("Chennai".into()),
        bio: None,
        subjects: vec!["Mathematics".into()],
        qualifications: vec!["M.Sc".into(), "B.Ed".into()],
        experience_years: Some(6),
        skills: vec![],
        resume_url: Some("https://files.example.com/meera.pdf".into()),
        photo_url: None,
        created_at: 0,
        updated_at: 0,
    }
}

pub fn complete_institution(user_id: &str) -> InstitutionProfile {
    InstitutionProfile {
        id: format!("ip-{}", user_id),
        user_id: user_id.to_string(),
        institution_name: Some("Lakeview Public School".into()),
        institution_type: Some(InstitutionType::School),
        address: None,
        city: Some("Chennai".into()),
        state: Some("Tamil Nadu".into()),
        contact_email: Some("hr@lakeview.edu".into()),
        contact_phone: Some("044 2345 6789".into()),
        website: None,
        description: None,
        established_year: Some(1998),
        logo_url: None,
        created_at: 0,
        updated_at: 0,
    }
}

pub fn sample_job(id: &str, institution_id: &str, now: i64) -> Job {
    Job {
        id: id.to_string(),
        institution_id: institution_id.to_string(),
        title: "Senior Mathematics Teacher".into(),
        description: "Teach mathematics to grades 9 through 12 with board exam preparation.".into(),
        subject: "Mathematics".into(),
        location: "Chennai, Tamil Nadu".into(),
        job_type: JobType::FullTime,
        experience_required: 3,
        salary_min: Some(30_000),
        salary_max: Some(50_000),
        qualifications: vec!["B.Ed".into()],
        skills: vec![],
        vacancies: 1,
        is_active: true,
        is_deleted: false,
        expires_at: now + 86_400,
        applications_count: 0,
        created_at: now,
        updated_at: now,
    }
}

pub fn sample_application(id: &str, job_id: &str, teacher_id: &str) -> Application {
    Application {
        id: id.to_string(),
        job_id: job_id.to_string(),
        teacher_id: teacher_id.to_string(),
        institution_id: "inst-1".into(),
        cover_letter: "I would love to teach at your school this year.".into(),
        teacher_name: Some("Meera Iyer".into()),
        resume_url: None,
        status: ApplicationStatus::Pending,
        status_note: None,
        applied_at: 0,
        updated_at: 0,
    }
}

/// Stores a teacher with a complete profile and returns their id.
pub async fn seed_teacher(store: &dyn Store, id: &str) -> String {
    store.insert_user(&user(id, UserType::Teacher)).await.unwrap();
    store.save_teacher_profile(&complete_teacher(id)).await.unwrap();
    id.to_string()
}

/// Stores an institution with a complete profile and returns its id.
pub async fn seed_institution(store: &dyn Store, id: &str) -> String {
    store.insert_user(&user(id, UserType::Institution)).await.unwrap();
    store
        .save_institution_profile(&complete_institution(id))
        .await
        .unwrap();
    id.to_string()
}

/// Store whose pre-insert duplicate lookups always miss, as when a concurrent
/// request writes between the check and the insert. Only the unique
/// constraints of the inner `MemoryStore` stop the second write.
pub struct RacingStore {
    pub inner: MemoryStore,
}

impl RacingStore {
    pub fn new() -> Self {
        RacingStore {
            inner: MemoryStore::new(),
        }
    }
}

#[async_trait]
impl Store for RacingStore {
    async fn ping(&self) -> StoreResult<()> {
        self.inner.ping().await
    }

    async fn insert_user(&self, user: &User) -> StoreResult<()> {
        self.inner.insert_user(user).await
    }
    async fn find_user(&self, id: &str) -> StoreResult<Option<User>> {
        self.inner.find_user(id).await
    }
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        self.inner.find_user_by_email(email).await
    }
    async fn set_user_active(&self, id: &str, is_active: bool, now: i64) -> StoreResult<bool> {
        self.inner.set_user_active(id, is_active, now).await
    }
    async fn record_login(&self, id: &str, at: i64) -> StoreResult<()> {
        self.inner.record_login(id, at).await
    }
    async fn list_users(&self, user_type: Option<UserType>, page: Page) -> StoreResult<(Vec<User>, u64)> {
        self.inner.list_users(user_type, page).await
    }

    async fn find_teacher_profile(&self, user_id: &str) -> StoreResult<Option<TeacherProfile>> {
        self.inner.find_teacher_profile(user_id).await
    }
    async fn save_teacher_profile(&self, profile: &TeacherProfile) -> StoreResult<()> {
        self.inner.save_teacher_profile(profile).await
    }
    async fn find_institution_profile(&self, user_id: &str) -> StoreResult<Option<InstitutionProfile>> {
        self.inner.find_institution_profile(user_id).await
    }
    async fn save_institution_profile(&self, profile: &InstitutionProfile) -> StoreResult<()> {
        self.inner.save_institution_profile(profile).await
    }

    async fn insert_job(&self, job: &Job) -> StoreResult<()> {
        self.inner.insert_job(job).await
    }
    async fn find_job(&self, id: &str) -> StoreResult<Option<Job>> {
        self.inner.find_job(id).await
    }
    async fn replace_job(&self, job: &Job) -> StoreResult<()> {
        self.inner.replace_job(job).await
    }
    async fn search_jobs(&self, query: &JobQuery, now: i64) -> StoreResult<(Vec<Job>, u64)> {
        self.inner.search_jobs(query, now).await
    }
    async fn list_institution_jobs(&self, institution_id: &str) -> StoreResult<Vec<Job>> {
        self.inner.list_institution_jobs(institution_id).await
    }
    async fn count_open_institution_jobs(&self, institution_id: &str, now: i64) -> StoreResult<u64> {
        self.inner.count_open_institution_jobs(institution_id, now).await
    }
    async fn increment_applications_count(&self, job_id: &str) -> StoreResult<()> {
        self.inner.increment_applications_count(job_id).await
    }
    async fn deactivate_expired_jobs(&self, now: i64) -> StoreResult<u64> {
        self.inner.deactivate_expired_jobs(now).await
    }

    async fn insert_application(&self, application: &Application) -> StoreResult<()> {
        self.inner.insert_application(application).await
    }
    async fn find_application(&self, id: &str) -> StoreResult<Option<Application>> {
        self.inner.find_application(id).await
    }
    async fn find_application_for(&self, _job_id: &str, _teacher_id: &str) -> StoreResult<Option<Application>> {
        Ok(None)
    }
    async fn list_teacher_applications(&self, teacher_id: &str) -> StoreResult<Vec<Application>> {
        self.inner.list_teacher_applications(teacher_id).await
    }
    async fn list_job_applications(&self, job_id: &str) -> StoreResult<Vec<Application>> {
        self.inner.list_job_applications(job_id).await
    }
    async fn replace_application(&self, application: &Application) -> StoreResult<()> {
        self.inner.replace_application(application).await
    }

    async fn insert_bookmark(&self, bookmark: &Bookmark) -> StoreResult<()> {
        self.inner.insert_bookmark(bookmark).await
    }
    async fn find_bookmark(&self, _teacher_id: &str, _job_id: &str) -> StoreResult<Option<Bookmark>> {
        Ok(None)
    }
    async fn list_bookmarks(&self, teacher_id: &str, category: Option<&str>) -> StoreResult<Vec<Bookmark>> {
        self.inner.list_bookmarks(teacher_id, category).await
    }
    async fn delete_bookmark(&self, teacher_id: &str, job_id: &str) -> StoreResult<bool> {
        self.inner.delete_bookmark(teacher_id, job_id).await
    }

    async fn insert_notification(&self, notification: &Notification) -> StoreResult<()> {
        self.inner.insert_notification(notification).await
    }
    async fn list_notifications(&self, user_id: &str, unread_only: bool, limit: u64) -> StoreResult<Vec<Notification>> {
        self.inner.list_notifications(user_id, unread_only, limit).await
    }
    async fn count_unread_notifications(&self, user_id: &str) -> StoreResult<u64> {
        self.inner.count_unread_notifications(user_id).await
    }
    async fn mark_notification_read(&self, user_id: &str, id: &str) -> StoreResult<bool> {
        self.inner.mark_notification_read(user_id, id).await
    }
    async fn mark_all_notifications_read(&self, user_id: &str) -> StoreResult<u64> {
        self.inner.mark_all_notifications_read(user_id).await
    }
    async fn delete_notification(&self, user_id: &str, id: &str) -> StoreResult<bool> {
        self.inner.delete_notification(user_id, id).await
    }

    async fn upsert_plan(&self, plan: &SubscriptionPlan) -> StoreResult<()> {
        self.inner.upsert_plan(plan).await
    }
    async fn list_plans(&self, audience: Option<UserType>) -> StoreResult<Vec<SubscriptionPlan>> {
        self.inner.list_plans(audience).await
    }
    async fn find_plan(&self, code: &str) -> StoreResult<Option<SubscriptionPlan>> {
        self.inner.find_plan(code).await
    }
    async fn insert_subscription(&self, subscription: &Subscription) -> StoreResult<()> {
        self.inner.insert_subscription(subscription).await
    }
    async fn replace_subscription(&self, subscription: &Subscription) -> StoreResult<()> {
        self.inner.replace_subscription(subscription).await
    }
    async fn find_subscription_by_order(&self, user_id: &str, order_id: &str) -> StoreResult<Option<Subscription>> {
        self.inner.find_subscription_by_order(user_id, order_id).await
    }
    async fn find_active_subscription(&self, user_id: &str, now: i64) -> StoreResult<Option<Subscription>> {
        self.inner.find_active_subscription(user_id, now).await
    }
    async fn expire_subscriptions(&self, now: i64) -> StoreResult<u64> {
        self.inner.expire_subscriptions(now).await
    }

    async fn insert_review(&self, review: &Review) -> StoreResult<()> {
        self.inner.insert_review(review).await
    }
    async fn list_institution_reviews(&self, institution_id: &str) -> StoreResult<Vec<Review>> {
        self.inner.list_institution_reviews(institution_id).await
    }

    async fn platform_stats(&self, now: i64) -> StoreResult<PlatformStats> {
        self.inner.platform_stats(now).await
    }
}
