use async_trait::async_trait;
use futures::stream::TryStreamExt;
use mongodb::bson::{doc, Document};

use super::store::{Page, Store, StoreResult};
use super::{
    MongoDB, APPLICATIONS, BOOKMARKS, INSTITUTION_PROFILES, JOBS, NOTIFICATIONS, REVIEWS,
    SUBSCRIPTIONS, SUBSCRIPTION_PLANS, TEACHER_PROFILES, USERS,
};
use crate::models::{
    Application, ApplicationStatus, Bookmark, InstitutionProfile, Job, JobQuery, JobSort,
    Notification, PlatformStats, Review, Subscription, SubscriptionPlan, TeacherProfile, User,
    UserType,
};

/// Escapes regex metacharacters so user search text is matched literally.
fn escape_regex(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if "\\.+*?()|[]{}^$#&-~".contains(c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn contains_ci(text: &str) -> Document {
    doc! { "$regex": escape_regex(text), "$options": "i" }
}

/// Filtro Mongo equivalente a `JobQuery::matches`
fn job_search_filter(query: &JobQuery, now: i64) -> Document {
    let mut filter = doc! {
        "is_active": true,
        "is_deleted": { "$ne": true },
        "expiresAt": { "$gt": now },
    };

    if let Some(text) = query.text() {
        filter.insert(
            "$or",
            vec![
                doc! { "title": contains_ci(&text) },
                doc! { "description": contains_ci(&text) },
                doc! { "subject": contains_ci(&text) },
            ],
        );
    }
    if let Some(subject) = query.subject_term() {
        filter.insert("subject", contains_ci(&subject));
    }
    if let Some(location) = query.location_term() {
        filter.insert("location", contains_ci(&location));
    }
    if let Some(job_type) = query.job_type {
        filter.insert("job_type", job_type.as_str());
    }
    if let Some(min_salary) = query.min_salary {
        filter.insert("salary_max", doc! { "$gte": min_salary });
    }

    filter
}

#[async_trait]
impl Store for MongoDB {
    async fn ping(&self) -> StoreResult<()> {
        self.database().run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }

    // ==================== USERS ====================

    async fn insert_user(&self, user: &User) -> StoreResult<()> {
        self.collection::<User>(USERS).insert_one(user).await?;
        Ok(())
    }

    async fn find_user(&self, id: &str) -> StoreResult<Option<User>> {
        Ok(self.collection::<User>(USERS).find_one(doc! { "_id": id }).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self
            .collection::<User>(USERS)
            .find_one(doc! { "email": email })
            .await?)
    }

    async fn set_user_active(&self, id: &str, is_active: bool, now: i64) -> StoreResult<bool> {
        let result = self
            .collection::<User>(USERS)
            .update_one(
                doc! { "_id": id },
                doc! { "$set": { "is_active": is_active, "updated_at": now } },
            )
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn record_login(&self, id: &str, at: i64) -> StoreResult<()> {
        self.collection::<User>(USERS)
            .update_one(doc! { "_id": id }, doc! { "$set": { "last_login": at } })
            .await?;
        Ok(())
    }

    async fn list_users(
        &self,
        user_type: Option<UserType>,
        page: Page,
    ) -> StoreResult<(Vec<User>, u64)> {
        let filter = match user_type {
            Some(kind) => doc! { "userType": kind.as_str() },
            None => doc! {},
        };
        let collection = self.collection::<User>(USERS);
        let total = collection.count_documents(filter.clone()).await?;
        let users = collection
            .find(filter)
            .sort(doc! { "created_at": -1, "_id": 1 })
            .skip(page.skip)
            .limit(page.limit as i64)
            .await?
            .try_collect()
            .await?;
        Ok((users, total))
    }

    // ==================== PROFILES ====================

    async fn find_teacher_profile(&self, user_id: &str) -> StoreResult<Option<TeacherProfile>> {
        Ok(self
            .collection::<TeacherProfile>(TEACHER_PROFILES)
            .find_one(doc! { "user_id": user_id })
            .await?)
    }

    async fn save_teacher_profile(&self, profile: &TeacherProfile) -> StoreResult<()> {
        self.collection::<TeacherProfile>(TEACHER_PROFILES)
            .replace_one(doc! { "user_id": &profile.user_id }, profile)
            .upsert(true)
            .await?;
        Ok(())
    }

    async fn find_institution_profile(
        &self,
        user_id: &str,
    ) -> StoreResult<Option<InstitutionProfile>> {
        Ok(self
            .collection::<InstitutionProfile>(INSTITUTION_PROFILES)
            .find_one(doc! { "user_id": user_id })
            .await?)
    }

    async fn save_institution_profile(&self, profile: &InstitutionProfile) -> StoreResult<()> {
        self.collection::<InstitutionProfile>(INSTITUTION_PROFILES)
            .replace_one(doc! { "user_id": &profile.user_id }, profile)
            .upsert(true)
            .await?;
        Ok(())
    }

    // ==================== JOBS ====================

    async fn insert_job(&self, job: &Job) -> StoreResult<()> {
        self.collection::<Job>(JOBS).insert_one(job).await?;
        Ok(())
    }

    async fn find_job(&self, id: &str) -> StoreResult<Option<Job>> {
        Ok(self.collection::<Job>(JOBS).find_one(doc! { "_id": id }).await?)
    }

    async fn replace_job(&self, job: &Job) -> StoreResult<()> {
        self.collection::<Job>(JOBS)
            .replace_one(doc! { "_id": &job.id }, job)
            .await?;
        Ok(())
    }

    async fn search_jobs(&self, query: &JobQuery, now: i64) -> StoreResult<(Vec<Job>, u64)> {
        let filter = job_search_filter(query, now);
        let sort = match query.sort {
            JobSort::Newest => doc! { "created_at": -1, "_id": 1 },
            JobSort::Salary => doc! { "salary_max": -1, "_id": 1 },
        };

        let collection = self.collection::<Job>(JOBS);
        let total = collection.count_documents(filter.clone()).await?;
        let jobs = collection
            .find(filter)
            .sort(sort)
            .skip(query.skip())
            .limit(query.limit() as i64)
            .await?
            .try_collect()
            .await?;
        Ok((jobs, total))
    }

    async fn list_institution_jobs(&self, institution_id: &str) -> StoreResult<Vec<Job>> {
        Ok(self
            .collection::<Job>(JOBS)
            .find(doc! { "institution_id": institution_id, "is_deleted": { "$ne": true } })
            .sort(doc! { "created_at": -1 })
            .await?
            .try_collect()
            .await?)
    }

    async fn count_open_institution_jobs(&self, institution_id: &str, now: i64) -> StoreResult<u64> {
        Ok(self
            .collection::<Job>(JOBS)
            .count_documents(doc! {
                "institution_id": institution_id,
                "is_active": true,
                "is_deleted": { "$ne": true },
                "expiresAt": { "$gt": now },
            })
            .await?)
    }

    async fn increment_applications_count(&self, job_id: &str) -> StoreResult<()> {
        self.collection::<Job>(JOBS)
            .update_one(doc! { "_id": job_id }, doc! { "$inc": { "applicationscount": 1 } })
            .await?;
        Ok(())
    }

    async fn deactivate_expired_jobs(&self, now: i64) -> StoreResult<u64> {
        let result = self
            .collection::<Job>(JOBS)
            .update_many(
                doc! { "is_active": true, "expiresAt": { "$lte": now } },
                doc! { "$set": { "is_active": false, "updated_at": now } },
            )
            .await?;
        Ok(result.modified_count)
    }

    // ==================== APPLICATIONS ====================

    async fn insert_application(&self, application: &Application) -> StoreResult<()> {
        self.collection::<Application>(APPLICATIONS)
            .insert_one(application)
            .await?;
        Ok(())
    }

    async fn find_application(&self, id: &str) -> StoreResult<Option<Application>> {
        Ok(self
            .collection::<Application>(APPLICATIONS)
            .find_one(doc! { "_id": id })
            .await?)
    }

    async fn find_application_for(
        &self,
        job_id: &str,
        teacher_id: &str,
    ) -> StoreResult<Option<Application>> {
        Ok(self
            .collection::<Application>(APPLICATIONS)
            .find_one(doc! { "job_id": job_id, "teacher_id": teacher_id })
            .await?)
    }

    async fn list_teacher_applications(&self, teacher_id: &str) -> StoreResult<Vec<Application>> {
        Ok(self
            .collection::<Application>(APPLICATIONS)
            .find(doc! { "teacher_id": teacher_id })
            .sort(doc! { "applied_at": -1 })
            .await?
            .try_collect()
            .await?)
    }

    async fn list_job_applications(&self, job_id: &str) -> StoreResult<Vec<Application>> {
        Ok(self
            .collection::<Application>(APPLICATIONS)
            .find(doc! { "job_id": job_id })
            .sort(doc! { "applied_at": -1 })
            .await?
            .try_collect()
            .await?)
    }

    async fn replace_application(&self, application: &Application) -> StoreResult<()> {
        self.collection::<Application>(APPLICATIONS)
            .replace_one(doc! { "_id": &application.id }, application)
            .await?;
        Ok(())
    }

    // ==================== BOOKMARKS ====================

    async fn insert_bookmark(&self, bookmark: &Bookmark) -> StoreResult<()> {
        self.collection::<Bookmark>(BOOKMARKS).insert_one(bookmark).await?;
        Ok(())
    }

    async fn find_bookmark(&self, teacher_id: &str, job_id: &str) -> StoreResult<Option<Bookmark>> {
        Ok(self
            .collection::<Bookmark>(BOOKMARKS)
            .find_one(doc! { "teacher_id": teacher_id, "job_id": job_id })
            .await?)
    }

    async fn list_bookmarks(
        &self,
        teacher_id: &str,
        category: Option<&str>,
    ) -> StoreResult<Vec<Bookmark>> {
        let mut filter = doc! { "teacher_id": teacher_id };
        if let Some(category) = category {
            filter.insert("category", category);
        }
        Ok(self
            .collection::<Bookmark>(BOOKMARKS)
            .find(filter)
            .sort(doc! { "created_at": -1 })
            .await?
            .try_collect()
            .await?)
    }

    async fn delete_bookmark(&self, teacher_id: &str, job_id: &str) -> StoreResult<bool> {
        let result = self
            .collection::<Bookmark>(BOOKMARKS)
            .delete_one(doc! { "teacher_id": teacher_id, "job_id": job_id })
            .await?;
        Ok(result.deleted_count > 0)
    }

    // ==================== NOTIFICATIONS ====================

    async fn insert_notification(&self, notification: &Notification) -> StoreResult<()> {
        self.collection::<Notification>(NOTIFICATIONS)
            .insert_one(notification)
            .await?;
        Ok(())
    }

    async fn list_notifications(
        &self,
        user_id: &str,
        unread_only: bool,
        limit: u64,
    ) -> StoreResult<Vec<Notification>> {
        let mut filter = doc! { "user_id": user_id };
        if unread_only {
            filter.insert("is_read", false);
        }
        Ok(self
            .collection::<Notification>(NOTIFICATIONS)
            .find(filter)
            .sort(doc! { "created_at": -1 })
            .limit(limit as i64)
            .await?
            .try_collect()
            .await?)
    }

    async fn count_unread_notifications(&self, user_id: &str) -> StoreResult<u64> {
        Ok(self
            .collection::<Notification>(NOTIFICATIONS)
            .count_documents(doc! { "user_id": user_id, "is_read": false })
            .await?)
    }

    async fn mark_notification_read(&self, user_id: &str, id: &str) -> StoreResult<bool> {
        let result = self
            .collection::<Notification>(NOTIFICATIONS)
            .update_one(
                doc! { "_id": id, "user_id": user_id },
                doc! { "$set": { "is_read": true } },
            )
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn mark_all_notifications_read(&self, user_id: &str) -> StoreResult<u64> {
        let result = self
            .collection::<Notification>(NOTIFICATIONS)
            .update_many(
                doc! { "user_id": user_id, "is_read": false },
                doc! { "$set": { "is_read": true } },
            )
            .await?;
        Ok(result.modified_count)
    }

    async fn delete_notification(&self, user_id: &str, id: &str) -> StoreResult<bool> {
        let result = self
            .collection::<Notification>(NOTIFICATIONS)
            .delete_one(doc! { "_id": id, "user_id": user_id })
            .await?;
        Ok(result.deleted_count > 0)
    }

    // ==================== SUBSCRIPTIONS ====================

    async fn upsert_plan(&self, plan: &SubscriptionPlan) -> StoreResult<()> {
        self.collection::<SubscriptionPlan>(SUBSCRIPTION_PLANS)
            .replace_one(doc! { "_id": &plan.code }, plan)
            .upsert(true)
            .await?;
        Ok(())
    }

    async fn list_plans(&self, audience: Option<UserType>) -> StoreResult<Vec<SubscriptionPlan>> {
        let mut filter = doc! { "is_active": true };
        if let Some(audience) = audience {
            filter.insert("audience", audience.as_str());
        }
        Ok(self
            .collection::<SubscriptionPlan>(SUBSCRIPTION_PLANS)
            .find(filter)
            .sort(doc! { "price": 1 })
            .await?
            .try_collect()
            .await?)
    }

    async fn find_plan(&self, code: &str) -> StoreResult<Option<SubscriptionPlan>> {
        Ok(self
            .collection::<SubscriptionPlan>(SUBSCRIPTION_PLANS)
            .find_one(doc! { "_id": code, "is_active": true })
            .await?)
    }

    async fn insert_subscription(&self, subscription: &Subscription) -> StoreResult<()> {
        self.collection::<Subscription>(SUBSCRIPTIONS)
            .insert_one(subscription)
            .await?;
        Ok(())
    }

    async fn replace_subscription(&self, subscription: &Subscription) -> StoreResult<()> {
        self.collection::<Subscription>(SUBSCRIPTIONS)
            .replace_one(doc! { "_id": &subscription.id }, subscription)
            .await?;
        Ok(())
    }

    async fn find_subscription_by_order(
        &self,
        user_id: &str,
        order_id: &str,
    ) -> StoreResult<Option<Subscription>> {
        Ok(self
            .collection::<Subscription>(SUBSCRIPTIONS)
            .find_one(doc! { "user_id": user_id, "razorpay_order_id": order_id })
            .await?)
    }

    async fn find_active_subscription(
        &self,
        user_id: &str,
        now: i64,
    ) -> StoreResult<Option<Subscription>> {
        Ok(self
            .collection::<Subscription>(SUBSCRIPTIONS)
            .find_one(doc! { "user_id": user_id, "status": "active", "ends_at": { "$gt": now } })
            .sort(doc! { "ends_at": -1 })
            .await?)
    }

    async fn expire_subscriptions(&self, now: i64) -> StoreResult<u64> {
        let result = self
            .collection::<Subscription>(SUBSCRIPTIONS)
            .update_many(
                doc! { "status": "active", "ends_at": { "$lte": now } },
                doc! { "$set": { "status": "expired", "updated_at": now } },
            )
            .await?;
        Ok(result.modified_count)
    }

    // ==================== REVIEWS ====================

    async fn insert_review(&self, review: &Review) -> StoreResult<()> {
        self.collection::<Review>(REVIEWS).insert_one(review).await?;
        Ok(())
    }

    async fn list_institution_reviews(&self, institution_id: &str) -> StoreResult<Vec<Review>> {
        Ok(self
            .collection::<Review>(REVIEWS)
            .find(doc! { "institution_id": institution_id })
            .sort(doc! { "created_at": -1 })
            .await?
            .try_collect()
            .await?)
    }

    // ==================== ADMIN ====================

    async fn platform_stats(&self, now: i64) -> StoreResult<PlatformStats> {
        let users = self.collection::<Document>(USERS);
        let jobs = self.collection::<Document>(JOBS);
        let applications = self.collection::<Document>(APPLICATIONS);

        let mut stats = PlatformStats::default();

        for kind in [UserType::Teacher, UserType::Institution, UserType::Admin] {
            let count = users.count_documents(doc! { "userType": kind.as_str() }).await?;
            stats.users_by_type.insert(kind.as_str().to_string(), count);
        }
        stats.active_users = users.count_documents(doc! { "is_active": true }).await?;

        stats.total_jobs = jobs.count_documents(doc! { "is_deleted": { "$ne": true } }).await?;
        stats.open_jobs = jobs
            .count_documents(doc! {
                "is_active": true,
                "is_deleted": { "$ne": true },
                "expiresAt": { "$gt": now },
            })
            .await?;

        for status in ApplicationStatus::ALL {
            let count = applications
                .count_documents(doc! { "status": status.as_str() })
                .await?;
            stats
                .applications_by_status
                .insert(status.as_str().to_string(), count);
        }

        stats.active_subscriptions = self
            .collection::<Document>(SUBSCRIPTIONS)
            .count_documents(doc! { "status": "active", "ends_at": { "$gt": now } })
            .await?;
        stats.total_reviews = self
            .collection::<Document>(REVIEWS)
            .count_documents(doc! {})
            .await?;

        Ok(stats)
    }
}
