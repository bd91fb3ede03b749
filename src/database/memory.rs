use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use super::store::{Page, Store, StoreError, StoreResult};
use crate::models::{
    Application, ApplicationStatus, Bookmark, InstitutionProfile, Job, JobQuery, Notification,
    PlatformStats, Review, Subscription, SubscriptionPlan, SubscriptionStatus, TeacherProfile,
    User, UserType,
};

#[derive(Default)]
struct Tables {
    users: HashMap<String, User>,
    teacher_profiles: HashMap<String, TeacherProfile>,
    institution_profiles: HashMap<String, InstitutionProfile>,
    jobs: HashMap<String, Job>,
    applications: HashMap<String, Application>,
    bookmarks: HashMap<String, Bookmark>,
    notifications: HashMap<String, Notification>,
    plans: HashMap<String, SubscriptionPlan>,
    subscriptions: HashMap<String, Subscription>,
    reviews: HashMap<String, Review>,
}

/// In-process `Store` with the same unique-pair semantics as the Mongo indexes.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))
    }
}

fn newest_first<T>(items: &mut [T], key: impl Fn(&T) -> i64) {
    items.sort_by(|a, b| key(b).cmp(&key(a)));
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        self.read().map(|_| ())
    }

    // ==================== USERS ====================

    async fn insert_user(&self, user: &User) -> StoreResult<()> {
        let mut tables = self.write()?;
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Duplicate(format!("users.email: {}", user.email)));
        }
        tables.users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn find_user(&self, id: &str) -> StoreResult<Option<User>> {
        Ok(self.read()?.users.get(id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self.read()?.users.values().find(|u| u.email == email).cloned())
    }

    async fn set_user_active(&self, id: &str, is_active: bool, now: i64) -> StoreResult<bool> {
        let mut tables = self.write()?;
        match tables.users.get_mut(id) {
            Some(user) => {
                user.is_active = is_active;
                user.updated_at = now;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn record_login(&self, id: &str, at: i64) -> StoreResult<()> {
        if let Some(user) = self.write()?.users.get_mut(id) {
            user.last_login = Some(at);
        }
        Ok(())
    }

    async fn list_users(
        &self,
        user_type: Option<UserType>,
        page: Page,
    ) -> StoreResult<(Vec<User>, u64)> {
        let mut users: Vec<User> = self
            .read()?
            .users
            .values()
            .filter(|u| user_type.map_or(true, |kind| u.user_type == kind))
            .cloned()
            .collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        let total = users.len() as u64;
        let users = users
            .into_iter()
            .skip(page.skip as usize)
            .take(page.limit as usize)
            .collect();
        Ok((users, total))
    }

    // ==================== PROFILES ====================

    async fn find_teacher_profile(&self, user_id: &str) -> StoreResult<Option<TeacherProfile>> {
        Ok(self.read()?.teacher_profiles.get(user_id).cloned())
    }

    async fn save_teacher_profile(&self, profile: &TeacherProfile) -> StoreResult<()> {
        self.write()?
            .teacher_profiles
            .insert(profile.user_id.clone(), profile.clone());
        Ok(())
    }

    async fn find_institution_profile(
        &self,
        user_id: &str,
    ) -> StoreResult<Option<InstitutionProfile>> {
        Ok(self.read()?.institution_profiles.get(user_id).cloned())
    }

    async fn save_institution_profile(&self, profile: &InstitutionProfile) -> StoreResult<()> {
        self.write()?
            .institution_profiles
            .insert(profile.user_id.clone(), profile.clone());
        Ok(())
    }

    // ==================== JOBS ====================

    async fn insert_job(&self, job: &Job) -> StoreResult<()> {
        let mut tables = self.write()?;
        if tables.jobs.contains_key(&job.id) {
            return Err(StoreError::Duplicate(format!("jobs._id: {}", job.id)));
        }
        tables.jobs.insert(job.id.clone(), job.clone());
        Ok(())
    }

    async fn find_job(&self, id: &str) -> StoreResult<Option<Job>> {
        Ok(self.read()?.jobs.get(id).cloned())
    }

    async fn replace_job(&self, job: &Job) -> StoreResult<()> {
        let mut tables = self.write()?;
        if let Some(stored) = tables.jobs.get_mut(&job.id) {
            *stored = job.clone();
        }
        Ok(())
    }

    async fn search_jobs(&self, query: &JobQuery, now: i64) -> StoreResult<(Vec<Job>, u64)> {
        let mut jobs: Vec<Job> = self
            .read()?
            .jobs
            .values()
            .filter(|job| query.matches(job, now))
            .cloned()
            .collect();
        query.sort_jobs(&mut jobs);
        let total = jobs.len() as u64;
        let jobs = jobs
            .into_iter()
            .skip(query.skip() as usize)
            .take(query.limit() as usize)
            .collect();
        Ok((jobs, total))
    }

    async fn list_institution_jobs(&self, institution_id: &str) -> StoreResult<Vec<Job>> {
        let mut jobs: Vec<Job> = self
            .read()?
            .jobs
            .values()
            .filter(|job| job.institution_id == institution_id && !job.is_deleted)
            .cloned()
            .collect();
        newest_first(&mut jobs, |job| job.created_at);
        Ok(jobs)
    }

    async fn count_open_institution_jobs(&self, institution_id: &str, now: i64) -> StoreResult<u64> {
        Ok(self
            .read()?
            .jobs
            .values()
            .filter(|job| job.institution_id == institution_id && job.is_open(now))
            .count() as u64)
    }

    async fn increment_applications_count(&self, job_id: &str) -> StoreResult<()> {
        if let Some(job) = self.write()?.jobs.get_mut(job_id) {
            job.applications_count += 1;
        }
        Ok(())
    }

    async fn deactivate_expired_jobs(&self, now: i64) -> StoreResult<u64> {
        let mut tables = self.write()?;
        let mut changed = 0;
        for job in tables.jobs.values_mut() {
            if job.is_active && job.is_expired(now) {
                job.is_active = false;
                job.updated_at = now;
                changed += 1;
            }
        }
        Ok(changed)
    }

    // ==================== APPLICATIONS ====================

    async fn insert_application(&self, application: &Application) -> StoreResult<()> {
        let mut tables = self.write()?;
        let exists = tables
            .applications
            .values()
            .any(|a| a.job_id == application.job_id && a.teacher_id == application.teacher_id);
        if exists {
            return Err(StoreError::Duplicate(format!(
                "applications(job_id, teacher_id): ({}, {})",
                application.job_id, application.teacher_id
            )));
        }
        tables
            .applications
            .insert(application.id.clone(), application.clone());
        Ok(())
    }

    async fn find_application(&self, id: &str) -> StoreResult<Option<Application>> {
        Ok(self.read()?.applications.get(id).cloned())
    }

    async fn find_application_for(
        &self,
        job_id: &str,
        teacher_id: &str,
    ) -> StoreResult<Option<Application>> {
        Ok(self
            .read()?
            .applications
            .values()
            .find(|a| a.job_id == job_id && a.teacher_id == teacher_id)
            .cloned())
    }

    async fn list_teacher_applications(&self, teacher_id: &str) -> StoreResult<Vec<Application>> {
        let mut applications: Vec<Application> = self
            .read()?
            .applications
            .values()
            .filter(|a| a.teacher_id == teacher_id)
            .cloned()
            .collect();
        newest_first(&mut applications, |a| a.applied_at);
        Ok(applications)
    }

    async fn list_job_applications(&self, job_id: &str) -> StoreResult<Vec<Application>> {
        let mut applications: Vec<Application> = self
            .read()?
            .applications
            .values()
            .filter(|a| a.job_id == job_id)
            .cloned()
            .collect();
        newest_first(&mut applications, |a| a.applied_at);
        Ok(applications)
    }

    async fn replace_application(&self, application: &Application) -> StoreResult<()> {
        let mut tables = self.write()?;
        if let Some(stored) = tables.applications.get_mut(&application.id) {
            *stored = application.clone();
        }
        Ok(())
    }

    // ==================== BOOKMARKS ====================

    async fn insert_bookmark(&self, bookmark: &Bookmark) -> StoreResult<()> {
        let mut tables = self.write()?;
        let exists = tables
            .bookmarks
            .values()
            .any(|b| b.teacher_id == bookmark.teacher_id && b.job_id == bookmark.job_id);
        if exists {
            return Err(StoreError::Duplicate(format!(
                "bookmarks(teacher_id, job_id): ({}, {})",
                bookmark.teacher_id, bookmark.job_id
            )));
        }
        tables.bookmarks.insert(bookmark.id.clone(), bookmark.clone());
        Ok(())
    }

    async fn find_bookmark(&self, teacher_id: &str, job_id: &str) -> StoreResult<Option<Bookmark>> {
        Ok(self
            .read()?
            .bookmarks
            .values()
            .find(|b| b.teacher_id == teacher_id && b.job_id == job_id)
            .cloned())
    }

    async fn list_bookmarks(
        &self,
        teacher_id: &str,
        category: Option<&str>,
    ) -> StoreResult<Vec<Bookmark>> {
        let mut bookmarks: Vec<Bookmark> = self
            .read()?
            .bookmarks
            .values()
            .filter(|b| b.teacher_id == teacher_id)
            .filter(|b| category.map_or(true, |c| b.category.as_deref() == Some(c)))
            .cloned()
            .collect();
        newest_first(&mut bookmarks, |b| b.created_at);
        Ok(bookmarks)
    }

    async fn delete_bookmark(&self, teacher_id: &str, job_id: &str) -> StoreResult<bool> {
        let mut tables = self.write()?;
        let before = tables.bookmarks.len();
        tables
            .bookmarks
            .retain(|_, b| !(b.teacher_id == teacher_id && b.job_id == job_id));
        Ok(tables.bookmarks.len() < before)
    }

    // ==================== NOTIFICATIONS ====================

    async fn insert_notification(&self, notification: &Notification) -> StoreResult<()> {
        self.write()?
            .notifications
            .insert(notification.id.clone(), notification.clone());
        Ok(())
    }

    async fn list_notifications(
        &self,
        user_id: &str,
        unread_only: bool,
        limit: u64,
    ) -> StoreResult<Vec<Notification>> {
        let mut notifications: Vec<Notification> = self
            .read()?
            .notifications
            .values()
            .filter(|n| n.user_id == user_id && (!unread_only || !n.is_read))
            .cloned()
            .collect();
        newest_first(&mut notifications, |n| n.created_at);
        notifications.truncate(limit as usize);
        Ok(notifications)
    }

    async fn count_unread_notifications(&self, user_id: &str) -> StoreResult<u64> {
        Ok(self
            .read()?
            .notifications
            .values()
            .filter(|n| n.user_id == user_id && !n.is_read)
            .count() as u64)
    }

    async fn mark_notification_read(&self, user_id: &str, id: &str) -> StoreResult<bool> {
        let mut tables = self.write()?;
        match tables.notifications.get_mut(id) {
            Some(n) if n.user_id == user_id => {
                n.is_read = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn mark_all_notifications_read(&self, user_id: &str) -> StoreResult<u64> {
        let mut tables = self.write()?;
        let mut changed = 0;
        for n in tables.notifications.values_mut() {
            if n.user_id == user_id && !n.is_read {
                n.is_read = true;
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn delete_notification(&self, user_id: &str, id: &str) -> StoreResult<bool> {
        let mut tables = self.write()?;
        let owned = tables
            .notifications
            .get(id)
            .is_some_and(|n| n.user_id == user_id);
        if owned {
            tables.notifications.remove(id);
        }
        Ok(owned)
    }

    // ==================== SUBSCRIPTIONS ====================

    async fn upsert_plan(&self, plan: &SubscriptionPlan) -> StoreResult<()> {
        self.write()?.plans.insert(plan.code.clone(), plan.clone());
        Ok(())
    }

    async fn list_plans(&self, audience: Option<UserType>) -> StoreResult<Vec<SubscriptionPlan>> {
        let mut plans: Vec<SubscriptionPlan> = self
            .read()?
            .plans
            .values()
            .filter(|p| p.is_active && audience.map_or(true, |a| p.audience == a))
            .cloned()
            .collect();
        plans.sort_by(|a, b| a.price.cmp(&b.price).then_with(|| a.code.cmp(&b.code)));
        Ok(plans)
    }

    async fn find_plan(&self, code: &str) -> StoreResult<Option<SubscriptionPlan>> {
        Ok(self.read()?.plans.get(code).filter(|p| p.is_active).cloned())
    }

    async fn insert_subscription(&self, subscription: &Subscription) -> StoreResult<()> {
        self.write()?
            .subscriptions
            .insert(subscription.id.clone(), subscription.clone());
        Ok(())
    }

    async fn replace_subscription(&self, subscription: &Subscription) -> StoreResult<()> {
        let mut tables = self.write()?;
        if let Some(stored) = tables.subscriptions.get_mut(&subscription.id) {
            *stored = subscription.clone();
        }
        Ok(())
    }

    async fn find_subscription_by_order(
        &self,
        user_id: &str,
        order_id: &str,
    ) -> StoreResult<Option<Subscription>> {
        Ok(self
            .read()?
            .subscriptions
            .values()
            .find(|s| s.user_id == user_id && s.razorpay_order_id.as_deref() == Some(order_id))
            .cloned())
    }

    async fn find_active_subscription(
        &self,
        user_id: &str,
        now: i64,
    ) -> StoreResult<Option<Subscription>> {
        Ok(self
            .read()?
            .subscriptions
            .values()
            .filter(|s| s.user_id == user_id && s.is_active_at(now))
            .max_by_key(|s| s.ends_at)
            .cloned())
    }

    async fn expire_subscriptions(&self, now: i64) -> StoreResult<u64> {
        let mut tables = self.write()?;
        let mut changed = 0;
        for s in tables.subscriptions.values_mut() {
            if s.status == SubscriptionStatus::Active && s.ends_at.map_or(true, |end| end <= now) {
                s.status = SubscriptionStatus::Expired;
                s.updated_at = now;
                changed += 1;
            }
        }
        Ok(changed)
    }

    // ==================== REVIEWS ====================

    async fn insert_review(&self, review: &Review) -> StoreResult<()> {
        let mut tables = self.write()?;
        let exists = tables
            .reviews
            .values()
            .any(|r| r.author_id == review.author_id && r.institution_id == review.institution_id);
        if exists {
            return Err(StoreError::Duplicate(format!(
                "reviews(author_id, institution_id): ({}, {})",
                review.author_id, review.institution_id
            )));
        }
        tables.reviews.insert(review.id.clone(), review.clone());
        Ok(())
    }

    async fn list_institution_reviews(&self, institution_id: &str) -> StoreResult<Vec<Review>> {
        let mut reviews: Vec<Review> = self
            .read()?
            .reviews
            .values()
            .filter(|r| r.institution_id == institution_id)
            .cloned()
            .collect();
        newest_first(&mut reviews, |r| r.created_at);
        Ok(reviews)
    }

    // ==================== ADMIN ====================

    async fn platform_stats(&self, now: i64) -> StoreResult<PlatformStats> {
        let tables = self.read()?;
        let mut stats = PlatformStats::default();

        for kind in [UserType::Teacher, UserType::Institution, UserType::Admin] {
            let count = tables.users.values().filter(|u| u.user_type == kind).count() as u64;
            stats.users_by_type.insert(kind.as_str().to_string(), count);
        }
        stats.active_users = tables.users.values().filter(|u| u.is_active).count() as u64;

        stats.total_jobs = tables.jobs.values().filter(|j| !j.is_deleted).count() as u64;
        stats.open_jobs = tables.jobs.values().filter(|j| j.is_open(now)).count() as u64;

        for status in ApplicationStatus::ALL {
            let count = tables
                .applications
                .values()
                .filter(|a| a.status == status)
                .count() as u64;
            stats
                .applications_by_status
                .insert(status.as_str().to_string(), count);
        }

        stats.active_subscriptions = tables
            .subscriptions
            .values()
            .filter(|s| s.is_active_at(now))
            .count() as u64;
        stats.total_reviews = tables.reviews.len() as u64;

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{sample_application, sample_job};

    #[tokio::test]
    async fn test_application_pair_is_unique() {
        let store = MemoryStore::new();
        let first = sample_application("a1", "job-1", "teacher-1");
        store.insert_application(&first).await.unwrap();

        let again = sample_application("a2", "job-1", "teacher-1");
        match store.insert_application(&again).await {
            Err(StoreError::Duplicate(_)) => {}
            other => panic!("expected duplicate, got {:?}", other),
        }

        let other_job = sample_application("a3", "job-2", "teacher-1");
        assert!(store.insert_application(&other_job).await.is_ok());
    }

    #[tokio::test]
    async fn test_deactivate_expired_jobs() {
        let store = MemoryStore::new();
        let now = 1_700_000_000;
        let mut stale = sample_job("j1", "inst", now - 100);
        stale.expires_at = now - 1;
        store.insert_job(&stale).await.unwrap();
        store.insert_job(&sample_job("j2", "inst", now)).await.unwrap();

        assert_eq!(store.deactivate_expired_jobs(now).await.unwrap(), 1);
        assert!(!store.find_job("j1").await.unwrap().unwrap().is_active);
        assert!(store.find_job("j2").await.unwrap().unwrap().is_active);
        assert_eq!(store.count_open_institution_jobs("inst", now).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_notifications_are_scoped_to_owner() {
        let store = MemoryStore::new();
        let n = Notification {
            id: "n1".into(),
            user_id: "owner".into(),
            kind: crate::models::NotificationKind::System,
            title: "Hello".into(),
            message: "Welcome".into(),
            link: None,
            related_id: None,
            is_read: false,
            created_at: 1,
        };
        store.insert_notification(&n).await.unwrap();

        assert!(!store.mark_notification_read("intruder", "n1").await.unwrap());
        assert!(!store.delete_notification("intruder", "n1").await.unwrap());
        assert_eq!(store.count_unread_notifications("owner").await.unwrap(), 1);
        assert!(store.mark_notification_read("owner", "n1").await.unwrap());
        assert_eq!(store.count_unread_notifications("owner").await.unwrap(), 0);
    }
}
