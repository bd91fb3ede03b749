use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::database::Store;
use crate::models::{Notification, NotificationKind};
use crate::services::auth_service::{load_active_user, Claims};
use crate::utils::validation::{new_id, parse_id};
use crate::utils::AppError;

const DEFAULT_LIMIT: u64 = 20;
const MAX_LIMIT: u64 = 100;

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
pub struct NotificationQuery {
    #[serde(default)]
    pub unread_only: bool,
    pub limit: Option<u64>,
}

impl NotificationQuery {
    pub fn limit(&self) -> u64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct NotificationList {
    pub notifications: Vec<Notification>,
    pub unread_count: u64,
}

pub fn build(
    user_id: &str,
    kind: NotificationKind,
    title: impl Into<String>,
    message: impl Into<String>,
    link: Option<String>,
    related_id: Option<String>,
) -> Notification {
    Notification {
        id: new_id(),
        user_id: user_id.to_string(),
        kind,
        title: title.into(),
        message: message.into(),
        link,
        related_id,
        is_read: false,
        created_at: Utc::now().timestamp(),
    }
}

/// Fire-and-forget delivery. The caller's request never waits on it and a
/// failed insert is only logged.
pub fn dispatch_detached(store: Arc<dyn Store>, notification: Notification) {
    tokio::spawn(async move {
        match store.insert_notification(&notification).await {
            Ok(()) => log::debug!(
                "🔔 Notification {} delivered to {}",
                notification.id,
                notification.user_id
            ),
            Err(e) => log::error!(
                "❌ Failed to deliver notification to {}: {}",
                notification.user_id,
                e
            ),
        }
    });
}

pub async fn list(
    store: &dyn Store,
    claims: &Claims,
    query: &NotificationQuery,
) -> Result<NotificationList, AppError> {
    let notifications = store
        .list_notifications(&claims.sub, query.unread_only, query.limit())
        .await?;
    let unread_count = store.count_unread_notifications(&claims.sub).await?;

    Ok(NotificationList {
        notifications,
        unread_count,
    })
}

pub async fn unread_count(store: &dyn Store, claims: &Claims) -> Result<u64, AppError> {
    Ok(store.count_unread_notifications(&claims.sub).await?)
}

pub async fn mark_read(store: &dyn Store, claims: &Claims, raw_id: &str) -> Result<(), AppError> {
    load_active_user(store, &claims.sub).await?;
    let id = parse_id(raw_id, "INVALID_NOTIFICATION_ID", "notification")?;
    if !store.mark_notification_read(&claims.sub, &id).await? {
        return Err(AppError::not_found("NOTIFICATION_NOT_FOUND", "Notification not found"));
    }
    Ok(())
}

pub async fn mark_all_read(store: &dyn Store, claims: &Claims) -> Result<u64, AppError> {
    load_active_user(store, &claims.sub).await?;
    Ok(store.mark_all_notifications_read(&claims.sub).await?)
}

pub async fn delete(store: &dyn Store, claims: &Claims, raw_id: &str) -> Result<(), AppError> {
    load_active_user(store, &claims.sub).await?;
    let id = parse_id(raw_id, "INVALID_NOTIFICATION_ID", "notification")?;
    if !store.delete_notification(&claims.sub, &id).await? {
        return Err(AppError::not_found("NOTIFICATION_NOT_FOUND", "Notification not found"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use crate::models::UserType;
    use crate::testing::{claims_for, user};

    #[tokio::test]
    async fn test_list_and_mark_read() {
        let store = MemoryStore::new();
        store.insert_user(&user("t1", UserType::Teacher)).await.unwrap();
        let claims = claims_for("t1", UserType::Teacher);
        for i in 0..3 {
            let n = build("t1", NotificationKind::System, format!("n{}", i), "hello", None, None);
            store.insert_notification(&n).await.unwrap();
        }
        let first = build("t2", NotificationKind::System, "other", "hello", None, None);
        store.insert_notification(&first).await.unwrap();

        let page = list(&store, &claims, &NotificationQuery { unread_only: false, limit: Some(2) })
            .await
            .unwrap();
        assert_eq!(page.notifications.len(), 2);
        assert_eq!(page.unread_count, 3);

        let id = page.notifications[0].id.clone();
        mark_read(&store, &claims, &id).await.unwrap();
        assert_eq!(unread_count(&store, &claims).await.unwrap(), 2);

        let err = mark_read(&store, &claims, &first.id).await.unwrap_err();
        assert_eq!(err.code(), "NOTIFICATION_NOT_FOUND");

        assert_eq!(mark_all_read(&store, &claims).await.unwrap(), 2);
        delete(&store, &claims, &id).await.unwrap();
        let err = delete(&store, &claims, &id).await.unwrap_err();
        assert_eq!(err.code(), "NOTIFICATION_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_deactivated_user_cannot_modify_notifications() {
        let store = MemoryStore::new();
        store.insert_user(&user("t1", UserType::Teacher)).await.unwrap();
        let claims = claims_for("t1", UserType::Teacher);
        let n = build("t1", NotificationKind::System, "welcome", "hello", None, None);
        store.insert_notification(&n).await.unwrap();

        store.set_user_active("t1", false, Utc::now().timestamp()).await.unwrap();
        assert_eq!(mark_read(&store, &claims, &n.id).await.unwrap_err().code(), "ACCOUNT_INACTIVE");
        assert_eq!(mark_all_read(&store, &claims).await.unwrap_err().code(), "ACCOUNT_INACTIVE");
        assert_eq!(delete(&store, &claims, &n.id).await.unwrap_err().code(), "ACCOUNT_INACTIVE");
        assert_eq!(store.count_unread_notifications("t1").await.unwrap(), 1);
    }

    #[test]
    fn test_limit_is_clamped() {
        assert_eq!(NotificationQuery::default().limit(), 20);
        assert_eq!(NotificationQuery { unread_only: false, limit: Some(0) }.limit(), 1);
        assert_eq!(NotificationQuery { unread_only: false, limit: Some(500) }.limit(), 100);
    }

    #[tokio::test]
    async fn test_dispatch_detached_inserts() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        dispatch_detached(
            store.clone(),
            build("i1", NotificationKind::ApplicationReceived, "New application", "hi", None, None),
        );

        for _ in 0..50 {
            if store.count_unread_notifications("i1").await.unwrap() == 1 {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        panic!("notification was never delivered");
    }
}
