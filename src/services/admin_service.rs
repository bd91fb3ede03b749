use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::database::{Page, Store};
use crate::models::{Pagination, PlatformStats, UserInfo, UserType};
use crate::services::auth_service::{require_admin, Claims};
use crate::services::job_service::{load_job, soft_delete};
use crate::utils::validation::parse_id;
use crate::utils::AppError;

const DEFAULT_LIMIT: u64 = 20;
const MAX_LIMIT: u64 = 100;

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
pub struct UserListQuery {
    pub user_type: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UserStatusRequest {
    pub is_active: bool,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct UserList {
    pub users: Vec<UserInfo>,
    pub pagination: Pagination,
}

pub async fn dashboard(store: &dyn Store, claims: &Claims) -> Result<PlatformStats, AppError> {
    require_admin(claims)?;
    Ok(store.platform_stats(Utc::now().timestamp()).await?)
}

pub async fn list_users(
    store: &dyn Store,
    claims: &Claims,
    query: &UserListQuery,
) -> Result<UserList, AppError> {
    require_admin(claims)?;

    let user_type = match query.user_type.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        None => None,
        Some(raw) => Some(
            UserType::parse(raw)
                .ok_or_else(|| AppError::bad_request("INVALID_USER_TYPE", "Unknown user type"))?,
        ),
    };
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);

    let (users, total) = store
        .list_users(
            user_type,
            Page {
                skip: (page - 1) * limit,
                limit,
            },
        )
        .await?;

    Ok(UserList {
        users: users.iter().map(UserInfo::from).collect(),
        pagination: Pagination::new(page, limit, total),
    })
}

pub async fn set_user_status(
    store: &dyn Store,
    claims: &Claims,
    raw_user_id: &str,
    request: &UserStatusRequest,
) -> Result<UserInfo, AppError> {
    require_admin(claims)?;
    let user_id = parse_id(raw_user_id, "INVALID_USER_ID", "user")?;

    if user_id == claims.sub && !request.is_active {
        return Err(AppError::bad_request(
            "CANNOT_DEACTIVATE_SELF",
            "Admins cannot deactivate their own account",
        ));
    }

    let now = Utc::now().timestamp();
    if !store.set_user_active(&user_id, request.is_active, now).await? {
        return Err(AppError::not_found("USER_NOT_FOUND", "User not found"));
    }
    let user = store
        .find_user(&user_id)
        .await?
        .ok_or_else(|| AppError::not_found("USER_NOT_FOUND", "User not found"))?;

    log::info!(
        "🛡️  Admin {} set user {} active={}",
        claims.sub,
        user.id,
        request.is_active
    );
    Ok(UserInfo::from(&user))
}

/// Moderation removal of any institution's job.
pub async fn remove_job(store: &dyn Store, claims: &Claims, raw_job_id: &str) -> Result<(), AppError> {
    require_admin(claims)?;
    let job = load_job(store, raw_job_id).await?;
    let id = job.id.clone();
    soft_delete(store, job).await?;
    log::info!("🛡️  Admin {} removed job {}", claims.sub, id);
    Ok(())
}
