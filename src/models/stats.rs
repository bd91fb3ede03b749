use std::collections::BTreeMap;

use serde::Serialize;

/// Totais exibidos no dashboard do admin
#[derive(Debug, Clone, Default, PartialEq, Serialize, utoipa::ToSchema)]
pub struct PlatformStats {
    pub users_by_type: BTreeMap<String, u64>,
    pub active_users: u64,
    pub total_jobs: u64,
    pub open_jobs: u64,
    pub applications_by_status: BTreeMap<String, u64>,
    pub active_subscriptions: u64,
    pub total_reviews: u64,
}
