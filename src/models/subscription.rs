use serde::{Deserialize, Serialize};

use super::user::UserType;

/// Plano de assinatura (collection "subscription_plans", seeded on startup)
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct SubscriptionPlan {
    /// Stable plan code, e.g. "institution_premium"
    #[serde(rename = "_id")]
    pub code: String,
    pub name: String,
    pub audience: UserType,
    /// Price in the smallest currency unit (paise)
    pub price: i64,
    pub currency: String,
    pub duration_days: u32,
    /// Max concurrently active job posts; None means unlimited
    pub job_post_limit: Option<u64>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

impl SubscriptionPlan {
    pub fn is_free(&self) -> bool {
        self.price == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// Order created, waiting for payment
    Created,
    Active,
    Cancelled,
    Expired,
}

/// Collection "subscriptions"
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Subscription {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    pub plan_code: String,
    pub status: SubscriptionStatus,
    pub amount: i64,
    pub currency: String,
    pub razorpay_order_id: Option<String>,
    pub razorpay_payment_id: Option<String>,
    pub starts_at: Option<i64>,
    pub ends_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Subscription {
    pub fn is_active_at(&self, now: i64) -> bool {
        self.status == SubscriptionStatus::Active && self.ends_at.map_or(false, |end| end > now)
    }
}
