use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::database::Store;
use crate::models::{NotificationKind, Subscription, SubscriptionPlan, SubscriptionStatus, UserType};
use crate::services::auth_service::{load_active_user, Claims};
use crate::services::notification_service;
use crate::services::payment_gateway::PaymentGateway;
use crate::utils::validation::new_id;
use crate::utils::AppError;

const DAY_SECS: i64 = 86_400;

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct PlansQuery {
    pub audience: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreateOrderRequest {
    pub plan_code: String,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct VerifyPaymentRequest {
    pub razorpay_order_id: String,
    pub razorpay_payment_id: String,
    pub razorpay_signature: String,
}

/// Checkout data for the browser. For free plans `order_id`/`key_id` are
/// absent and the subscription is already active.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct OrderResponse {
    pub subscription_id: String,
    pub status: SubscriptionStatus,
    pub order_id: Option<String>,
    pub amount: i64,
    pub currency: String,
    pub key_id: Option<String>,
    pub plan: SubscriptionPlan,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct CurrentSubscription {
    pub subscription: Subscription,
    pub plan: Option<SubscriptionPlan>,
}

/// Active job posts allowed for an institution right now; None means unlimited.
pub async fn job_post_limit(
    store: &dyn Store,
    institution_id: &str,
    free_limit: u64,
    now: i64,
) -> Result<Option<u64>, AppError> {
    let Some(active) = store.find_active_subscription(institution_id, now).await? else {
        return Ok(Some(free_limit));
    };
    match store.find_plan(&active.plan_code).await? {
        Some(plan) => Ok(plan.job_post_limit),
        None => {
            log::warn!("⚠️  Active subscription {} references unknown plan {}", active.id, active.plan_code);
            Ok(Some(free_limit))
        }
    }
}

pub async fn list_plans(
    store: &dyn Store,
    query: &PlansQuery,
) -> Result<Vec<SubscriptionPlan>, AppError> {
    let audience = match query.audience.as_deref().map(str::trim).filter(|a| !a.is_empty()) {
        None => None,
        Some(raw) => Some(
            UserType::parse(raw)
                .filter(|a| *a != UserType::Admin)
                .ok_or_else(|| {
                    AppError::bad_request("INVALID_AUDIENCE", "audience must be 'teacher' or 'institution'")
                })?,
        ),
    };
    Ok(store.list_plans(audience).await?)
}

/// Makes `subscription` the caller's only active subscription.
async fn activate(
    store: &dyn Store,
    mut subscription: Subscription,
    plan: &SubscriptionPlan,
    payment_id: Option<String>,
    now: i64,
) -> Result<Subscription, AppError> {
    if let Some(mut previous) = store.find_active_subscription(&subscription.user_id, now).await? {
        if previous.id != subscription.id {
            previous.status = SubscriptionStatus::Cancelled;
            previous.updated_at = now;
            store.replace_subscription(&previous).await?;
            log::info!("🔁 Subscription {} replaced by {}", previous.id, subscription.id);
        }
    }

    subscription.status = SubscriptionStatus::Active;
    subscription.razorpay_payment_id = payment_id;
    subscription.starts_at = Some(now);
    subscription.ends_at = Some(now + i64::from(plan.duration_days) * DAY_SECS);
    subscription.updated_at = now;
    Ok(subscription)
}

pub async fn create_order(
    store: &dyn Store,
    payments: &dyn PaymentGateway,
    claims: &Claims,
    request: &CreateOrderRequest,
) -> Result<OrderResponse, AppError> {
    let user = load_active_user(store, &claims.sub).await?;

    let plan = store
        .find_plan(request.plan_code.trim())
        .await?
        .ok_or_else(|| AppError::not_found("PLAN_NOT_FOUND", "Subscription plan not found"))?;
    if !plan.is_active || plan.audience != user.user_type {
        return Err(AppError::forbidden(
            "PLAN_NOT_AVAILABLE",
            "This plan is not available for your account type",
        ));
    }

    let now = Utc::now().timestamp();
    let mut subscription = Subscription {
        id: new_id(),
        user_id: user.id.clone(),
        plan_code: plan.code.clone(),
        status: SubscriptionStatus::Created,
        amount: plan.price,
        currency: plan.currency.clone(),
        razorpay_order_id: None,
        razorpay_payment_id: None,
        starts_at: None,
        ends_at: None,
        created_at: now,
        updated_at: now,
    };

    if plan.is_free() {
        let subscription = activate(store, subscription, &plan, None, now).await?;
        store.insert_subscription(&subscription).await?;
        log::info!("🆓 Free plan {} activated for {}", plan.code, user.id);

        return Ok(OrderResponse {
            subscription_id: subscription.id,
            status: subscription.status,
            order_id: None,
            amount: 0,
            currency: subscription.currency,
            key_id: None,
            plan,
        });
    }

    let order = payments
        .create_order(plan.price, &plan.currency, &subscription.id)
        .await?;
    subscription.razorpay_order_id = Some(order.id.clone());
    store.insert_subscription(&subscription).await?;
    log::info!("🧾 Order {} created for {} ({})", order.id, user.id, plan.code);

    Ok(OrderResponse {
        subscription_id: subscription.id,
        status: subscription.status,
        order_id: Some(order.id),
        amount: order.amount,
        currency: order.currency,
        key_id: payments.key_id().map(str::to_string),
        plan,
    })
}

pub async fn verify_payment(
    store: &Arc<dyn Store>,
    payments: &dyn PaymentGateway,
    claims: &Claims,
    request: &VerifyPaymentRequest,
) -> Result<Subscription, AppError> {
    let subscription = store
        .find_subscription_by_order(&claims.sub, &request.razorpay_order_id)
        .await?
        .ok_or_else(|| AppError::not_found("SUBSCRIPTION_NOT_FOUND", "No order found for this payment"))?;

    let valid = payments.verify_signature(
        &request.razorpay_order_id,
        &request.razorpay_payment_id,
        &request.razorpay_signature,
    )?;
    if !valid {
        log::warn!("🚫 Invalid payment signature for order {}", request.razorpay_order_id);
        return Err(AppError::bad_request(
            "INVALID_PAYMENT_SIGNATURE",
            "Payment signature verification failed",
        ));
    }

    match subscription.status {
        SubscriptionStatus::Created => {}
        // Checkout callbacks can be replayed
        SubscriptionStatus::Active => return Ok(subscription),
        SubscriptionStatus::Cancelled | SubscriptionStatus::Expired => {
            return Err(AppError::conflict(
                "SUBSCRIPTION_NOT_PENDING",
                "This order can no longer be activated",
            ))
        }
    }

    let plan = store
        .find_plan(&subscription.plan_code)
        .await?
        .ok_or_else(|| AppError::not_found("PLAN_NOT_FOUND", "Subscription plan not found"))?;

    let now = Utc::now().timestamp();
    let subscription = activate(
        store.as_ref(),
        subscription,
        &plan,
        Some(request.razorpay_payment_id.clone()),
        now,
    )
    .await?;
    store.replace_subscription(&subscription).await?;
    log::info!("✅ Subscription {} active for {} ({})", subscription.id, claims.sub, plan.code);

    notification_service::dispatch_detached(
        store.clone(),
        notification_service::build(
            &claims.sub,
            NotificationKind::Subscription,
            "Subscription activated",
            format!("Your {} plan is now active.", plan.name),
            Some("/subscription".to_string()),
            Some(subscription.id.clone()),
        ),
    );

    Ok(subscription)
}

pub async fn current(
    store: &dyn Store,
    claims: &Claims,
) -> Result<Option<CurrentSubscription>, AppError> {
    let now = Utc::now().timestamp();
    let Some(subscription) = store.find_active_subscription(&claims.sub, now).await? else {
        return Ok(None);
    };
    let plan = store.find_plan(&subscription.plan_code).await?;
    Ok(Some(CurrentSubscription { subscription, plan }))
}

pub async fn cancel(store: &dyn Store, claims: &Claims) -> Result<Subscription, AppError> {
    let now = Utc::now().timestamp();
    let mut subscription = store
        .find_active_subscription(&claims.sub, now)
        .await?
        .ok_or_else(|| AppError::not_found("NO_ACTIVE_SUBSCRIPTION", "No active subscription"))?;

    subscription.status = SubscriptionStatus::Cancelled;
    subscription.updated_at = now;
    store.replace_subscription(&subscription).await?;
    log::info!("🛑 Subscription {} cancelled by {}", subscription.id, claims.sub);

    Ok(subscription)
}
