use std::time::Instant;

use actix_web::{web, HttpResponse};

use crate::api::response;
use crate::models::{Subscription, SubscriptionPlan};
use crate::services::auth_service::Claims;
use crate::services::subscription_service::{
    self, CreateOrderRequest, CurrentSubscription, OrderResponse, PlansQuery, VerifyPaymentRequest,
};
use crate::state::AppState;
use crate::utils::AppError;

#[utoipa::path(
    get,
    path = "/api/subscriptions/plans",
    tag = "Subscriptions",
    params(PlansQuery),
    responses(
        (status = 200, description = "Active plans, cheapest first", body = Vec<SubscriptionPlan>),
        (status = 400, description = "Unknown audience")
    )
)]
pub async fn list_plans(
    state: web::Data<AppState>,
    query: web::Query<PlansQuery>,
) -> Result<HttpResponse, AppError> {
    let started = Instant::now();
    log::info!("💳 GET /subscriptions/plans - audience: {:?}", query.audience);

    let plans = subscription_service::list_plans(state.store(), &query).await?;
    Ok(response::ok(started, "Plans retrieved", plans))
}

#[utoipa::path(
    post,
    path = "/api/subscriptions/order",
    tag = "Subscriptions",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Pending subscription with a Razorpay order, or an active free plan", body = OrderResponse),
        (status = 403, description = "Plan not available for this account type"),
        (status = 404, description = "Plan not found"),
        (status = 502, description = "Payment gateway error"),
        (status = 503, description = "Payments not configured")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_order(
    state: web::Data<AppState>,
    claims: web::ReqData<Claims>,
    request: web::Json<CreateOrderRequest>,
) -> Result<HttpResponse, AppError> {
    let started = Instant::now();
    log::info!("💳 POST /subscriptions/order - user: {}, plan: {}", claims.sub, request.plan_code);

    let order = subscription_service::create_order(
        state.store(),
        state.payments.as_ref(),
        &claims,
        &request,
    )
    .await
    .inspect_err(|e| log::warn!("❌ Order for {} failed: {}", claims.sub, e))?;

    Ok(response::created(started, "Order created", order))
}

#[utoipa::path(
    post,
    path = "/api/subscriptions/verify",
    tag = "Subscriptions",
    request_body = VerifyPaymentRequest,
    responses(
        (status = 200, description = "Subscription activated", body = Subscription),
        (status = 400, description = "Invalid payment signature"),
        (status = 404, description = "Subscription not found"),
        (status = 409, description = "Subscription is no longer pending")
    ),
    security(("bearer_auth" = []))
)]
pub async fn verify_payment(
    state: web::Data<AppState>,
    claims: web::ReqData<Claims>,
    request: web::Json<VerifyPaymentRequest>,
) -> Result<HttpResponse, AppError> {
    let started = Instant::now();
    log::info!(
        "🔏 POST /subscriptions/verify - user: {}, order: {}",
        claims.sub,
        request.razorpay_order_id
    );

    let subscription =
        subscription_service::verify_payment(&state.store, state.payments.as_ref(), &claims, &request)
            .await
            .inspect_err(|e| log::warn!("❌ Payment verification failed for {}: {}", claims.sub, e))?;

    Ok(response::ok(started, "Payment verified", subscription))
}

#[utoipa::path(
    get,
    path = "/api/subscriptions/current",
    tag = "Subscriptions",
    responses(
        (status = 200, description = "Active subscription and its plan, or null", body = CurrentSubscription)
    ),
    security(("bearer_auth" = []))
)]
pub async fn current(
    state: web::Data<AppState>,
    claims: web::ReqData<Claims>,
) -> Result<HttpResponse, AppError> {
    let started = Instant::now();
    let current = subscription_service::current(state.store(), &claims).await?;
    Ok(response::ok(started, "Current subscription retrieved", current))
}

#[utoipa::path(
    post,
    path = "/api/subscriptions/cancel",
    tag = "Subscriptions",
    responses(
        (status = 200, description = "Subscription cancelled", body = Subscription),
        (status = 404, description = "No active subscription")
    ),
    security(("bearer_auth" = []))
)]
pub async fn cancel(
    state: web::Data<AppState>,
    claims: web::ReqData<Claims>,
) -> Result<HttpResponse, AppError> {
    let started = Instant::now();
    log::info!("🛑 POST /subscriptions/cancel - user: {}", claims.sub);

    let subscription = subscription_service::cancel(state.store(), &claims).await?;
    Ok(response::ok(started, "Subscription cancelled", subscription))
}
