use async_trait::async_trait;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::config::RazorpaySettings;
use crate::utils::AppError;

const RAZORPAY_API_BASE: &str = "https://api.razorpay.com/v1";

type HmacSha256 = Hmac<Sha256>;

/// Order as returned by the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayOrder {
    pub id: String,
    pub amount: i64,
    pub currency: String,
}

#[derive(Debug, Serialize)]
struct CreateOrderBody<'a> {
    amount: i64,
    currency: &'a str,
    receipt: &'a str,
}

/// Checkout provider used by subscription purchases.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Public key id handed to the browser checkout. None when payments are off.
    fn key_id(&self) -> Option<&str>;

    async fn create_order(
        &self,
        amount: i64,
        currency: &str,
        receipt: &str,
    ) -> Result<GatewayOrder, AppError>;

    /// Checks the checkout callback signature for `order_id|payment_id`.
    fn verify_signature(
        &self,
        order_id: &str,
        payment_id: &str,
        signature: &str,
    ) -> Result<bool, AppError>;
}

fn not_configured() -> AppError {
    AppError::new(
        actix_web::http::StatusCode::SERVICE_UNAVAILABLE,
        "PAYMENTS_NOT_CONFIGURED",
        "Online payments are not configured",
    )
}

fn gateway_error(message: impl Into<String>) -> AppError {
    AppError::new(
        actix_web::http::StatusCode::BAD_GATEWAY,
        "PAYMENT_GATEWAY_ERROR",
        message,
    )
}

/// HMAC-SHA256 keyed with `secret` over `order_id|payment_id`, compared to the
/// hex `signature` in constant time.
pub fn verify_checkout_signature(
    secret: &str,
    order_id: &str,
    payment_id: &str,
    signature: &str,
) -> bool {
    let Ok(expected) = hex::decode(signature.trim()) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(format!("{}|{}", order_id, payment_id).as_bytes());
    mac.verify_slice(&expected).is_ok()
}

// ==================== RAZORPAY ====================

pub struct RazorpayGateway {
    settings: RazorpaySettings,
    client: reqwest::Client,
}

impl RazorpayGateway {
    pub fn new(settings: RazorpaySettings) -> Self {
        Self {
            settings,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl PaymentGateway for RazorpayGateway {
    fn key_id(&self) -> Option<&str> {
        Some(&self.settings.key_id)
    }

    async fn create_order(
        &self,
        amount: i64,
        currency: &str,
        receipt: &str,
    ) -> Result<GatewayOrder, AppError> {
        log::info!("💳 Creating Razorpay order: {} {} ({})", amount, currency, receipt);

        let response = self
            .client
            .post(format!("{}/orders", RAZORPAY_API_BASE))
            .basic_auth(&self.settings.key_id, Some(&self.settings.key_secret))
            .json(&CreateOrderBody {
                amount,
                currency,
                receipt,
            })
            .send()
            .await
            .map_err(|e| gateway_error(format!("Failed to reach payment gateway: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            log::error!("❌ Razorpay order failed: {} {}", status, body);
            return Err(gateway_error(format!("Payment gateway returned {}", status)));
        }

        let order: GatewayOrder = response
            .json()
            .await
            .map_err(|e| gateway_error(format!("Invalid payment gateway response: {}", e)))?;

        log::info!("✅ Razorpay order created: {}", order.id);
        Ok(order)
    }

    fn verify_signature(
        &self,
        order_id: &str,
        payment_id: &str,
        signature: &str,
    ) -> Result<bool, AppError> {
        Ok(verify_checkout_signature(
            &self.settings.key_secret,
            order_id,
            payment_id,
            signature,
        ))
    }
}

// ==================== DISABLED ====================

/// Used when no Razorpay keys are configured; free plans keep working.
pub struct DisabledGateway;

#[async_trait]
impl PaymentGateway for DisabledGateway {
    fn key_id(&self) -> Option<&str> {
        None
    }

    async fn create_order(&self, _: i64, _: &str, _: &str) -> Result<GatewayOrder, AppError> {
        Err(not_configured())
    }

    fn verify_signature(&self, _: &str, _: &str, _: &str) -> Result<bool, AppError> {
        Err(not_configured())
    }
}
