// ==================== EXPIRY SWEEPER ====================
// Fecha vagas vencidas e expira assinaturas cujo período acabou

use std::sync::Arc;

use chrono::Utc;
use tokio::time::{interval, Duration};

use crate::database::{Store, StoreError};

#[derive(Debug, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub jobs_closed: u64,
    pub subscriptions_expired: u64,
}

/// Spawns the sweeper. It runs once on startup and then every `every_secs`.
pub fn start_expiry_sweeper(store: Arc<dyn Store>, every_secs: u64) {
    log::info!("🧹 Starting expiry sweeper (every {}s)", every_secs);

    tokio::spawn(async move {
        // first tick completes immediately
        let mut interval = interval(Duration::from_secs(every_secs.max(1)));

        loop {
            interval.tick().await;

            match sweep(store.as_ref(), Utc::now().timestamp()).await {
                Ok(report) if report != SweepReport::default() => log::info!(
                    "🧹 Sweep: {} jobs closed, {} subscriptions expired",
                    report.jobs_closed,
                    report.subscriptions_expired
                ),
                Ok(_) => log::debug!("🧹 Sweep: nothing to do"),
                Err(e) => log::error!("❌ Expiry sweep failed: {}", e),
            }
        }
    });
}

/// One pass: deactivates jobs past their expiry and marks lapsed active
/// subscriptions as expired.
pub async fn sweep(store: &dyn Store, now: i64) -> Result<SweepReport, StoreError> {
    let jobs_closed = store.deactivate_expired_jobs(now).await?;
    let subscriptions_expired = store.expire_subscriptions(now).await?;

    Ok(SweepReport {
        jobs_closed,
        subscriptions_expired,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use crate::models::{Subscription, SubscriptionStatus};
    use crate::testing::sample_job;

    #[tokio::test]
    async fn test_sweep_closes_expired_jobs_and_subscriptions() {
        let store = MemoryStore::new();
        let now = Utc::now().timestamp();

        let mut stale = sample_job("j-old", "i1", now - 90 * 86_400);
        stale.expires_at = now - 10;
        let fresh = sample_job("j-new", "i1", now);
        store.insert_job(&stale).await.unwrap();
        store.insert_job(&fresh).await.unwrap();

        let lapsed = Subscription {
            id: "s1".into(),
            user_id: "i1".into(),
            plan_code: "institution_basic".into(),
            status: SubscriptionStatus::Active,
            amount: 199_900,
            currency: "INR".into(),
            razorpay_order_id: Some("order_1".into()),
            razorpay_payment_id: Some("pay_1".into()),
            starts_at: Some(now - 31 * 86_400),
            ends_at: Some(now - 86_400),
            created_at: now - 31 * 86_400,
            updated_at: now - 31 * 86_400,
        };
        store.insert_subscription(&lapsed).await.unwrap();

        let report = sweep(&store, now).await.unwrap();
        assert_eq!(
            report,
            SweepReport {
                jobs_closed: 1,
                subscriptions_expired: 1
            }
        );
        assert!(!store.find_job("j-old").await.unwrap().unwrap().is_active);
        assert!(store.find_job("j-new").await.unwrap().unwrap().is_active);

        // Nothing left on a second pass
        assert_eq!(sweep(&store, now).await.unwrap(), SweepReport::default());
    }
}
