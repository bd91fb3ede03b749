use crate::database::Store;
use crate::models::{SubscriptionPlan, UserType};

/// Upserts the four catalogue plans. Safe to run on every start: prices and
/// limits edited here replace what is stored.
pub async fn seed_subscription_plans(store: &dyn Store) {
    let plans = default_plans();
    log::info!("📋 Subscription plans: upserting {} plans...", plans.len());

    let mut seeded = 0;
    for plan in &plans {
        match store.upsert_plan(plan).await {
            Ok(()) => seeded += 1,
            Err(e) => log::error!("   ❌ Failed to seed plan {}: {}", plan.code, e),
        }
    }

    log::info!("   ✅ {} subscription plans ready", seeded);
}

/// Plan catalogue. Prices are in paise.
pub fn default_plans() -> Vec<SubscriptionPlan> {
    vec![
        SubscriptionPlan {
            code: "teacher_free".into(),
            name: "Teacher Free".into(),
            audience: UserType::Teacher,
            price: 0,
            currency: "INR".into(),
            duration_days: 365,
            job_post_limit: None,
            features: vec![
                "Apply to unlimited jobs".into(),
                "Bookmark jobs".into(),
                "Application status alerts".into(),
            ],
            is_active: true,
        },
        SubscriptionPlan {
            code: "teacher_pro".into(),
            name: "Teacher Pro".into(),
            audience: UserType::Teacher,
            price: 49_900,
            currency: "INR".into(),
            duration_days: 30,
            job_post_limit: None,
            features: vec![
                "Everything in Free".into(),
                "Highlighted profile in applicant lists".into(),
                "Early access to new jobs".into(),
            ],
            is_active: true,
        },
        SubscriptionPlan {
            code: "institution_basic".into(),
            name: "Institution Basic".into(),
            audience: UserType::Institution,
            price: 199_900,
            currency: "INR".into(),
            duration_days: 30,
            job_post_limit: Some(10),
            features: vec![
                "Up to 10 active job posts".into(),
                "Applicant management".into(),
            ],
            is_active: true,
        },
        SubscriptionPlan {
            code: "institution_premium".into(),
            name: "Institution Premium".into(),
            audience: UserType::Institution,
            price: 499_900,
            currency: "INR".into(),
            duration_days: 30,
            job_post_limit: None,
            features: vec![
                "Unlimited active job posts".into(),
                "Applicant management".into(),
                "Featured institution page".into(),
            ],
            is_active: true,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;

    #[tokio::test]
    async fn test_seed_is_idempotent() {
        let store = MemoryStore::new();
        seed_subscription_plans(&store).await;
        seed_subscription_plans(&store).await;

        assert_eq!(store.list_plans(None).await.unwrap().len(), 4);
        let basic = store.find_plan("institution_basic").await.unwrap().unwrap();
        assert_eq!(basic.job_post_limit, Some(10));
    }
}
