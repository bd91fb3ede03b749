pub mod admin_seed;
pub mod subscription_plans_seed;
