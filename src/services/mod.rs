pub mod admin_service;
pub mod application_service;
pub mod auth_service;
pub mod bookmark_service;
pub mod job_service;
pub mod notification_service;
pub mod payment_gateway;
pub mod profile_service;
pub mod review_service;
pub mod subscription_service;
