use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "EduHire API",
        version = "1.0.0",
        description = "Job marketplace connecting teachers with schools, colleges and coaching centres.\n\n**Authentication:** Most endpoints require a JWT Bearer access token from `/api/auth/login`.\n\n**Envelope:** Successful responses are wrapped as `{ success, message, data, meta }`; failures as `{ success: false, message, errorCode, action?, details? }`.",
        contact(
            name = "EduHire Team",
            email = "support@eduhire.in"
        )
    ),
    paths(
        // Auth
        crate::api::auth::register,
        crate::api::auth::login,
        crate::api::auth::refresh_token,
        crate::api::auth::get_me,

        // Profiles
        crate::api::profiles::get_teacher_profile,
        crate::api::profiles::update_teacher_profile,
        crate::api::profiles::get_institution_profile,
        crate::api::profiles::update_institution_profile,
        crate::api::profiles::get_public_institution,

        // Jobs
        crate::api::jobs::search_jobs,
        crate::api::jobs::get_job,
        crate::api::jobs::my_jobs,
        crate::api::jobs::create_job,
        crate::api::jobs::update_job,
        crate::api::jobs::delete_job,

        // Applications
        crate::api::applications::submit_application,
        crate::api::applications::my_applications,
        crate::api::applications::job_applications,
        crate::api::applications::update_status,
        crate::api::applications::withdraw,

        // Bookmarks
        crate::api::bookmarks::add_bookmark,
        crate::api::bookmarks::list_bookmarks,
        crate::api::bookmarks::check_bookmark,
        crate::api::bookmarks::remove_bookmark,

        // Notifications
        crate::api::notifications::list_notifications,
        crate::api::notifications::unread_count,
        crate::api::notifications::mark_read,
        crate::api::notifications::mark_all_read,
        crate::api::notifications::delete_notification,

        // Subscriptions
        crate::api::subscriptions::list_plans,
        crate::api::subscriptions::create_order,
        crate::api::subscriptions::verify_payment,
        crate::api::subscriptions::current,
        crate::api::subscriptions::cancel,

        // Reviews
        crate::api::reviews::create_review,
        crate::api::reviews::institution_reviews,

        // Admin
        crate::api::admin::dashboard,
        crate::api::admin::list_users,
        crate::api::admin::set_user_status,
        crate::api::admin::remove_job,

        // Health & Metrics
        crate::api::health::health_check,
        crate::api::metrics::get_metrics,
    ),
    components(
        schemas(
            crate::api::health::HealthResponse,
            crate::api::metrics::MetricsResponse,
            crate::models::ProfileCompletion,
        )
    ),
    tags(
        (name = "Auth", description = "Registration, login and token refresh."),
        (name = "Profiles", description = "Teacher and institution profiles with completion tracking."),
        (name = "Jobs", description = "Job postings: public search, institution management."),
        (name = "Applications", description = "Teacher applications and institution review of them."),
        (name = "Bookmarks", description = "Jobs saved by teachers."),
        (name = "Notifications", description = "In-app notifications."),
        (name = "Subscriptions", description = "Plans and Razorpay checkout."),
        (name = "Reviews", description = "Teacher reviews of institutions."),
        (name = "Admin", description = "Moderation and platform statistics."),
        (name = "Health", description = "Health check and request metrics."),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Access token from /api/auth/login"))
                        .build(),
                ),
            );
        }
    }
}
