pub mod admin;
pub mod applications;
pub mod auth;
pub mod bookmarks;
pub mod health;
pub mod jobs;
pub mod metrics;
pub mod notifications;
pub mod profiles;
pub mod response;
pub mod reviews;
pub mod subscriptions;
pub mod swagger;

use actix_web::web;

use crate::middleware::AuthMiddleware;
use crate::utils::AppError;

/// Registers every route. Everything under `/api` goes through the auth
/// middleware, which lets the public routes through without a token.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        AppError::bad_request("INVALID_JSON", format!("Invalid request body: {}", err)).into()
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, _req| {
        AppError::bad_request("INVALID_QUERY", format!("Invalid query string: {}", err)).into()
    }))
    .app_data(web::PathConfig::default().error_handler(|err, _req| {
        AppError::bad_request("INVALID_PATH", format!("Invalid path: {}", err)).into()
    }))
    // Health check
    .route("/health", web::get().to(health::health_check))
    // Metrics
    .route("/metrics", web::get().to(metrics::get_metrics))
    .service(
        web::scope("/api")
            .wrap(AuthMiddleware)
            // ==================== AUTH ====================
            .service(
                web::scope("/auth")
                    .route("/register", web::post().to(auth::register))
                    .route("/login", web::post().to(auth::login))
                    .route("/refresh", web::post().to(auth::refresh_token))
                    .route("/me", web::get().to(auth::get_me)),
            )
            // ==================== PROFILES ====================
            .service(
                web::scope("/teachers")
                    .route("/profile", web::get().to(profiles::get_teacher_profile))
                    .route("/profile", web::put().to(profiles::update_teacher_profile)),
            )
            .service(
                web::scope("/institutions")
                    .route("/profile", web::get().to(profiles::get_institution_profile))
                    .route("/profile", web::put().to(profiles::update_institution_profile))
                    .route("/{user_id}", web::get().to(profiles::get_public_institution)),
            )
            // ==================== JOBS ====================
            .service(
                web::scope("/jobs")
                    .route("", web::get().to(jobs::search_jobs))
                    .route("", web::post().to(jobs::create_job))
                    // must stay ahead of /{id}
                    .route("/mine", web::get().to(jobs::my_jobs))
                    .route("/{id}", web::get().to(jobs::get_job))
                    .route("/{id}", web::put().to(jobs::update_job))
                    .route("/{id}", web::delete().to(jobs::delete_job)),
            )
            // ==================== APPLICATIONS ====================
            .service(
                web::scope("/applications")
                    .route("", web::post().to(applications::submit_application))
                    .route("/mine", web::get().to(applications::my_applications))
                    .route("/job/{job_id}", web::get().to(applications::job_applications))
                    .route("/{id}/status", web::patch().to(applications::update_status))
                    .route("/{id}/withdraw", web::post().to(applications::withdraw)),
            )
            // ==================== BOOKMARKS ====================
            .service(
                web::scope("/bookmarks")
                    .route("", web::post().to(bookmarks::add_bookmark))
                    .route("", web::get().to(bookmarks::list_bookmarks))
                    .route("/check/{job_id}", web::get().to(bookmarks::check_bookmark))
                    .route("/{job_id}", web::delete().to(bookmarks::remove_bookmark)),
            )
            // ==================== NOTIFICATIONS ====================
            .service(
                web::scope("/notifications")
                    .route("", web::get().to(notifications::list_notifications))
                    .route("/unread-count", web::get().to(notifications::unread_count))
                    .route("/read-all", web::patch().to(notifications::mark_all_read))
                    .route("/{id}/read", web::patch().to(notifications::mark_read))
                    .route("/{id}", web::delete().to(notifications::delete_notification)),
            )
            // ==================== SUBSCRIPTIONS ====================
            .service(
                web::scope("/subscriptions")
                    .route("/plans", web::get().to(subscriptions::list_plans))
                    .route("/order", web::post().to(subscriptions::create_order))
                    .route("/verify", web::post().to(subscriptions::verify_payment))
                    .route("/current", web::get().to(subscriptions::current))
                    .route("/cancel", web::post().to(subscriptions::cancel)),
            )
            // ==================== REVIEWS ====================
            .service(
                web::scope("/reviews")
                    .route("", web::post().to(reviews::create_review))
                    .route("/institution/{id}", web::get().to(reviews::institution_reviews)),
            )
            // ==================== ADMIN ====================
            .service(
                web::scope("/admin")
                    .route("/dashboard", web::get().to(admin::dashboard))
                    .route("/users", web::get().to(admin::list_users))
                    .route("/users/{id}/status", web::patch().to(admin::set_user_status))
                    .route("/jobs/{id}", web::delete().to(admin::remove_job)),
            ),
    );
}
