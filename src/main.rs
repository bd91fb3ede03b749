mod api;
mod config;
mod database;
mod jobs;
mod middleware;
mod models;
mod seeds;
mod services;
mod state;
mod utils;

#[cfg(test)]
mod testing;

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::Config;
use crate::database::{MemoryStore, MongoDB, Store};
use crate::services::payment_gateway::{DisabledGateway, PaymentGateway, RazorpayGateway};
use crate::state::AppState;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    // Get configuration from environment
    let config = Config::from_env().map_err(|e| {
        log::error!("❌ Invalid configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    log::info!("🚀 Starting EduHire API...");

    let store: Arc<dyn Store> = if config.database_url.starts_with("memory://") {
        log::warn!("⚠️  Using the in-memory store, data is lost on restart");
        Arc::new(MemoryStore::new())
    } else {
        let db = MongoDB::new(&config.database_url).await.map_err(|e| {
            log::error!("❌ Failed to connect to MongoDB: {}", e);
            std::io::Error::new(std::io::ErrorKind::ConnectionRefused, e.to_string())
        })?;
        log::info!("✅ MongoDB connected successfully");
        Arc::new(db)
    };

    let payments: Arc<dyn PaymentGateway> = match config.razorpay.clone() {
        Some(settings) => {
            log::info!("💳 Razorpay checkout enabled (key: {})", settings.key_id);
            Arc::new(RazorpayGateway::new(settings))
        }
        None => {
            log::warn!("⚠️  RAZORPAY_KEY_ID not set, paid plans are disabled");
            Arc::new(DisabledGateway)
        }
    };

    // 🌱 Seeds
    seeds::subscription_plans_seed::seed_subscription_plans(store.as_ref()).await;
    if let Some(admin) = &config.admin_seed {
        seeds::admin_seed::seed_admin(store.as_ref(), admin, config.bcrypt_cost).await;
    }

    // 🧹 Background jobs
    log::info!("📅 Starting background jobs...");
    jobs::expiry_sweeper::start_expiry_sweeper(store.clone(), config.sweep_interval_secs);

    let host = config.host.clone();
    let port = config.port;
    let cors_origins = config.cors_origins.clone();
    let state = web::Data::new(AppState::new(store, payments, config));

    log::info!("🌐 Server starting on {}:{}", host, port);
    log::info!("📚 Swagger UI available at: http://{}:{}/swagger-ui/", host, port);
    log::info!("📄 OpenAPI spec at: http://{}:{}/api-docs/openapi.json", host, port);

    HttpServer::new(move || {
        let cors = cors_origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
            .allowed_methods(vec!["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                actix_web::http::header::AUTHORIZATION,
                actix_web::http::header::CONTENT_TYPE,
                actix_web::http::header::ACCEPT,
            ])
            .expose_headers(vec![actix_web::http::header::CONTENT_TYPE])
            .supports_credentials()
            .max_age(3600);

        // Generate OpenAPI specification
        let openapi = api::swagger::ApiDoc::openapi();

        App::new()
            .app_data(state.clone())
            .wrap(middleware::RequestMetrics)
            .wrap(cors)
            .wrap(middleware::SecurityHeaders)
            .wrap(Logger::default())
            .service(SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", openapi))
            .configure(api::configure)
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}
