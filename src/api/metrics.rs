use actix_web::HttpResponse;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

static REQUEST_COUNT: AtomicU64 = AtomicU64::new(0);
static CLIENT_ERROR_COUNT: AtomicU64 = AtomicU64::new(0);
static SERVER_ERROR_COUNT: AtomicU64 = AtomicU64::new(0);
static APPLICATIONS_SUBMITTED: AtomicU64 = AtomicU64::new(0);

pub fn increment_request_count() {
    REQUEST_COUNT.fetch_add(1, Ordering::Relaxed);
}

/// Counts a finished response by its status class.
pub fn record_status(status: u16) {
    match status {
        400..=499 => {
            CLIENT_ERROR_COUNT.fetch_add(1, Ordering::Relaxed);
        }
        500..=599 => {
            SERVER_ERROR_COUNT.fetch_add(1, Ordering::Relaxed);
        }
        _ => {}
    }
}

pub fn increment_applications_submitted() {
    APPLICATIONS_SUBMITTED.fetch_add(1, Ordering::Relaxed);
}

#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct MetricsResponse {
    pub http_requests_total: u64,
    pub http_client_errors_total: u64,
    pub http_server_errors_total: u64,
    pub applications_submitted_total: u64,
}

impl MetricsResponse {
    pub fn snapshot() -> Self {
        MetricsResponse {
            http_requests_total: REQUEST_COUNT.load(Ordering::Relaxed),
            http_client_errors_total: CLIENT_ERROR_COUNT.load(Ordering::Relaxed),
            http_server_errors_total: SERVER_ERROR_COUNT.load(Ordering::Relaxed),
            applications_submitted_total: APPLICATIONS_SUBMITTED.load(Ordering::Relaxed),
        }
    }

    /// Prometheus text exposition format.
    pub fn render(&self) -> String {
        format!(
            "# HELP http_requests_total Total number of HTTP requests\n\
             # TYPE http_requests_total counter\n\
             http_requests_total {}\n\
             \n\
             # HELP http_client_errors_total Responses with a 4xx status\n\
             # TYPE http_client_errors_total counter\n\
             http_client_errors_total {}\n\
             \n\
             # HELP http_server_errors_total Responses with a 5xx status\n\
             # TYPE http_server_errors_total counter\n\
             http_server_errors_total {}\n\
             \n\
             # HELP applications_submitted_total Job applications accepted\n\
             # TYPE applications_submitted_total counter\n\
             applications_submitted_total {}\n",
            self.http_requests_total,
            self.http_client_errors_total,
            self.http_server_errors_total,
            self.applications_submitted_total
        )
    }
}

#[utoipa::path(
    get,
    path = "/metrics",
    tag = "Health",
    responses(
        (status = 200, description = "Prometheus counters", body = String, content_type = "text/plain")
    )
)]
pub async fn get_metrics() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(MetricsResponse::snapshot().render())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_lists_every_counter() {
        let text = MetricsResponse {
            http_requests_total: 7,
            http_client_errors_total: 2,
            http_server_errors_total: 1,
            applications_submitted_total: 3,
        }
        .render();
        assert!(text.contains("http_requests_total 7\n"));
        assert!(text.contains("http_client_errors_total 2\n"));
        assert!(text.contains("http_server_errors_total 1\n"));
        assert!(text.contains("applications_submitted_total 3\n"));
    }
}
