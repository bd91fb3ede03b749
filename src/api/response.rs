use std::time::Instant;

use actix_web::{http::StatusCode, HttpResponse};
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Meta {
    processing_time_ms: u128,
    timestamp: String,
}

#[derive(Debug, Serialize)]
struct Envelope<'a, T: Serialize> {
    success: bool,
    message: &'a str,
    data: T,
    meta: Meta,
}

/// Success envelope `{ success, message, data, meta }` with the time spent
/// since `started`.
pub fn respond<T: Serialize>(status: StatusCode, started: Instant, message: &str, data: T) -> HttpResponse {
    HttpResponse::build(status).json(Envelope {
        success: true,
        message,
        data,
        meta: Meta {
            processing_time_ms: started.elapsed().as_millis(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        },
    })
}

pub fn ok<T: Serialize>(started: Instant, message: &str, data: T) -> HttpResponse {
    respond(StatusCode::OK, started, message, data)
}

pub fn created<T: Serialize>(started: Instant, message: &str, data: T) -> HttpResponse {
    respond(StatusCode::CREATED, started, message, data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[actix_web::test]
    async fn test_envelope_shape() {
        let response = created(Instant::now(), "Created", serde_json::json!({ "id": "x" }));
        assert_eq!(response.status(), StatusCode::CREATED);

        let bytes = to_bytes(response.into_body()).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "Created");
        assert_eq!(body["data"]["id"], "x");
        assert!(body["meta"]["processingTimeMs"].is_u64());
        assert!(body["meta"]["timestamp"].is_string());
    }
}
