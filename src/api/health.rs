use actix_web::{HttpResponse, Responder, web};
use chrono::Utc;

use crate::models::{HealthResponse, RequestStats};
use crate::store::RequestStore;

pub const INDEX_TEXT: &str = "Bot richieste ferie/permessi è attivo! 👍";

/* =========================
Liveness banner
========================= */
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Bot is running", body = String, example = json!("Bot richieste ferie/permessi è attivo! 👍"))
    ),
    tag = "Health"
)]
pub async fn index() -> impl Responder {
    HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body(INDEX_TEXT)
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    ),
    tag = "Health"
)]
pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: Utc::now(),
    })
}

/* =========================
Request counters
========================= */
#[utoipa::path(
    get,
    path = "/stats",
    responses(
        (status = 200, description = "Request counts by status", body = RequestStats)
    ),
    tag = "Health"
)]
pub async fn stats(store: web::Data<RequestStore>) -> impl Responder {
    let stats = store.stats().await;
    tracing::debug!(total = stats.total, pending = stats.pending, "Stats requested");
    HttpResponse::Ok().json(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::participant::Participant;
    use crate::model::request::{NewRequest, RequestDetails};
    use actix_web::{App, test};
    use chrono::NaiveDate;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[actix_web::test]
    async fn index_reports_the_bot_is_running() {
        let app = test::init_service(App::new().route("/", web::get().to(index))).await;

        let body = test::call_and_read_body(&app, test::TestRequest::get().uri("/").to_request()).await;
        assert_eq!(body, INDEX_TEXT.as_bytes());
    }

    #[actix_web::test]
    async fn health_is_healthy() {
        let app = test::init_service(App::new().route("/health", web::get().to(health))).await;

        let resp: HealthResponse =
            test::call_and_read_body_json(&app, test::TestRequest::get().uri("/health").to_request())
                .await;
        assert_eq!(resp.status, "healthy");
    }

    #[actix_web::test]
    async fn stats_reflect_the_store() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(RequestStore::open(dir.path().join("requests_data.json")).await);
        let day = NaiveDate::from_ymd_opt(2025, 7, 10).unwrap();
        store
            .create(NewRequest::new(
                &Participant::new(7, "Mario", None),
                RequestDetails::Leave {
                    start_date: day,
                    end_date: day,
                },
                None,
            ))
            .await
            .unwrap();

        let app = test::init_service(
            App::new()
                .app_data(web::Data::from(store.clone()))
                .route("/stats", web::get().to(stats)),
        )
        .await;

        let resp: RequestStats =
            test::call_and_read_body_json(&app, test::TestRequest::get().uri("/stats").to_request())
                .await;
        assert_eq!(
            resp,
            RequestStats {
                total: 1,
                pending: 1,
                approved: 0,
                denied: 0,
            }
        );
    }
}
