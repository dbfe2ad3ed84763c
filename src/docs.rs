use crate::models::{HealthResponse, RequestStats};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Ferie Bot",
        version = "0.1.0",
        description = r#"
## Leave and short-absence request bot

Employees file **ferie** (leave) and **permesso** (short absence) requests
through a chat conversation; a single approver decides them with inline buttons.

This HTTP surface is read-only and only reports liveness and request counters.
"#,
    ),
    paths(
        crate::api::health::index,
        crate::api::health::health,
        crate::api::health::stats,
    ),
    components(schemas(HealthResponse, RequestStats)),
    tags(
        (name = "Health", description = "Liveness and request counters"),
    )
)]
pub struct ApiDoc;
