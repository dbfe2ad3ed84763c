use crate::{api::health, config::Config};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::web;
use std::sync::Arc;

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config) {
    // Helper to build per-route limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let per_ms = if requests_per_min == 0 {
            1
        } else {
            (60_000 / requests_per_min as u64).max(1)
        };
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min.max(1))
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .expect("period and burst size are non-zero");
        Governor::new(&cfg)
    }

    let health_limiter = Arc::new(build_limiter(config.rate_health_per_min));

    // Public, read-only routes
    cfg.service(
        web::resource("/")
            .wrap(health_limiter.clone())
            .route(web::get().to(health::index)),
    )
    .service(
        web::resource("/health")
            .wrap(health_limiter.clone())
            .route(web::get().to(health::health)),
    )
    .service(
        web::resource("/stats")
            .wrap(health_limiter)
            .route(web::get().to(health::stats)),
    );
}
