use std::sync::Arc;
use std::time::Duration;

use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer};

mod api;
mod approval;
mod config;
mod conversation;
mod docs;
mod error;
mod model;
mod models;
mod notify;
mod routes;
mod store;
mod telegram;
mod utils;

use config::Config;

use crate::approval::ApprovalCoordinator;
use crate::conversation::ConversationEngine;
use crate::docs::ApiDoc;
use crate::notify::NotificationPort;
use crate::store::{DB_FILE, RequestStore};
use crate::telegram::{Dispatcher, TelegramClient};
use tracing::{info, warn};
use tracing_appender::rolling;
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Bot starting...");

    if config.approver_id.is_none() {
        warn!("MANAGER_CHAT_ID not set: requests will be stored but nobody can decide them");
    }

    let store = Arc::new(RequestStore::open(config.data_dir.join(DB_FILE)).await);
    info!(path = %store.path().display(), "Request store ready");

    let client = Arc::new(TelegramClient::new(
        &config.telegram_api_url,
        &config.bot_token,
        Duration::from_secs(config.poll_timeout_secs),
    )?);
    let notifier: Arc<dyn NotificationPort> = client.clone();

    let engine = Arc::new(ConversationEngine::new(
        store.clone(),
        notifier.clone(),
        config.approver_id,
    ));
    let coordinator = Arc::new(ApprovalCoordinator::new(
        store.clone(),
        notifier,
        config.approver_id,
    ));
    let dispatcher = Arc::new(Dispatcher::new(engine, coordinator, client));
    let poll_timeout_secs = config.poll_timeout_secs;

    if !config.enable_web {
        tokio::select! {
            _ = dispatcher.run(poll_timeout_secs) => {}
            _ = tokio::signal::ctrl_c() => info!("Shutdown requested"),
        }
        return Ok(());
    }

    let server_addr = config.server_addr.clone();
    let server = HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← important: wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(Data::from(store.clone()))
            .configure(|cfg| routes::configure(cfg, &config))
    })
    .bind(&server_addr)?
    .run();
    info!(addr = %server_addr, "HTTP reporter listening");

    actix_web::rt::spawn(async move { dispatcher.run(poll_timeout_secs).await });

    server.await?;
    Ok(())
}
