mod config;
mod handlers;
mod models;
mod services;
mod utils;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::Context;
use dotenv::dotenv;
use std::sync::Arc;

use services::{
    clock::{Clock, SystemClock},
    database::DatabaseService,
    metrics::MetricsService,
    notifier::{LogNotifier, UsageNotifier, WebhookNotifier},
    usage::UsageService,
};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = config::Config::from_env().context("Failed to load configuration")?;

    let database_service = DatabaseService::new();
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let notifier: Arc<dyn UsageNotifier> = match &config.webhook {
        Some(webhook) => {
            log::info!("Publishing usage events to {}", webhook.url);
            Arc::new(WebhookNotifier::new(webhook.url.clone(), webhook.secret.clone()))
        }
        None => {
            log::info!("No usage webhook configured; usage events are only logged");
            Arc::new(LogNotifier)
        }
    };

    let usage_service = UsageService::new(database_service.clone(), clock.clone(), notifier);
    let metrics_service = MetricsService::new(
        database_service.clone(),
        clock,
        chrono::Duration::seconds(config.app.metrics_cache_ttl_secs as i64),
    );

    let bind_address = config.bind_address();
    let cors_origin = config.app.cors_allowed_origin.clone();

    log::info!("Starting usage tracking server on {}", bind_address);

    HttpServer::new(move || {
        let cors = match &cors_origin {
            Some(origin) => Cors::default()
                .allowed_origin(origin)
                .allow_any_method()
                .allow_any_header()
                .supports_credentials(),
            None => Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header(),
        };

        App::new()
            .wrap(Logger::default())
            .wrap(cors)
            .app_data(web::Data::new(database_service.clone()))
            .app_data(web::Data::new(usage_service.clone()))
            .app_data(web::Data::new(metrics_service.clone()))
            .configure(handlers::configure)
    })
    .bind(&bind_address)
    .with_context(|| format!("Failed to bind {}", bind_address))?
    .run()
    .await?;

    Ok(())
}
