pub mod admin;
pub mod health;
pub mod usage;

use actix_web::dev::Payload;
use actix_web::{web, FromRequest, HttpRequest};
use std::future::{ready, Ready};
use uuid::Uuid;

use crate::utils::error::UsageError;

pub const USER_ID_HEADER: &str = "X-User-Id";

/// The authenticated customer, as forwarded by the auth layer in front of
/// this service.
#[derive(Debug, Clone, Copy)]
pub struct CustomerId(pub Uuid);

impl FromRequest for CustomerId {
    type Error = UsageError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let parsed = req
            .headers()
            .get(USER_ID_HEADER)
            .ok_or_else(|| UsageError::Unauthorized(format!("Missing {} header", USER_ID_HEADER)))
            .and_then(|value| {
                value
                    .to_str()
                    .ok()
                    .and_then(|s| Uuid::parse_str(s.trim()).ok())
                    .ok_or_else(|| UsageError::Unauthorized(format!("Invalid {} header", USER_ID_HEADER)))
            })
            .map(CustomerId);
        ready(parsed)
    }
}

/// Malformed JSON bodies get the same envelope as other validation errors.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| UsageError::Validation(err.to_string()).into())
}

/// Routes, mounted under `/api/v1`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .app_data(json_config())
            .service(
                web::scope("/customer")
                    .service(usage::track_usage)
                    .service(usage::track_discount)
                    .service(usage::get_usage_history)
                    .service(usage::get_usage)
                    .service(usage::reset_usage),
            )
            .service(web::scope("/admin").service(admin::get_usage_metrics))
            .route("/health", web::get().to(health::health_check)),
    );
}
