use actix_web::web::Data;
use actix_web::HttpResponse;
use serde_json::json;

use crate::models::common::ApiResponse;
use crate::services::database::DatabaseService;
use crate::utils::error::UsageError;

pub async fn health_check(db: Data<DatabaseService>) -> Result<HttpResponse, UsageError> {
    db.health_check()?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(json!({ "status": "ok" }))))
}
