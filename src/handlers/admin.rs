use actix_web::web::{Data, Query};
use actix_web::{get, HttpResponse};
use serde::Deserialize;

use crate::models::common::ApiResponse;
use crate::services::metrics::MetricsService;
use crate::utils::error::UsageError;

#[derive(Debug, Deserialize)]
pub struct MetricsQuery {
    pub refresh: Option<bool>,
}

#[get("/usage-metrics")]
pub async fn get_usage_metrics(
    metrics: Data<MetricsService>,
    query: Query<MetricsQuery>,
) -> Result<HttpResponse, UsageError> {
    let dashboard = metrics.dashboard(query.refresh.unwrap_or(false))?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(dashboard)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::configure;
    use crate::models::tier::SubscriptionTier;
    use crate::services::clock::ManualClock;
    use crate::services::database::DatabaseService;
    use crate::services::notifier::LogNotifier;
    use crate::services::usage::UsageService;
    use actix_web::{test, App};
    use chrono::{Duration, TimeZone, Utc};
    use serde_json::Value;
    use std::sync::Arc;
    use uuid::Uuid;

    #[actix_web::test]
    async fn metrics_endpoint_reports_and_refreshes() {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2026, 3, 10, 9, 0, 0).unwrap());
        let db = DatabaseService::new();
        let usage = UsageService::new(db.clone(), Arc::new(clock.clone()), Arc::new(LogNotifier));
        let metrics = MetricsService::new(db, Arc::new(clock.clone()), Duration::seconds(300));
        let app = test::init_service(
            App::new()
                .app_data(Data::new(metrics))
                .configure(configure),
        )
        .await;

        usage.track_service_usage(Uuid::new_v4(), "cleaning", SubscriptionTier::Homecare).unwrap();
        let req = test::TestRequest::get().uri("/api/v1/admin/usage-metrics").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["trackedUsers"], 1);
        assert_eq!(body["data"]["usersByTier"]["HOMECARE"], 1);

        usage.track_service_usage(Uuid::new_v4(), "cleaning", SubscriptionTier::Starter).unwrap();
        let req = test::TestRequest::get().uri("/api/v1/admin/usage-metrics").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["trackedUsers"], 1);

        let req = test::TestRequest::get()
            .uri("/api/v1/admin/usage-metrics?refresh=true")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["trackedUsers"], 2);
    }
}
