use actix_web::web::{Data, Json, Query};
use actix_web::{get, post, HttpResponse};
use validator::Validate;

use crate::handlers::CustomerId;
use crate::models::common::ApiResponse;
use crate::models::tier::SubscriptionTier;
use crate::models::usage::{TrackDiscountRequest, TrackUsageRequest, UsageQuery};
use crate::services::usage::UsageService;
use crate::utils::error::UsageError;

#[post("/track-usage")]
pub async fn track_usage(
    usage: Data<UsageService>,
    customer: CustomerId,
    payload: Json<TrackUsageRequest>,
) -> Result<HttpResponse, UsageError> {
    let payload = payload.into_inner();
    payload.validate()?;
    let tier: SubscriptionTier = payload.subscription_tier.parse()?;

    let period = usage.track_service_usage(customer.0, &payload.service_type, tier)?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(period)))
}

#[post("/track-discount")]
pub async fn track_discount(
    usage: Data<UsageService>,
    customer: CustomerId,
    payload: Json<TrackDiscountRequest>,
) -> Result<HttpResponse, UsageError> {
    let payload = payload.into_inner();
    payload.validate()?;
    let tier: SubscriptionTier = payload.subscription_tier.parse()?;

    let period = usage.track_discount_usage(customer.0, payload.discount_amount, tier)?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(period)))
}

#[get("/usage")]
pub async fn get_usage(
    usage: Data<UsageService>,
    customer: CustomerId,
    query: Query<UsageQuery>,
) -> Result<HttpResponse, UsageError> {
    let tier = query
        .subscription_tier
        .as_deref()
        .map(str::parse::<SubscriptionTier>)
        .transpose()?;

    let summary = usage.get_usage(customer.0, tier)?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(summary)))
}

#[get("/usage/history")]
pub async fn get_usage_history(
    usage: Data<UsageService>,
    customer: CustomerId,
) -> Result<HttpResponse, UsageError> {
    let history = usage.usage_history(customer.0)?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(history)))
}

#[post("/reset-usage")]
pub async fn reset_usage(
    usage: Data<UsageService>,
    customer: CustomerId,
) -> Result<HttpResponse, UsageError> {
    match usage.reset_usage_for_period(customer.0)? {
        Some(_) => Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
            (),
            "Usage counters reset".to_string(),
        ))),
        None => Ok(HttpResponse::Ok().json(ApiResponse::ok())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::{configure, USER_ID_HEADER};
    use crate::services::clock::ManualClock;
    use crate::services::database::DatabaseService;
    use crate::services::notifier::RecordingNotifier;
    use actix_web::{http::StatusCode, test, App};
    use chrono::{TimeZone, Utc};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use uuid::Uuid;

    fn service(clock: &ManualClock) -> UsageService {
        UsageService::new(
            DatabaseService::new(),
            Arc::new(clock.clone()),
            Arc::new(RecordingNotifier::default()),
        )
    }

    fn clock() -> ManualClock {
        ManualClock::new(Utc.with_ymd_and_hms(2026, 3, 10, 9, 0, 0).unwrap())
    }

    #[actix_web::test]
    async fn track_usage_then_read_summary() {
        let clock = clock();
        let app = test::init_service(
            App::new()
                .app_data(Data::new(service(&clock)))
                .configure(configure),
        )
        .await;
        let user = Uuid::new_v4().to_string();

        for _ in 0..4 {
            let req = test::TestRequest::post()
                .uri("/api/v1/customer/track-usage")
                .insert_header((USER_ID_HEADER, user.as_str()))
                .set_json(json!({"serviceType": "cleaning", "subscriptionTier": "STARTER"}))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::OK);
        }

        let req = test::TestRequest::get()
            .uri("/api/v1/customer/usage")
            .insert_header((USER_ID_HEADER, user.as_str()))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["servicesUsed"], 4);
        assert_eq!(body["data"]["limits"]["maxServicesPerMonth"], 4);
        assert_eq!(body["data"]["status"], "WARNING");
        assert_eq!(body["data"]["warnings"][0]["kind"], "LIMIT_REACHED");
        assert_eq!(body["data"]["warnings"][0]["category"], "services");
        assert_eq!(body["data"]["warnings"][1]["suggestedTier"], "HOMECARE");
    }

    #[actix_web::test]
    async fn discount_is_capped_over_http() {
        let clock = clock();
        let app = test::init_service(
            App::new()
                .app_data(Data::new(service(&clock)))
                .configure(configure),
        )
        .await;
        let user = Uuid::new_v4().to_string();

        let mut last = Value::Null;
        for amount in [80, 40] {
            let req = test::TestRequest::post()
                .uri("/api/v1/customer/track-discount")
                .insert_header((USER_ID_HEADER, user.as_str()))
                .set_json(json!({"discountAmount": amount, "subscriptionTier": "HOMECARE"}))
                .to_request();
            last = test::call_and_read_body_json(&app, req).await;
        }
        assert_eq!(last["data"]["discountsSaved"].as_f64(), Some(100.0));
    }

    #[actix_web::test]
    async fn invalid_input_is_a_bad_request() {
        let clock = clock();
        let app = test::init_service(
            App::new()
                .app_data(Data::new(service(&clock)))
                .configure(configure),
        )
        .await;
        let user = Uuid::new_v4().to_string();

        let bad_tier = test::TestRequest::post()
            .uri("/api/v1/customer/track-usage")
            .insert_header((USER_ID_HEADER, user.as_str()))
            .set_json(json!({"serviceType": "cleaning", "subscriptionTier": "GOLD"}))
            .to_request();
        let resp = test::call_service(&app, bad_tier).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);

        let negative = test::TestRequest::post()
            .uri("/api/v1/customer/track-discount")
            .insert_header((USER_ID_HEADER, user.as_str()))
            .set_json(json!({"discountAmount": -10, "subscriptionTier": "HOMECARE"}))
            .to_request();
        assert_eq!(test::call_service(&app, negative).await.status(), StatusCode::BAD_REQUEST);

        for _ in 0..2 {
            let oversized = test::TestRequest::post()
                .uri("/api/v1/customer/track-discount")
                .insert_header((USER_ID_HEADER, user.as_str()))
                .set_json(json!({"discountAmount": u64::MAX, "subscriptionTier": "PRIORITY"}))
                .to_request();
            assert_eq!(test::call_service(&app, oversized).await.status(), StatusCode::BAD_REQUEST);
        }
        let other = test::TestRequest::post()
            .uri("/api/v1/customer/track-usage")
            .insert_header((USER_ID_HEADER, Uuid::new_v4().to_string().as_str()))
            .set_json(json!({"serviceType": "cleaning", "subscriptionTier": "STARTER"}))
            .to_request();
        assert_eq!(test::call_service(&app, other).await.status(), StatusCode::OK);

        let malformed = test::TestRequest::post()
            .uri("/api/v1/customer/track-usage")
            .insert_header((USER_ID_HEADER, user.as_str()))
            .insert_header(("content-type", "application/json"))
            .set_payload("{not json")
            .to_request();
        assert_eq!(test::call_service(&app, malformed).await.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn missing_user_header_is_unauthorized() {
        let clock = clock();
        let app = test::init_service(
            App::new()
                .app_data(Data::new(service(&clock)))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/v1/customer/usage").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::get()
            .uri("/api/v1/customer/usage")
            .insert_header((USER_ID_HEADER, "not-a-uuid"))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn reset_zeroes_usage_and_tolerates_unknown_users() {
        let clock = clock();
        let app = test::init_service(
            App::new()
                .app_data(Data::new(service(&clock)))
                .configure(configure),
        )
        .await;
        let user = Uuid::new_v4().to_string();

        let req = test::TestRequest::post()
            .uri("/api/v1/customer/reset-usage")
            .insert_header((USER_ID_HEADER, user.as_str()))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["success"], true);

        let req = test::TestRequest::post()
            .uri("/api/v1/customer/track-usage")
            .insert_header((USER_ID_HEADER, user.as_str()))
            .set_json(json!({"serviceType": "priority_cleaning", "subscriptionTier": "HOMECARE"}))
            .to_request();
        test::call_service(&app, req).await;

        let req = test::TestRequest::post()
            .uri("/api/v1/customer/reset-usage")
            .insert_header((USER_ID_HEADER, user.as_str()))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["success"], true);

        let req = test::TestRequest::get()
            .uri("/api/v1/customer/usage?subscriptionTier=homecare")
            .insert_header((USER_ID_HEADER, user.as_str()))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["servicesUsed"], 0);
        assert_eq!(body["data"]["priorityBookings"], 0);
        assert_eq!(body["data"]["status"], "EMPTY");
    }

    #[actix_web::test]
    async fn history_lists_superseded_periods() {
        let clock = clock();
        let app = test::init_service(
            App::new()
                .app_data(Data::new(service(&clock)))
                .configure(configure),
        )
        .await;
        let user = Uuid::new_v4().to_string();

        for _ in 0..2 {
            let req = test::TestRequest::post()
                .uri("/api/v1/customer/track-usage")
                .insert_header((USER_ID_HEADER, user.as_str()))
                .set_json(json!({"serviceType": "cleaning", "subscriptionTier": "STARTER"}))
                .to_request();
            test::call_service(&app, req).await;
            clock.advance(chrono::Duration::days(31));
        }

        let req = test::TestRequest::get()
            .uri("/api/v1/customer/usage/history")
            .insert_header((USER_ID_HEADER, user.as_str()))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let history = body["data"].as_array().unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0]["servicesUsed"], 1);
    }
}
