use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use volo_api::{build_app_with, ApiConfig};

const API_KEY: &str = "dev-volo-key";

async fn app() -> Router {
    build_app_with(ApiConfig::default())
        .await
        .expect("app should build")
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let parsed = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or(Value::Null)
    };
    (status, parsed)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn authed_get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("x-api-key", API_KEY)
        .body(Body::empty())
        .unwrap()
}

fn authed_post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("x-api-key", API_KEY)
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn health_is_public() {
    let app = app().await;
    let (status, body) = send(&app, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["assistantOnline"], false);
    assert_eq!(body["storage"], "memory");
}

#[tokio::test]
async fn search_filters_by_destination_without_api_key() {
    let app = app().await;
    let (status, body) = send(&app, get("/v1/hotels/search?destination=Oran")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["hotels"][0]["id"], "oran-beach-resort");
}

#[tokio::test]
async fn search_echoes_stay_dates_and_nights() {
    let app = app().await;
    let (status, body) = send(
        &app,
        get(concat!(
            "/v1/hotels/search?destination=Algiers",
            "&checkIn=2025-12-01&checkOut=2025-12-05&guests=2"
        )),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);
    assert_eq!(body["checkIn"], "2025-12-01");
    assert_eq!(body["checkOut"], "2025-12-05");
    assert_eq!(body["guests"], 2);
    assert_eq!(body["nights"], 4);
    assert_eq!(body["hotels"][0]["reviewCount"], 124);
}

#[tokio::test]
async fn malformed_price_bound_is_ignored() {
    let app = app().await;
    let (_, all) = send(&app, get("/v1/hotels/search")).await;
    let (status, body) = send(&app, get("/v1/hotels/search?minPrice=abc&maxPrice=10000")).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["count"].as_u64().unwrap() < all["count"].as_u64().unwrap());
    assert!(body["hotels"]
        .as_array()
        .unwrap()
        .iter()
        .all(|hotel| hotel["id"] != "hotel-aurassi"));
}

#[tokio::test]
async fn hotel_details_and_review_statistics() {
    let app = app().await;
    let (status, body) = send(&app, get("/v1/hotels/hotel-aurassi")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["lowestPrice"], 15000);
    assert_eq!(body["displayPrice"], "15,000 DZD");
    assert_eq!(body["ratingTone"], "excellent");
    assert_eq!(body["stars"], "★★★★⯪");
    assert_eq!(body["reviewSummary"]["total"], 5);
    assert_eq!(body["reviewSummary"]["average"], 4.4);
    assert_eq!(body["reviewSummary"]["distribution"][0]["stars"], 5);
    assert_eq!(body["reviewSummary"]["distribution"][0]["count"], 3);
    assert_eq!(body["reviewSummary"]["distribution"][0]["percentage"], 60.0);

    let (status, body) = send(&app, get("/v1/hotels/missing")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "hotel_not_found");
}

#[tokio::test]
async fn reviews_sort_by_rating() {
    let app = app().await;
    let (status, body) = send(&app, get("/v1/hotels/hotel-aurassi/reviews?sort=lowest")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["hotelId"], "hotel-aurassi");
    assert_eq!(body["reviews"][0]["rating"], 3);
    assert_eq!(body["reviews"][0]["notHelpful"], 1);
    assert!(body["reviews"][0]["posted"].as_str().is_some());

    let (status, _) = send(&app, get("/v1/hotels/hotel-aurassi/reviews?sort=sideways")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn creating_a_review_requires_api_key_and_valid_rating() {
    let app = app().await;
    let review = json!({
        "rating": 4,
        "comment": "Very clean and close to the port",
        "authorName": "Karim"
    });

    let anonymous = Request::builder()
        .method("POST")
        .uri("/v1/hotels/oran-beach-resort/reviews")
        .header("content-type", "application/json")
        .body(Body::from(review.to_string()))
        .unwrap();
    let (status, body) = send(&app, anonymous).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");

    let mut invalid = review.clone();
    invalid["rating"] = json!(9);
    let (status, body) = send(
        &app,
        authed_post("/v1/hotels/oran-beach-resort/reviews", invalid),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_request");

    let (status, created) = send(
        &app,
        authed_post("/v1/hotels/oran-beach-resort/reviews", review),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["hotelId"], "oran-beach-resort");
    assert_eq!(created["author"]["name"], "Karim");

    let review_id = created["id"].as_str().unwrap().to_string();
    let (status, voted) = send(
        &app,
        authed_post(
            &format!("/v1/reviews/{review_id}/helpful"),
            json!({ "helpful": true }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(voted["helpful"], 1);

    let (_, hotel) = send(&app, get("/v1/hotels/oran-beach-resort")).await;
    assert_eq!(hotel["hotel"]["reviewCount"], 53);
    assert_eq!(hotel["discountPercentage"], 20);
}

#[tokio::test]
async fn review_for_unknown_hotel_is_not_found() {
    let app = app().await;
    let (status, _) = send(
        &app,
        authed_post(
            "/v1/hotels/missing/reviews",
            json!({ "rating": 5, "comment": "ok", "authorName": "A" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn rank_puts_preferred_city_first() {
    let app = app().await;
    let (status, body) = send(
        &app,
        authed_post(
            "/v1/hotels/rank",
            json!({
                "filters": { "rating": "4" },
                "preferences": { "destination": "Oran", "budget": 12000 }
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 5);
    assert_eq!(body["hotels"][0]["hotel"]["id"], "oran-beach-resort");
    let reasons = body["hotels"][0]["reasons"].as_array().unwrap();
    assert!(!reasons.is_empty() && reasons.len() <= 3);
    assert!(body["hotels"][0]["aiScore"].as_f64().is_some());
}

#[tokio::test]
async fn rank_reads_camel_case_preferences() {
    let app = app().await;
    let (status, body) = send(
        &app,
        authed_post(
            "/v1/hotels/rank",
            json!({
                "filters": { "minPrice": "9000", "amenities": "wifi" },
                "preferences": {
                    "minRating": 4.7,
                    "preferredAmenities": ["Business Center", "Bar", "Conference Rooms"],
                    "travelDates": ["2025-12-01"]
                }
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 4);
    assert_eq!(body["hotels"][0]["hotel"]["id"], "sheraton-alger");
}

#[tokio::test]
async fn assistant_routes_require_api_key() {
    let app = app().await;
    let request = Request::builder()
        .method("POST")
        .uri("/v1/assistant/chat")
        .header("content-type", "application/json")
        .body(Body::from(json!({ "message": "مرحبا" }).to_string()))
        .unwrap();

    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn offline_chat_returns_fallback_reply() {
    let app = app().await;
    let (status, body) = send(
        &app,
        authed_post(
            "/v1/assistant/chat",
            json!({
                "message": "أريد فندق في وهران",
                "context": { "currentHotel": "Oran Beach Resort" }
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["intent"]["intent"], "error");
    assert_eq!(body["suggestions"].as_array().unwrap().len(), 2);
    assert_eq!(body["locale"], "ar");
    assert_eq!(body["rtl"], true);

    let (status, _) = send(
        &app,
        authed_post("/v1/assistant/chat", json!({ "message": "   " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn offline_assistant_fallbacks() {
    let app = app().await;

    let (status, body) = send(&app, authed_get("/v1/assistant/optimize?query=hotel%20oran")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["optimized"], "hotel oran");

    let (status, body) = send(
        &app,
        authed_post("/v1/assistant/sentiment", json!({ "text": "رائع جدا" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sentiment"], "neutral");

    let (status, body) = send(
        &app,
        authed_post(
            "/v1/assistant/review_quality",
            json!({ "rating": 5, "comment": "Perfect", "authorName": "S" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["accuracy"], 85);
    assert_eq!(body["appropriate"], true);

    let (status, body) = send(&app, authed_get("/v1/hotels/hotel-aurassi/reviews/summary")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["summary"]["total"], 5);
    assert!(body["digest"].as_str().is_some_and(|text| !text.is_empty()));

    let (status, body) = send(
        &app,
        authed_post("/v1/assistant/recommendations", json!({ "budget": 15000 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["assistantOnline"], false);
    assert_eq!(body["success"], false);
    assert!(body["recommendation"].as_str().is_some_and(|text| !text.is_empty()));

    let (_, health) = send(&app, get("/health")).await;
    assert!(health["metrics"]["assistantFallbacksTotal"].as_u64().unwrap() >= 5);
}

#[tokio::test]
async fn describe_image_falls_back_offline_and_validates_url() {
    let app = app().await;

    let (status, body) = send(
        &app,
        authed_post(
            "/v1/assistant/describe_image",
            json!({ "imageUrl": "https://cdn.volo.dz/rooms/aurassi-suite.jpg" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["imageUrl"], "https://cdn.volo.dz/rooms/aurassi-suite.jpg");
    assert_eq!(body["description"], "صورة لغرفة فندق مريحة مع ديكور عصري.");

    let (status, body) = send(
        &app,
        authed_post(
            "/v1/assistant/describe_image",
            json!({ "imageUrl": "file:///etc/passwd" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_image_url");

    let anonymous = Request::builder()
        .method("POST")
        .uri("/v1/assistant/describe_image")
        .header("content-type", "application/json")
        .body(Body::from(json!({ "imageUrl": "https://a.dz/x.jpg" }).to_string()))
        .unwrap();
    let (status, _) = send(&app, anonymous).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn rate_limit_rejects_excess_requests() {
    let config = ApiConfig {
        rate_limit_max: 2,
        ..ApiConfig::default()
    };
    let app = build_app_with(config).await.unwrap();

    for _ in 0..2 {
        let (status, _) = send(&app, get("/v1/hotels/search")).await;
        assert_eq!(status, StatusCode::OK);
    }
    let (status, body) = send(&app, get("/v1/hotels/search")).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"], "rate_limited");

    let (status, _) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
}
