mod config;
mod rate_limit;

use std::sync::Arc;

use anyhow::Result;
use axum::extract::{Json, Path, Query, State};
use axum::http::{header, HeaderValue, Method, Request, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{body::Body, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::error;
use volo_agents::{Assistant, HotelConcierge};
use volo_core::{
    ChatContext, Preferences, RawSearchParams, Recommendation, ReviewDraft, ReviewSort,
    SmartHotel,
};
use volo_ml::ModelBackend;
use volo_observability::{AppMetrics, MetricsSnapshot};
use volo_storage::{StorageError, Store};

pub use config::ApiConfig;

use crate::rate_limit::IpRateLimiter;

const MAX_CHAT_MESSAGE_LEN: usize = 4_000;
const MAX_IMAGE_URL_LEN: usize = 2_048;

pub type Concierge = HotelConcierge<Store, ModelBackend>;

#[derive(Clone)]
pub struct ApiState {
    concierge: Arc<Concierge>,
    metrics: Arc<AppMetrics>,
    api_key: Arc<str>,
    limiter: IpRateLimiter,
    allowed_origins: Arc<Vec<String>>,
    assistant_online: bool,
    storage_backend: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    timestamp_utc: String,
    metrics: MetricsSnapshot,
    assistant_online: bool,
    assistant_model: String,
    storage: &'static str,
}

#[derive(Debug, Serialize)]
struct HotelList<T> {
    count: usize,
    hotels: Vec<T>,
}

impl<T> HotelList<T> {
    fn new(hotels: Vec<T>) -> Self {
        Self {
            count: hotels.len(),
            hotels,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ReviewListQuery {
    sort: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HelpfulRequest {
    helpful: bool,
}

#[derive(Debug, Default, Deserialize)]
struct RankRequest {
    #[serde(default)]
    filters: RawSearchParams,
    #[serde(default)]
    preferences: Preferences,
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    message: String,
    #[serde(default)]
    context: ChatContext,
}

#[derive(Debug, Deserialize)]
struct QueryParam {
    #[serde(default)]
    query: String,
}

#[derive(Debug, Deserialize)]
struct TextRequest {
    text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageRequest {
    image_url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RecommendationResponse {
    #[serde(flatten)]
    recommendation: Recommendation,
    assistant_online: bool,
}

pub async fn build_app_with(config: ApiConfig) -> Result<Router> {
    let metrics = AppMetrics::shared();

    let store = match config.database_url.as_deref() {
        Some(database_url) => Store::sqlite(database_url).await?,
        None => Store::memory(),
    };
    let model = match config.openai.clone() {
        Some(openai) => ModelBackend::openai(openai)?,
        None => ModelBackend::offline(),
    };

    let assistant_online = model.is_online();
    let storage_backend = store.backend_name();
    let assistant = Assistant::new(Arc::new(model), config.assistant_timeout, metrics.clone());
    let concierge = Arc::new(HotelConcierge::new(
        Arc::new(store),
        assistant,
        metrics.clone(),
    ));

    let state = ApiState {
        concierge,
        metrics,
        api_key: Arc::from(config.api_key.as_str()),
        limiter: IpRateLimiter::new(config.rate_limit_window, config.rate_limit_max),
        allowed_origins: Arc::new(config.allowed_origins),
        assistant_online,
        storage_backend,
    };

    Ok(build_router(state))
}

pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/v1/hotels/search", get(search_hotels))
        .route("/v1/hotels/rank", post(rank_hotels))
        .route("/v1/hotels/:id", get(hotel_details))
        .route("/v1/hotels/:id/reviews", get(list_reviews).post(add_review))
        .route("/v1/hotels/:id/reviews/summary", get(review_summary))
        .route("/v1/reviews/:id/helpful", post(mark_review_helpful))
        .route("/v1/assistant/chat", post(assistant_chat))
        .route("/v1/assistant/recommendations", post(assistant_recommendations))
        .route("/v1/assistant/optimize", get(assistant_optimize))
        .route("/v1/assistant/suggestions", get(assistant_suggestions))
        .route("/v1/assistant/sentiment", post(assistant_sentiment))
        .route("/v1/assistant/review_quality", post(assistant_review_quality))
        .route("/v1/assistant/describe_image", post(assistant_describe_image))
        .layer(build_cors_layer(&state.allowed_origins))
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(RequestBodyLimitLayer::new(64 * 1024))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api_key_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .with_state(state)
}

async fn health(State(state): State<ApiState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        timestamp_utc: chrono::Utc::now().to_rfc3339(),
        metrics: state.metrics.snapshot(),
        assistant_online: state.assistant_online,
        assistant_model: state.concierge.assistant().model_name().to_string(),
        storage: state.storage_backend,
    })
}

async fn search_hotels(
    State(state): State<ApiState>,
    Query(params): Query<RawSearchParams>,
) -> Response {
    match state.concierge.search(&params).await {
        Ok(results) => Json(results).into_response(),
        Err(error) => internal_error(error),
    }
}

async fn hotel_details(State(state): State<ApiState>, Path(hotel_id): Path<String>) -> Response {
    match state.concierge.hotel(&hotel_id).await {
        Ok(Some(details)) => Json(details).into_response(),
        Ok(None) => hotel_not_found(&hotel_id),
        Err(error) => internal_error(error),
    }
}

async fn list_reviews(
    State(state): State<ApiState>,
    Path(hotel_id): Path<String>,
    Query(query): Query<ReviewListQuery>,
) -> Response {
    let sort = match query.sort.as_deref() {
        None => ReviewSort::Newest,
        Some(value) => match ReviewSort::parse(value) {
            Some(sort) => sort,
            None => {
                return api_error(
                    StatusCode::BAD_REQUEST,
                    "invalid_sort",
                    "sort must be one of newest, highest, lowest, helpful",
                )
            }
        },
    };

    match state.concierge.reviews(&hotel_id, sort).await {
        Ok(Some(reviews)) => Json(reviews).into_response(),
        Ok(None) => hotel_not_found(&hotel_id),
        Err(error) => internal_error(error),
    }
}

async fn add_review(
    State(state): State<ApiState>,
    Path(hotel_id): Path<String>,
    Json(draft): Json<ReviewDraft>,
) -> Response {
    match state.concierge.add_review(&hotel_id, draft).await {
        Ok(review) => (StatusCode::CREATED, Json(review)).into_response(),
        Err(error) => internal_error(error),
    }
}

async fn mark_review_helpful(
    State(state): State<ApiState>,
    Path(review_id): Path<String>,
    Json(request): Json<HelpfulRequest>,
) -> Response {
    match state
        .concierge
        .mark_review_helpful(&review_id, request.helpful)
        .await
    {
        Ok(Some(review)) => Json(review).into_response(),
        Ok(None) => api_error(
            StatusCode::NOT_FOUND,
            "review_not_found",
            &format!("no review with id {review_id}"),
        ),
        Err(error) => internal_error(error),
    }
}

async fn rank_hotels(
    State(state): State<ApiState>,
    Json(request): Json<RankRequest>,
) -> Response {
    match state
        .concierge
        .rank(&request.filters, &request.preferences)
        .await
    {
        Ok(ranked) => Json(HotelList::<SmartHotel>::new(ranked)).into_response(),
        Err(error) => internal_error(error),
    }
}

async fn review_summary(State(state): State<ApiState>, Path(hotel_id): Path<String>) -> Response {
    match state.concierge.review_digest(&hotel_id).await {
        Ok(Some(digest)) => Json(digest).into_response(),
        Ok(None) => hotel_not_found(&hotel_id),
        Err(error) => internal_error(error),
    }
}

async fn assistant_chat(
    State(state): State<ApiState>,
    Json(request): Json<ChatRequest>,
) -> Response {
    let message = request.message.trim();
    if message.is_empty() {
        return api_error(StatusCode::BAD_REQUEST, "empty_message", "message is required");
    }
    if message.chars().count() > MAX_CHAT_MESSAGE_LEN {
        return api_error(
            StatusCode::PAYLOAD_TOO_LARGE,
            "message_too_long",
            "message exceeds the maximum length",
        );
    }

    Json(state.concierge.chat(message, &request.context).await).into_response()
}

async fn assistant_recommendations(
    State(state): State<ApiState>,
    Json(preferences): Json<Preferences>,
) -> Response {
    let recommendation = state.concierge.recommend(&preferences).await;
    Json(RecommendationResponse {
        recommendation,
        assistant_online: state.assistant_online,
    })
    .into_response()
}

async fn assistant_optimize(
    State(state): State<ApiState>,
    Query(param): Query<QueryParam>,
) -> Response {
    let query = param.query.trim();
    if query.is_empty() {
        return api_error(StatusCode::BAD_REQUEST, "empty_query", "query is required");
    }

    let optimized = state.concierge.optimize_query(query).await;
    Json(json!({ "query": query, "optimized": optimized })).into_response()
}

async fn assistant_suggestions(
    State(state): State<ApiState>,
    Query(param): Query<QueryParam>,
) -> Response {
    let query = param.query.trim();
    if query.is_empty() {
        return api_error(StatusCode::BAD_REQUEST, "empty_query", "query is required");
    }

    Json(state.concierge.suggestions(query).await).into_response()
}

async fn assistant_sentiment(
    State(state): State<ApiState>,
    Json(request): Json<TextRequest>,
) -> Response {
    let sentiment = state.concierge.sentiment(&request.text).await;
    Json(json!({ "sentiment": sentiment })).into_response()
}

async fn assistant_review_quality(
    State(state): State<ApiState>,
    Json(draft): Json<ReviewDraft>,
) -> Response {
    Json(state.concierge.review_quality(&draft).await).into_response()
}

async fn assistant_describe_image(
    State(state): State<ApiState>,
    Json(request): Json<ImageRequest>,
) -> Response {
    let image_url = request.image_url.trim();
    if !is_image_url(image_url) {
        return api_error(
            StatusCode::BAD_REQUEST,
            "invalid_image_url",
            "imageUrl must be an http(s) URL or a data:image URI",
        );
    }

    Json(state.concierge.describe_image(image_url).await).into_response()
}

fn is_image_url(value: &str) -> bool {
    if value.len() > MAX_IMAGE_URL_LEN || value.chars().any(char::is_whitespace) {
        return false;
    }
    ["https://", "http://", "data:image/"]
        .iter()
        .any(|prefix| value.len() > prefix.len() && value.starts_with(prefix))
}

fn api_error(status: StatusCode, error: &str, message: &str) -> Response {
    (
        status,
        Json(json!({
            "error": error,
            "message": message,
        })),
    )
        .into_response()
}

fn hotel_not_found(hotel_id: &str) -> Response {
    api_error(
        StatusCode::NOT_FOUND,
        "hotel_not_found",
        &format!("no hotel with id {hotel_id}"),
    )
}

fn internal_error(error: anyhow::Error) -> Response {
    match error.downcast_ref::<StorageError>() {
        Some(StorageError::HotelNotFound(hotel_id)) => hotel_not_found(hotel_id),
        Some(StorageError::Invalid(invalid)) => api_error(
            StatusCode::BAD_REQUEST,
            "invalid_request",
            &invalid.to_string(),
        ),
        None => {
            error!(error = %error, "request failed");
            api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "request failed",
            )
        }
    }
}

fn is_public_endpoint(method: &Method, path: &str) -> bool {
    if path == "/health" {
        return true;
    }
    if method != Method::GET {
        return false;
    }

    // GET /v1/hotels/search, /v1/hotels/:id and /v1/hotels/:id/reviews
    let Some(rest) = path.strip_prefix("/v1/hotels/") else {
        return false;
    };
    let segments = rest.split('/').collect::<Vec<_>>();
    match segments.as_slice() {
        [id] => !id.is_empty(),
        [id, "reviews"] => !id.is_empty(),
        _ => false,
    }
}

async fn api_key_middleware(
    State(state): State<ApiState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if request.method() == Method::OPTIONS
        || is_public_endpoint(request.method(), request.uri().path())
    {
        return next.run(request).await;
    }

    let header_key = request
        .headers()
        .get("x-api-key")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    if header_key != &*state.api_key {
        return api_error(
            StatusCode::UNAUTHORIZED,
            "unauthorized",
            "missing or invalid x-api-key",
        );
    }

    next.run(request).await
}

async fn rate_limit_middleware(
    State(state): State<ApiState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if request.method() == Method::OPTIONS || request.uri().path() == "/health" {
        return next.run(request).await;
    }

    let ip = request_ip(&request);
    if !state.limiter.allow(&ip) {
        return api_error(
            StatusCode::TOO_MANY_REQUESTS,
            "rate_limited",
            "rate limit exceeded for this IP",
        );
    }

    next.run(request).await
}

async fn security_headers_middleware(request: Request<Body>, next: Next) -> Response {
    let mut response = next.run(request).await;

    response.headers_mut().insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    response.headers_mut().insert(
        header::HeaderName::from_static("x-frame-options"),
        HeaderValue::from_static("DENY"),
    );
    response.headers_mut().insert(
        header::HeaderName::from_static("referrer-policy"),
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    response
}

fn build_cors_layer(allowed_origins: &Arc<Vec<String>>) -> CorsLayer {
    let origins = allowed_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect::<Vec<_>>();
    let origins = if origins.is_empty() {
        vec![HeaderValue::from_static("http://localhost:3000")]
    } else {
        origins
    };

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::HeaderName::from_static("x-api-key"),
        ])
}

fn request_ip(request: &Request<Body>) -> String {
    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| "local".to_string())
}
