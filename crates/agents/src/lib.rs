pub mod assistant;

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, instrument};
use uuid::Uuid;
use volo_core::format::{
    calculate_nights, format_price, price_level, rating_stars, rating_tone, time_ago_ar,
    PriceLevel, RatingTone,
};
use volo_core::{
    filter_hotels, rank_hotels, sort_reviews, suggestions_for, summarize_reviews, ChatContext,
    ChatReply, Hotel, ImageDescription, IntentAnalysis, Preferences, RawSearchParams,
    Recommendation, Review, ReviewDraft, ReviewQuality, ReviewSort, ReviewSummary, SearchFilters,
    Sentiment, SmartHotel,
};
use volo_ml::LanguageModel;
use volo_observability::AppMetrics;
use volo_storage::{CatalogRepository, StorageError};

pub use assistant::{Assistant, DEFAULT_ASSISTANT_TIMEOUT, HISTORY_WINDOW};

/// Filtered hotels plus the stay details the caller asked about. Dates and
/// guests are passed through unchanged; they never narrow the result.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResults {
    pub count: usize,
    pub hotels: Vec<Hotel>,
    pub check_in: Option<String>,
    pub check_out: Option<String>,
    pub guests: Option<u32>,
    pub nights: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HotelDetails {
    pub hotel: Hotel,
    pub lowest_price: Option<u32>,
    pub display_price: Option<String>,
    pub price_level: Option<PriceLevel>,
    pub discount_percentage: Option<i64>,
    pub stars: String,
    pub rating_tone: RatingTone,
    pub review_summary: ReviewSummary,
}

/// A stored review with its age rendered for display.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewView {
    #[serde(flatten)]
    pub review: Review,
    pub posted: String,
}

impl ReviewView {
    fn new(review: Review, now: DateTime<Utc>) -> Self {
        Self {
            posted: time_ago_ar(review.created_at, now),
            review,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HotelReviews {
    pub hotel_id: String,
    pub reviews: Vec<ReviewView>,
    pub summary: ReviewSummary,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchSuggestions {
    pub query: String,
    pub intent: IntentAnalysis,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewDigest {
    pub hotel_id: String,
    pub summary: ReviewSummary,
    pub digest: String,
}

pub struct HotelConcierge<S, M> {
    store: Arc<S>,
    assistant: Assistant<M>,
    metrics: Arc<AppMetrics>,
}

impl<S, M> Clone for HotelConcierge<S, M> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            assistant: self.assistant.clone(),
            metrics: Arc::clone(&self.metrics),
        }
    }
}

impl<S, M> HotelConcierge<S, M>
where
    S: CatalogRepository,
    M: LanguageModel,
{
    pub fn new(store: Arc<S>, assistant: Assistant<M>, metrics: Arc<AppMetrics>) -> Self {
        Self {
            store,
            assistant,
            metrics,
        }
    }

    pub fn metrics(&self) -> &AppMetrics {
        &self.metrics
    }

    pub fn assistant(&self) -> &Assistant<M> {
        &self.assistant
    }

    #[instrument(skip(self, raw))]
    pub async fn search(&self, raw: &RawSearchParams) -> Result<SearchResults> {
        let started = Instant::now();
        self.metrics.inc_request();
        self.metrics.inc_search();

        let filters = SearchFilters::from_raw(raw);
        let catalog = self.store.list_hotels().await?;
        let hotels = filter_hotels(&catalog, &filters);

        let check_in = non_blank(raw.check_in.as_deref());
        let check_out = non_blank(raw.check_out.as_deref());
        let nights = match (&check_in, &check_out) {
            (Some(check_in), Some(check_out)) => {
                calculate_nights(check_in, check_out).filter(|nights| *nights > 0)
            }
            _ => None,
        };
        let guests = raw
            .guests
            .as_deref()
            .and_then(|guests| guests.trim().parse::<u32>().ok())
            .filter(|guests| *guests > 0);

        self.metrics.observe_latency(started.elapsed());
        info!(
            destination = filters.destination.as_deref().unwrap_or(""),
            candidates = catalog.len(),
            matched = hotels.len(),
            nights = nights.unwrap_or_default(),
            "hotel search handled"
        );
        Ok(SearchResults {
            count: hotels.len(),
            hotels,
            check_in,
            check_out,
            guests,
            nights,
        })
    }

    #[instrument(skip(self))]
    pub async fn hotel(&self, hotel_id: &str) -> Result<Option<HotelDetails>> {
        self.metrics.inc_request();

        let Some(hotel) = self.store.get_hotel(hotel_id).await? else {
            info!(hotel_id, "hotel not found");
            return Ok(None);
        };
        let reviews = self.store.list_reviews(hotel_id).await?;
        let lowest_price = hotel.lowest_price();

        Ok(Some(HotelDetails {
            display_price: lowest_price.map(|price| format_price(price, hotel.currency())),
            price_level: lowest_price.map(price_level),
            lowest_price,
            discount_percentage: hotel.discount_percentage(),
            stars: rating_stars(hotel.rating),
            rating_tone: rating_tone(hotel.rating),
            review_summary: summarize_reviews(&reviews),
            hotel,
        }))
    }

    #[instrument(skip(self))]
    pub async fn reviews(&self, hotel_id: &str, sort: ReviewSort) -> Result<Option<HotelReviews>> {
        self.metrics.inc_request();

        if self.store.get_hotel(hotel_id).await?.is_none() {
            return Ok(None);
        }
        let mut reviews = self.store.list_reviews(hotel_id).await?;
        let summary = summarize_reviews(&reviews);
        sort_reviews(&mut reviews, sort);

        info!(hotel_id, total = summary.total, "reviews listed");
        let now = Utc::now();
        Ok(Some(HotelReviews {
            hotel_id: hotel_id.to_string(),
            reviews: reviews
                .into_iter()
                .map(|review| ReviewView::new(review, now))
                .collect(),
            summary,
        }))
    }

    /// Validates and stores a guest review; fails with [`StorageError::HotelNotFound`]
    /// or a wrapped `CoreError` the caller can downcast.
    #[instrument(skip(self, draft))]
    pub async fn add_review(&self, hotel_id: &str, draft: ReviewDraft) -> Result<Review> {
        self.metrics.inc_request();

        if self.store.get_hotel(hotel_id).await?.is_none() {
            return Err(StorageError::HotelNotFound(hotel_id.to_string()).into());
        }
        let review = Review::from_draft(
            Uuid::new_v4().to_string(),
            hotel_id.to_string(),
            draft,
            Utc::now(),
        )
        .map_err(StorageError::from)?;

        self.store.add_review(review.clone()).await?;
        info!(hotel_id, review_id = %review.id, rating = review.rating.value(), "review added");
        Ok(review)
    }

    #[instrument(skip(self))]
    pub async fn mark_review_helpful(
        &self,
        review_id: &str,
        helpful: bool,
    ) -> Result<Option<Review>> {
        self.metrics.inc_request();
        let review = self.store.mark_review_helpful(review_id, helpful).await?;
        info!(review_id, helpful, found = review.is_some(), "review vote recorded");
        Ok(review)
    }

    #[instrument(skip(self, raw, preferences))]
    pub async fn rank(
        &self,
        raw: &RawSearchParams,
        preferences: &Preferences,
    ) -> Result<Vec<SmartHotel>> {
        let started = Instant::now();
        self.metrics.inc_request();
        self.metrics.inc_ranking();

        let filters = SearchFilters::from_raw(raw);
        let catalog = self.store.list_hotels().await?;
        let ranked = rank_hotels(&filter_hotels(&catalog, &filters), preferences);

        self.metrics.observe_latency(started.elapsed());
        info!(
            ranked = ranked.len(),
            top = ranked.first().map(|hotel| hotel.hotel.id.as_str()).unwrap_or(""),
            "hotels ranked"
        );
        Ok(ranked)
    }

    #[instrument(skip(self, message, context))]
    pub async fn chat(&self, message: &str, context: &ChatContext) -> ChatReply {
        let started = Instant::now();
        self.metrics.inc_request();

        let reply = self.assistant.chat(message, context).await;

        self.metrics.observe_latency(started.elapsed());
        info!(
            success = reply.success,
            intent = reply.intent.intent.as_code(),
            locale = reply.locale.as_code(),
            history = context.conversation_history.len(),
            "chat handled"
        );
        reply
    }

    #[instrument(skip(self, preferences))]
    pub async fn recommend(&self, preferences: &Preferences) -> Recommendation {
        self.metrics.inc_request();
        let recommendation = self.assistant.recommend(preferences).await;
        info!(
            success = recommendation.success,
            chars = recommendation.recommendation.chars().count(),
            "recommendations generated"
        );
        recommendation
    }

    #[instrument(skip(self))]
    pub async fn describe_image(&self, image_url: &str) -> ImageDescription {
        self.metrics.inc_request();
        let described = self.assistant.describe_image(image_url).await;
        info!(success = described.success, "image described");
        described
    }

    #[instrument(skip(self))]
    pub async fn optimize_query(&self, query: &str) -> String {
        self.metrics.inc_request();
        let optimized = self.assistant.optimize_search_query(query).await;
        let changed = optimized != query;
        info!(changed, "search query optimized");
        optimized
    }

    #[instrument(skip(self))]
    pub async fn suggestions(&self, query: &str) -> SearchSuggestions {
        self.metrics.inc_request();
        let intent = self.assistant.analyze_intent(query).await;
        let suggestions = suggestions_for(intent.intent);
        info!(intent = intent.intent.as_code(), "suggestions generated");
        SearchSuggestions {
            query: query.to_string(),
            intent,
            suggestions,
        }
    }

    #[instrument(skip(self, text))]
    pub async fn sentiment(&self, text: &str) -> Sentiment {
        self.metrics.inc_request();
        let sentiment = self.assistant.analyze_sentiment(text).await;
        info!(sentiment = ?sentiment, "sentiment analyzed");
        sentiment
    }

    #[instrument(skip(self, draft))]
    pub async fn review_quality(&self, draft: &ReviewDraft) -> ReviewQuality {
        self.metrics.inc_request();
        let quality = self.assistant.analyze_review_quality(draft).await;
        info!(
            accuracy = quality.accuracy,
            appropriate = quality.appropriate,
            "review quality analyzed"
        );
        quality
    }

    #[instrument(skip(self))]
    pub async fn review_digest(&self, hotel_id: &str) -> Result<Option<ReviewDigest>> {
        self.metrics.inc_request();

        if self.store.get_hotel(hotel_id).await?.is_none() {
            return Ok(None);
        }
        let reviews = self.store.list_reviews(hotel_id).await?;
        let digest = self.assistant.summarize_reviews(&reviews).await;

        info!(hotel_id, reviews = reviews.len(), "review digest generated");
        Ok(Some(ReviewDigest {
            hotel_id: hotel_id.to_string(),
            summary: summarize_reviews(&reviews),
            digest,
        }))
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToString::to_string)
}
