use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;

pub const DEFAULT_CURRENCY: &str = "DZD";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Locale {
    Ar,
    Fr,
    En,
    Unknown,
}

impl Locale {
    pub fn from_optional_str(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_lowercase()) {
            Some(v) if v == "ar" || v == "ar-dz" || v == "arabic" => Self::Ar,
            Some(v) if v == "fr" || v == "fr-dz" || v == "fr-fr" || v == "french" => Self::Fr,
            Some(v) if v == "en" || v == "en-us" || v == "english" => Self::En,
            _ => Self::Unknown,
        }
    }

    pub fn as_code(self) -> &'static str {
        match self {
            Self::Ar => "ar",
            Self::Fr => "fr",
            Self::En => "en",
            Self::Unknown => "unknown",
        }
    }

    pub fn is_rtl(self) -> bool {
        self == Self::Ar
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Search,
    Booking,
    Info,
    Help,
    Complaint,
    Review,
    General,
    Error,
}

impl Intent {
    /// Parses a one-word label as returned by the hosted classifier.
    pub fn parse(value: &str) -> Option<Self> {
        let cleaned = value
            .trim()
            .trim_matches(|c: char| !c.is_alphanumeric())
            .to_lowercase();
        match cleaned.as_str() {
            "search" => Some(Self::Search),
            "booking" => Some(Self::Booking),
            "info" => Some(Self::Info),
            "help" => Some(Self::Help),
            "complaint" => Some(Self::Complaint),
            "review" => Some(Self::Review),
            "general" => Some(Self::General),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    pub fn as_code(self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::Booking => "booking",
            Self::Info => "info",
            Self::Help => "help",
            Self::Complaint => "complaint",
            Self::Review => "review",
            Self::General => "general",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: String,
    pub room_type: String,
    pub price: u32,
    /// Pre-discount nightly price, when the room is on offer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_price: Option<u32>,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_true")]
    pub available: bool,
    #[serde(default)]
    pub max_occupancy: u8,
    #[serde(default)]
    pub size_sqm: Option<u16>,
    #[serde(default)]
    pub bed_type: Option<String>,
    #[serde(default)]
    pub features: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hotel {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub city: String,
    #[serde(default)]
    pub country: String,
    pub rating: f64,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub amenities: Vec<String>,
    #[serde(default)]
    pub rooms: Vec<Room>,
    #[serde(default)]
    pub review_count: u32,
    #[serde(default)]
    pub featured: bool,
}

impl Hotel {
    /// Cheapest nightly price across every room, available or not.
    pub fn lowest_price(&self) -> Option<u32> {
        self.rooms.iter().map(|room| room.price).min()
    }

    /// Percentage off on the cheapest room, when that room is discounted.
    pub fn discount_percentage(&self) -> Option<i64> {
        let room = self.rooms.iter().min_by_key(|room| room.price)?;
        let original = room.original_price.filter(|original| *original > room.price)?;
        crate::format::discount_percentage(original, room.price)
    }

    pub fn currency(&self) -> &str {
        self.rooms
            .first()
            .map(|room| room.currency.as_str())
            .unwrap_or(DEFAULT_CURRENCY)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if !(0.0..=5.0).contains(&self.rating) {
            return Err(CoreError::HotelRatingOutOfRange(self.rating));
        }

        let mut seen = HashSet::new();
        for amenity in &self.amenities {
            if !seen.insert(amenity.trim().to_lowercase()) {
                return Err(CoreError::DuplicateAmenity(amenity.clone()));
            }
        }

        Ok(())
    }
}

/// Star rating given by a guest, always within 1..=5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(value: u8) -> Result<Self, CoreError> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(CoreError::InvalidRating(value))
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Rating {
    type Error = CoreError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Rating> for u8 {
    fn from(value: Rating) -> Self {
        value.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewAuthor {
    pub name: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: String,
    pub hotel_id: String,
    pub rating: Rating,
    #[serde(default)]
    pub title: Option<String>,
    pub comment: String,
    #[serde(default)]
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub verified: bool,
    pub author: ReviewAuthor,
    #[serde(default)]
    pub helpful: u32,
    #[serde(default)]
    pub not_helpful: u32,
}

impl Review {
    pub fn from_draft(
        id: String,
        hotel_id: String,
        draft: ReviewDraft,
        created_at: DateTime<Utc>,
    ) -> Result<Self, CoreError> {
        let rating = Rating::new(draft.rating)?;
        let comment = draft.comment.trim().to_string();
        if comment.is_empty() {
            return Err(CoreError::EmptyComment);
        }

        Ok(Self {
            id,
            hotel_id,
            rating,
            title: draft.title.filter(|title| !title.trim().is_empty()),
            comment,
            images: draft.images,
            created_at,
            verified: false,
            author: ReviewAuthor {
                name: draft.author_name,
                avatar: draft.author_avatar,
            },
            helpful: 0,
            not_helpful: 0,
        })
    }

    pub fn mark_helpful(&mut self, helpful: bool) {
        if helpful {
            self.helpful = self.helpful.saturating_add(1);
        } else {
            self.not_helpful = self.not_helpful.saturating_add(1);
        }
    }
}

/// Review as submitted by a guest, before validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewDraft {
    pub rating: u8,
    #[serde(default)]
    pub title: Option<String>,
    pub comment: String,
    #[serde(default)]
    pub images: Vec<String>,
    pub author_name: String,
    #[serde(default)]
    pub author_avatar: Option<String>,
}

/// Query-string shaped search input; every field is the raw text the user typed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSearchParams {
    pub destination: Option<String>,
    pub check_in: Option<String>,
    pub check_out: Option<String>,
    pub guests: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub rating: Option<String>,
    pub amenities: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilters {
    pub destination: Option<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub min_rating: Option<f64>,
    pub amenities: Option<Vec<String>>,
}

impl SearchFilters {
    pub fn is_unconstrained(&self) -> bool {
        self.destination.is_none()
            && self.min_price.is_none()
            && self.max_price.is_none()
            && self.min_rating.is_none()
            && self.amenities.is_none()
    }

    pub fn has_price_bound(&self) -> bool {
        self.min_price.is_some() || self.max_price.is_some()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub min_rating: Option<f64>,
    #[serde(default)]
    pub budget: Option<u32>,
    #[serde(default)]
    pub preferred_amenities: Vec<String>,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub travel_dates: Vec<String>,
}

/// A hotel decorated with scores computed for a single ranking pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmartHotel {
    pub hotel: Hotel,
    pub ai_score: f64,
    pub personalized_score: f64,
    pub similarity_score: f64,
    pub reasons: Vec<String>,
}

impl SmartHotel {
    pub fn composite_score(&self) -> f64 {
        self.ai_score + self.personalized_score
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingBucket {
    pub stars: u8,
    pub count: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewSummary {
    pub total: usize,
    pub average: Option<f64>,
    pub distribution: [RatingBucket; 5],
}

impl ReviewSummary {
    pub fn bucket(&self, stars: u8) -> Option<&RatingBucket> {
        self.distribution.iter().find(|bucket| bucket.stars == stars)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentAnalysis {
    pub intent: Intent,
    pub confidence: f32,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewQuality {
    pub accuracy: u8,
    pub quality: u8,
    pub usefulness: u8,
    pub appropriate: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatTurn {
    pub role: String,
    pub content: String,
}

/// Per-request chat state supplied by the caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatContext {
    #[serde(default)]
    pub current_hotel: Option<String>,
    #[serde(default)]
    pub user_preferences: Option<Value>,
    #[serde(default)]
    pub conversation_history: Vec<ChatTurn>,
    /// Client language hint such as `ar` or `fr-DZ`; detected from the
    /// message when absent.
    #[serde(default)]
    pub locale: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    pub success: bool,
    pub response: String,
    pub intent: IntentAnalysis,
    pub suggestions: Vec<String>,
    pub locale: Locale,
    pub rtl: bool,
}

/// Travel advice for a set of preferences. `success` is false when the canned
/// advice was returned instead of a model answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub success: bool,
    pub recommendation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageDescription {
    pub success: bool,
    pub image_url: String,
    pub description: String,
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

fn default_true() -> bool {
    true
}
