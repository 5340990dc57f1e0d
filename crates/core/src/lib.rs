pub mod error;
pub mod filter;
pub mod format;
pub mod intent;
pub mod models;
pub mod ranking;
pub mod reviews;

pub use error::CoreError;
pub use filter::{filter_hotels, matches_filters};
pub use intent::{
    classify_intent_rules, detect_locale, fallback_keywords, normalize_text, suggestions_for,
};
pub use models::*;
pub use ranking::{rank_hotels, rank_reasons, score_hotel, RankReason};
pub use reviews::{sort_reviews, summarize_reviews, ReviewSort};
