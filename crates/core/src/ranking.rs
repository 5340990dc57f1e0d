//! Deterministic hotel scoring for personalised result lists.
//!
//! Scores are a fixed function of the hotel snapshot and the caller's
//! preferences, so the same inputs always produce the same order:
//!
//! - `ai_score` in `[60, 100]`: rating plus review-volume confidence.
//! - `personalized_score` in `[70, 100]`: share of preference points earned.
//! - `similarity_score`: preference points plus a rating-proportional signal
//!   in `[0, 20]`.

use serde::{Deserialize, Serialize};

use crate::models::{Hotel, Preferences, SmartHotel};

const DESTINATION_POINTS: f64 = 30.0;
const RATING_POINTS: f64 = 20.0;
const AMENITY_POINTS: f64 = 5.0;
const AMENITY_POINTS_CAP: f64 = 30.0;
const MAX_PREFERENCE_POINTS: f64 = DESTINATION_POINTS + RATING_POINTS + AMENITY_POINTS_CAP;
const TRUSTED_REVIEW_COUNT: u32 = 10;
const REVIEW_CONFIDENCE_SATURATION: u32 = 100;
const MAX_REASONS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankReason {
    DestinationMatch,
    RatingMatch,
    WithinBudget,
    Featured,
    TrustedByGuests,
    AmenityMatch,
    GoodStayOption,
}

impl RankReason {
    pub fn label(self) -> &'static str {
        match self {
            Self::DestinationMatch => "مطابق لوجهتك المفضلة",
            Self::RatingMatch => "يلبي معايير التقييم",
            Self::WithinBudget => "ضمن ميزانيتك",
            Self::Featured => "فندق مميز ومعتمد",
            Self::TrustedByGuests => "مستوى ثقة عالي من النزلاء",
            Self::AmenityMatch => "مرفق مفضل متوفر",
            Self::GoodStayOption => "خيار جيد للإقامة",
        }
    }
}

/// Scores every hotel and orders by descending `ai_score + personalized_score`.
/// Ties keep their input order.
pub fn rank_hotels(hotels: &[Hotel], preferences: &Preferences) -> Vec<SmartHotel> {
    let mut ranked = hotels
        .iter()
        .map(|hotel| score_hotel(hotel, preferences))
        .collect::<Vec<_>>();

    ranked.sort_by(|a, b| b.composite_score().total_cmp(&a.composite_score()));
    ranked
}

pub fn score_hotel(hotel: &Hotel, preferences: &Preferences) -> SmartHotel {
    let matches = PreferenceMatches::evaluate(hotel, preferences);
    let rating_share = hotel.rating.clamp(0.0, 5.0) / 5.0;

    let review_confidence = f64::from(hotel.review_count.min(REVIEW_CONFIDENCE_SATURATION))
        / f64::from(REVIEW_CONFIDENCE_SATURATION);

    let points = matches.points();
    let ai_score = 60.0 + 30.0 * rating_share + 10.0 * review_confidence;
    let personalized_score = 70.0 + 30.0 * points / MAX_PREFERENCE_POINTS;
    let similarity_score = points + 20.0 * rating_share;

    SmartHotel {
        hotel: hotel.clone(),
        ai_score,
        personalized_score,
        similarity_score,
        reasons: reasons_for(hotel, &matches)
            .into_iter()
            .map(|reason| reason.label().to_string())
            .collect(),
    }
}

/// Reasons in fixed priority order, at most three.
pub fn rank_reasons(hotel: &Hotel, preferences: &Preferences) -> Vec<RankReason> {
    reasons_for(hotel, &PreferenceMatches::evaluate(hotel, preferences))
}

struct PreferenceMatches {
    destination: bool,
    rating: bool,
    budget: bool,
    shared_amenities: usize,
}

impl PreferenceMatches {
    fn evaluate(hotel: &Hotel, preferences: &Preferences) -> Self {
        let destination = preferences
            .destination
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .is_some_and(|value| hotel.city.to_lowercase().contains(&value.to_lowercase()));

        let rating = preferences
            .min_rating
            .is_some_and(|min_rating| hotel.rating >= min_rating);

        let budget = match (preferences.budget, hotel.lowest_price()) {
            (Some(budget), Some(price)) => price <= budget,
            _ => false,
        };

        let wanted = preferences
            .preferred_amenities
            .iter()
            .map(|amenity| amenity.trim().to_lowercase())
            .collect::<Vec<_>>();
        let shared_amenities = hotel
            .amenities
            .iter()
            .filter(|amenity| wanted.contains(&amenity.trim().to_lowercase()))
            .count();

        Self {
            destination,
            rating,
            budget,
            shared_amenities,
        }
    }

    fn points(&self) -> f64 {
        let mut points = 0.0;
        if self.destination {
            points += DESTINATION_POINTS;
        }
        if self.rating {
            points += RATING_POINTS;
        }
        points += (self.shared_amenities as f64 * AMENITY_POINTS).min(AMENITY_POINTS_CAP);
        points
    }
}

fn reasons_for(hotel: &Hotel, matches: &PreferenceMatches) -> Vec<RankReason> {
    let candidates = [
        (matches.destination, RankReason::DestinationMatch),
        (matches.rating, RankReason::RatingMatch),
        (matches.budget, RankReason::WithinBudget),
        (hotel.featured, RankReason::Featured),
        (
            hotel.review_count > TRUSTED_REVIEW_COUNT,
            RankReason::TrustedByGuests,
        ),
        (matches.shared_amenities > 0, RankReason::AmenityMatch),
    ];

    let mut reasons = candidates
        .into_iter()
        .filter_map(|(fired, reason)| fired.then_some(reason))
        .take(MAX_REASONS)
        .collect::<Vec<_>>();

    if reasons.is_empty() {
        reasons.push(RankReason::GoodStayOption);
    }
    reasons
}
