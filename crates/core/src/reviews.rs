use serde::{Deserialize, Serialize};

use crate::models::{RatingBucket, Review, ReviewSummary};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewSort {
    #[default]
    Newest,
    Highest,
    Lowest,
    MostHelpful,
}

impl ReviewSort {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "newest" | "recent" => Some(Self::Newest),
            "highest" | "rating_desc" => Some(Self::Highest),
            "lowest" | "rating_asc" => Some(Self::Lowest),
            "helpful" | "most_helpful" => Some(Self::MostHelpful),
            _ => None,
        }
    }
}

/// Mean rating and per-star distribution (5 down to 1). An empty slice has no
/// average and zero in every bucket.
pub fn summarize_reviews(reviews: &[Review]) -> ReviewSummary {
    let total = reviews.len();

    let average = if total == 0 {
        None
    } else {
        let sum: u32 = reviews.iter().map(|r| u32::from(r.rating.value())).sum();
        Some(f64::from(sum) / total as f64)
    };

    let distribution = [5u8, 4, 3, 2, 1].map(|stars| {
        let count = reviews
            .iter()
            .filter(|review| review.rating.value() == stars)
            .count();
        let percentage = if total == 0 {
            0.0
        } else {
            count as f64 / total as f64 * 100.0
        };
        RatingBucket {
            stars,
            count,
            percentage,
        }
    });

    ReviewSummary {
        total,
        average,
        distribution,
    }
}

pub fn sort_reviews(reviews: &mut [Review], order: ReviewSort) {
    match order {
        ReviewSort::Newest => reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        ReviewSort::Highest => reviews.sort_by(|a, b| b.rating.cmp(&a.rating)),
        ReviewSort::Lowest => reviews.sort_by(|a, b| a.rating.cmp(&b.rating)),
        ReviewSort::MostHelpful => reviews.sort_by(|a, b| b.helpful.cmp(&a.helpful)),
    }
}
