use chrono::{DateTime, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

static NON_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w ]+").expect("slug pattern must compile"));
static SPACES: Lazy<Regex> = Lazy::new(|| Regex::new(r" +").expect("space pattern must compile"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceLevel {
    Low,
    Medium,
    High,
}

pub fn price_level(price: u32) -> PriceLevel {
    if price < 10_000 {
        PriceLevel::Low
    } else if price < 25_000 {
        PriceLevel::Medium
    } else {
        PriceLevel::High
    }
}

/// Dinar amounts carry no decimals; other currencies use two.
pub fn format_price(amount: u32, currency: &str) -> String {
    let grouped = group_thousands(u64::from(amount));
    if currency.eq_ignore_ascii_case("DZD") {
        format!("{grouped} DZD")
    } else {
        format!("{grouped}.00 {}", currency.to_uppercase())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatingTone {
    Excellent,
    Good,
    Poor,
}

pub fn rating_tone(rating: f64) -> RatingTone {
    if rating >= 4.5 {
        RatingTone::Excellent
    } else if rating >= 3.5 {
        RatingTone::Good
    } else {
        RatingTone::Poor
    }
}

pub fn rating_stars(rating: f64) -> String {
    let rating = rating.clamp(0.0, 5.0);
    let full = rating.floor() as usize;
    let half = usize::from(rating.fract() > 0.0);
    let empty = 5 - full - half;

    format!(
        "{}{}{}",
        "★".repeat(full),
        "⯪".repeat(half),
        "☆".repeat(empty)
    )
}

pub fn truncate_text(text: &str, max_graphemes: usize) -> String {
    let graphemes = text.graphemes(true).collect::<Vec<_>>();
    if graphemes.len() <= max_graphemes {
        return text.to_string();
    }
    format!("{}...", graphemes[..max_graphemes].concat())
}

pub fn time_ago_ar(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - then).num_seconds().max(0);

    match seconds {
        s if s < 60 => "منذ لحظات".to_string(),
        s if s < 3_600 => format!("منذ {} دقيقة", s / 60),
        s if s < 86_400 => format!("منذ {} ساعة", s / 3_600),
        s if s < 2_592_000 => format!("منذ {} يوم", s / 86_400),
        _ => then.format("%Y-%m-%d").to_string(),
    }
}

/// Nights between two ISO dates; `None` when either side does not parse.
pub fn calculate_nights(check_in: &str, check_out: &str) -> Option<i64> {
    let start = NaiveDate::parse_from_str(check_in.trim(), "%Y-%m-%d").ok()?;
    let end = NaiveDate::parse_from_str(check_out.trim(), "%Y-%m-%d").ok()?;
    Some((end - start).num_days())
}

pub fn discount_percentage(original: u32, discounted: u32) -> Option<i64> {
    if original == 0 {
        return None;
    }
    let diff = f64::from(original) - f64::from(discounted);
    Some((diff / f64::from(original) * 100.0).round() as i64)
}

pub fn slugify(text: &str) -> String {
    let lower = text.to_lowercase();
    let stripped = NON_WORD.replace_all(lower.trim(), "");
    SPACES.replace_all(stripped.trim(), "-").into_owned()
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    #[test]
    fn price_levels() {
        assert_eq!(price_level(8_000), PriceLevel::Low);
        assert_eq!(price_level(15_000), PriceLevel::Medium);
        assert_eq!(price_level(25_000), PriceLevel::High);
    }

    #[test]
    fn formats_dinar_without_decimals() {
        assert_eq!(format_price(15_000, "DZD"), "15,000 DZD");
        assert_eq!(format_price(120, "eur"), "120.00 EUR");
        assert_eq!(format_price(1_234_567, "DZD"), "1,234,567 DZD");
    }

    #[test]
    fn star_strings_have_five_glyphs() {
        assert_eq!(rating_stars(4.5), "★★★★⯪");
        assert_eq!(rating_stars(3.0), "★★★☆☆");
        assert_eq!(rating_stars(0.0).chars().count(), 5);
    }

    #[test]
    fn truncates_on_grapheme_boundaries() {
        assert_eq!(truncate_text("فندق رائع جدا", 4), "فندق...");
        assert_eq!(truncate_text("short", 10), "short");
    }

    #[test]
    fn relative_time_in_arabic() {
        let now = Utc.with_ymd_and_hms(2025, 11, 20, 12, 0, 0).unwrap();
        assert_eq!(time_ago_ar(now - Duration::seconds(10), now), "منذ لحظات");
        assert_eq!(time_ago_ar(now - Duration::hours(3), now), "منذ 3 ساعة");
        assert_eq!(time_ago_ar(now - Duration::days(40), now), "2025-10-11");
    }

    #[test]
    fn nights_and_discounts() {
        assert_eq!(calculate_nights("2025-12-01", "2025-12-04"), Some(3));
        assert_eq!(calculate_nights("soon", "2025-12-04"), None);
        assert_eq!(discount_percentage(20_000, 15_000), Some(25));
        assert_eq!(discount_percentage(0, 10), None);
    }

    #[test]
    fn slugs_are_url_safe() {
        assert_eq!(slugify("Hotel Aurassi"), "hotel-aurassi");
        assert_eq!(slugify("  Sheraton   Alger! "), "sheraton-alger");
    }
}
