use tracing::debug;

use crate::models::{Hotel, RawSearchParams, SearchFilters};

impl SearchFilters {
    /// Builds filters from raw request text. Anything that does not parse is
    /// treated as unset instead of failing the search.
    pub fn from_raw(raw: &RawSearchParams) -> Self {
        Self {
            destination: non_blank(raw.destination.as_deref()),
            min_price: parse_bound("minPrice", raw.min_price.as_deref()),
            max_price: parse_bound("maxPrice", raw.max_price.as_deref()),
            min_rating: parse_rating(raw.rating.as_deref()),
            amenities: parse_amenities(raw.amenities.as_deref()),
        }
    }
}

pub fn filter_hotels(hotels: &[Hotel], filters: &SearchFilters) -> Vec<Hotel> {
    hotels
        .iter()
        .filter(|hotel| matches_filters(hotel, filters))
        .cloned()
        .collect()
}

pub fn matches_filters(hotel: &Hotel, filters: &SearchFilters) -> bool {
    if let Some(destination) = filters.destination.as_deref() {
        let needle = destination.to_lowercase();
        if !hotel.city.to_lowercase().contains(&needle)
            && !hotel.name.to_lowercase().contains(&needle)
        {
            return false;
        }
    }

    if filters.has_price_bound() {
        let Some(price) = hotel.lowest_price().map(i64::from) else {
            return false;
        };
        if filters.min_price.is_some_and(|min| price < min) {
            return false;
        }
        if filters.max_price.is_some_and(|max| price > max) {
            return false;
        }
    }

    if filters
        .min_rating
        .is_some_and(|min_rating| hotel.rating < min_rating)
    {
        return false;
    }

    // A single matching amenity is enough; requesting "wifi,pool" keeps
    // hotels that only offer one of them.
    if let Some(requested) = filters.amenities.as_deref() {
        let has_any = requested.iter().any(|token| {
            let token = token.to_lowercase();
            hotel
                .amenities
                .iter()
                .any(|amenity| amenity.to_lowercase().contains(&token))
        });
        if !has_any {
            return false;
        }
    }

    true
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToString::to_string)
}

fn parse_bound(name: &str, value: Option<&str>) -> Option<i64> {
    let raw = non_blank(value)?;
    match raw.parse::<i64>() {
        Ok(bound) => Some(bound),
        Err(_) => {
            debug!(param = name, value = %raw, "ignoring malformed price bound");
            None
        }
    }
}

fn parse_rating(value: Option<&str>) -> Option<f64> {
    let raw = non_blank(value)?;
    match raw.parse::<f64>() {
        Ok(rating) if rating.is_finite() => Some(rating),
        _ => {
            debug!(value = %raw, "ignoring malformed rating filter");
            None
        }
    }
}

fn parse_amenities(value: Option<&str>) -> Option<Vec<String>> {
    let tokens = value?
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(ToString::to_string)
        .collect::<Vec<_>>();

    if tokens.is_empty() {
        None
    } else {
        Some(tokens)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::models::Room;

    fn room(price: u32) -> Room {
        Room {
            id: format!("room-{price}"),
            room_type: "Standard Room".to_string(),
            price,
            original_price: None,
            currency: "DZD".to_string(),
            available: true,
            max_occupancy: 2,
            size_sqm: None,
            bed_type: None,
            features: Vec::new(),
        }
    }

    fn hotel(
        id: &str,
        name: &str,
        city: &str,
        rating: f64,
        prices: &[u32],
        amenities: &[&str],
    ) -> Hotel {
        Hotel {
            id: id.to_string(),
            name: name.to_string(),
            description: String::new(),
            city: city.to_string(),
            country: "Algeria".to_string(),
            rating,
            images: Vec::new(),
            amenities: amenities.iter().map(|a| a.to_string()).collect(),
            rooms: prices.iter().copied().map(room).collect(),
            review_count: 0,
            featured: false,
        }
    }

    fn catalog() -> Vec<Hotel> {
        vec![
            hotel(
                "1",
                "Hotel Aurassi",
                "Algiers",
                4.8,
                &[15000],
                &["Free WiFi", "Swimming Pool", "Spa"],
            ),
            hotel(
                "2",
                "Royal Oran",
                "Oran",
                4.6,
                &[8000],
                &["Restaurant", "Terrace"],
            ),
            hotel("3", "Cirta Palace", "Constantine", 3.9, &[], &["Free WiFi"]),
        ]
    }

    fn ids(hotels: &[Hotel]) -> Vec<&str> {
        hotels.iter().map(|h| h.id.as_str()).collect()
    }

    #[test]
    fn destination_matches_city_only() {
        let hotels = vec![
            hotel("1", "Hotel Aurassi", "Algiers", 4.8, &[15000], &[]),
            hotel("2", "Royal Oran", "Oran", 4.6, &[8000], &[]),
        ];
        let filters = SearchFilters {
            destination: Some("Algiers".to_string()),
            ..Default::default()
        };
        assert_eq!(ids(&filter_hotels(&hotels, &filters)), vec!["1"]);
    }

    #[test]
    fn destination_is_case_insensitive_and_checks_name() {
        let filters = SearchFilters {
            destination: Some("aurassi".to_string()),
            ..Default::default()
        };
        assert_eq!(ids(&filter_hotels(&catalog(), &filters)), vec!["1"]);
    }

    #[test]
    fn price_bounds_use_cheapest_room() {
        let hotels = vec![hotel("1", "Dual", "Algiers", 4.0, &[20000, 9000], &[])];
        let filters = SearchFilters {
            max_price: Some(10000),
            ..Default::default()
        };
        assert_eq!(filter_hotels(&hotels, &filters).len(), 1);

        let filters = SearchFilters {
            min_price: Some(10000),
            ..Default::default()
        };
        assert!(filter_hotels(&hotels, &filters).is_empty());
    }

    #[test]
    fn hotel_without_rooms_only_survives_without_price_bounds() {
        let unbounded = SearchFilters::default();
        assert!(ids(&filter_hotels(&catalog(), &unbounded)).contains(&"3"));

        let bounded = SearchFilters {
            min_price: Some(0),
            ..Default::default()
        };
        assert!(!ids(&filter_hotels(&catalog(), &bounded)).contains(&"3"));
    }

    #[test]
    fn amenities_use_any_match() {
        let hotels = vec![hotel("1", "Wifi Only", "Algiers", 4.0, &[9000], &["Free WiFi"])];
        let filters = SearchFilters {
            amenities: Some(vec!["wifi".to_string(), "pool".to_string()]),
            ..Default::default()
        };
        assert_eq!(filter_hotels(&hotels, &filters).len(), 1);

        let filters = SearchFilters {
            amenities: Some(vec!["gym".to_string()]),
            ..Default::default()
        };
        assert!(filter_hotels(&hotels, &filters).is_empty());
    }

    #[test]
    fn malformed_raw_params_are_unset() {
        let raw = RawSearchParams {
            destination: Some("   ".to_string()),
            min_price: Some("abc".to_string()),
            max_price: Some("12k".to_string()),
            rating: Some("four".to_string()),
            amenities: Some(" , ,".to_string()),
            ..Default::default()
        };
        let filters = SearchFilters::from_raw(&raw);
        assert!(filters.is_unconstrained());
        assert_eq!(filter_hotels(&catalog(), &filters), catalog());
    }

    #[test]
    fn raw_params_parse_when_well_formed() {
        let raw = RawSearchParams {
            destination: Some(" Oran ".to_string()),
            min_price: Some("5000".to_string()),
            max_price: Some("9000".to_string()),
            rating: Some("4.5".to_string()),
            amenities: Some("wifi, pool".to_string()),
            ..Default::default()
        };
        let filters = SearchFilters::from_raw(&raw);
        assert_eq!(filters.destination.as_deref(), Some("Oran"));
        assert_eq!(filters.min_price, Some(5000));
        assert_eq!(filters.max_price, Some(9000));
        assert_eq!(filters.min_rating, Some(4.5));
        assert_eq!(
            filters.amenities,
            Some(vec!["wifi".to_string(), "pool".to_string()])
        );
    }

    fn arb_hotel() -> impl Strategy<Value = Hotel> {
        (
            "[a-z]{1,6}",
            prop::sample::select(vec!["Algiers", "Oran", "Constantine", "Annaba"]),
            0.0f64..=5.0,
            prop::collection::vec(1000u32..40000, 0..3),
            prop::collection::vec(
                prop::sample::select(vec!["Free WiFi", "Spa", "Pool", "Bar"]),
                0..3,
            ),
        )
            .prop_map(|(name, city, rating, prices, amenities)| {
                hotel(&name, &name, city, rating, &prices, &amenities)
            })
    }

    fn arb_filters() -> impl Strategy<Value = SearchFilters> {
        (
            prop::option::of(prop::sample::select(vec!["alg", "oran", "x"])),
            prop::option::of(0i64..30000),
            prop::option::of(0i64..45000),
            prop::option::of(0.0f64..=5.0),
            prop::option::of(prop::collection::vec(
                prop::sample::select(vec!["wifi", "spa", "gym"]),
                1..3,
            )),
        )
            .prop_map(|(destination, min_price, max_price, min_rating, amenities)| SearchFilters {
                destination: destination.map(ToString::to_string),
                min_price,
                max_price,
                min_rating,
                amenities: amenities.map(|a| a.into_iter().map(ToString::to_string).collect()),
            })
    }

    proptest! {
        #[test]
        fn unset_filters_are_identity(hotels in prop::collection::vec(arb_hotel(), 0..8)) {
            prop_assert_eq!(filter_hotels(&hotels, &SearchFilters::default()), hotels);
        }

        #[test]
        fn min_rating_yields_subset(
            hotels in prop::collection::vec(arb_hotel(), 0..8),
            r in 0.0f64..=5.0,
        ) {
            let filters = SearchFilters { min_rating: Some(r), ..Default::default() };
            let result = filter_hotels(&hotels, &filters);
            prop_assert!(result.iter().all(|h| h.rating >= r));
            prop_assert!(result.iter().all(|h| hotels.contains(h)));
        }

        #[test]
        fn filtering_is_idempotent(
            hotels in prop::collection::vec(arb_hotel(), 0..8),
            filters in arb_filters(),
        ) {
            let once = filter_hotels(&hotels, &filters);
            let twice = filter_hotels(&once, &filters);
            prop_assert_eq!(once, twice);
        }
    }
}
