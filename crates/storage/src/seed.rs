use chrono::{Duration, TimeZone, Utc};
use volo_core::format::slugify;
use volo_core::{Hotel, Rating, Review, ReviewAuthor, Room, DEFAULT_CURRENCY};

struct HotelSeed {
    name: &'static str,
    description: &'static str,
    city: &'static str,
    rating: f64,
    amenities: &'static [&'static str],
    /// `(room type, nightly price, occupancy, pre-discount price)`
    rooms: &'static [(&'static str, u32, u8, Option<u32>)],
    review_count: u32,
    featured: bool,
}

const HOTELS: &[HotelSeed] = &[
    HotelSeed {
        name: "Hotel Aurassi",
        description: "Luxury hotel in the heart of Algiers with Mediterranean views.",
        city: "Algiers",
        rating: 4.8,
        amenities: &[
            "Free WiFi",
            "Swimming Pool",
            "Spa",
            "Restaurant",
            "Fitness Center",
            "Room Service",
        ],
        rooms: &[("Deluxe Room", 15_000, 2, None), ("Sea View Suite", 28_000, 4, None)],
        review_count: 124,
        featured: true,
    },
    HotelSeed {
        name: "Sheraton Alger",
        description: "Business hotel in the diplomatic district.",
        city: "Algiers",
        rating: 4.7,
        amenities: &[
            "Free WiFi",
            "Business Center",
            "Fitness Center",
            "Bar",
            "Conference Rooms",
        ],
        rooms: &[("Executive Room", 12_000, 2, None)],
        review_count: 89,
        featured: false,
    },
    HotelSeed {
        name: "El Biar Boutique Hotel",
        description: "Boutique hotel in historic El Biar with traditional hospitality.",
        city: "El Biar",
        rating: 4.6,
        amenities: &[
            "Free WiFi",
            "Restaurant",
            "Terrace",
            "Concierge",
            "Laundry Service",
        ],
        rooms: &[("Standard Room", 8_000, 2, None)],
        review_count: 67,
        featured: false,
    },
    HotelSeed {
        name: "Oran Beach Resort",
        description: "Beach resort on the Oran coastline with a private beach.",
        city: "Oran",
        rating: 4.5,
        amenities: &[
            "Private Beach",
            "Infinity Pool",
            "Kids Club",
            "Water Sports",
            "Free WiFi",
            "Free Parking",
        ],
        rooms: &[("Garden Room", 11_000, 3, Some(13_750)), ("Beach Villa", 32_000, 6, None)],
        review_count: 52,
        featured: true,
    },
    HotelSeed {
        name: "Cirta Royal",
        description: "Modern hotel in historic Constantine.",
        city: "Constantine",
        rating: 4.1,
        amenities: &[
            "Heritage Restaurant",
            "Free WiFi",
            "Parking",
            "Conference Hall",
            "Air Conditioning",
        ],
        rooms: &[("Classic Room", 9_500, 2, None)],
        review_count: 8,
        featured: false,
    },
];

const AURASSI_REVIEWS: &[(u8, &str, &str)] = &[
    (
        5,
        "Ahmed Benali",
        "Absolutely fantastic experience. Spotless room and a breathtaking view.",
    ),
    (
        5,
        "Fatima Zidane",
        "Great service, amazing restaurant and relaxing spa treatments.",
    ),
    (
        4,
        "Omar Kaddour",
        "Perfect for business trips, the conference facilities are top-notch.",
    ),
    (
        3,
        "Khadija Berrabah",
        "Clean room but dated furniture and noticeable street noise.",
    ),
    (
        5,
        "Yacine Mansouri",
        "Good value for money, friendly staff and a beautiful pool area.",
    ),
];

pub fn demo_hotels() -> Vec<Hotel> {
    HOTELS
        .iter()
        .map(|seed| {
            let id = slugify(seed.name);
            let rooms = seed
                .rooms
                .iter()
                .enumerate()
                .map(|(idx, (room_type, price, occupancy, original_price))| Room {
                    id: format!("{id}-{}", idx + 1),
                    room_type: room_type.to_string(),
                    price: *price,
                    original_price: *original_price,
                    currency: DEFAULT_CURRENCY.to_string(),
                    available: true,
                    max_occupancy: *occupancy,
                    size_sqm: None,
                    bed_type: None,
                    features: Vec::new(),
                })
                .collect();

            Hotel {
                images: vec![format!("/images/hotels/{id}-main.jpg")],
                id,
                name: seed.name.to_string(),
                description: seed.description.to_string(),
                city: seed.city.to_string(),
                country: "Algeria".to_string(),
                rating: seed.rating,
                amenities: seed.amenities.iter().map(ToString::to_string).collect(),
                rooms,
                review_count: seed.review_count,
                featured: seed.featured,
            }
        })
        .collect()
}

pub fn demo_reviews() -> Vec<Review> {
    let base = Utc.with_ymd_and_hms(2025, 11, 15, 10, 30, 0).single();
    let base = base.unwrap_or_else(Utc::now);

    AURASSI_REVIEWS
        .iter()
        .enumerate()
        .filter_map(|(idx, (stars, author, comment))| {
            Some(Review {
                id: format!("hotel-aurassi-review-{}", idx + 1),
                hotel_id: "hotel-aurassi".to_string(),
                rating: Rating::new(*stars).ok()?,
                title: None,
                comment: comment.to_string(),
                images: Vec::new(),
                created_at: base - Duration::days(idx as i64 * 3),
                verified: idx % 2 == 0,
                author: ReviewAuthor {
                    name: author.to_string(),
                    avatar: None,
                },
                helpful: 12u32.saturating_sub(idx as u32 * 2),
                not_helpful: 1,
            })
        })
        .collect()
}
