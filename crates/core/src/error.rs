use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    #[error("review rating must be between 1 and 5, got {0}")]
    InvalidRating(u8),

    #[error("hotel rating must be between 0 and 5, got {0}")]
    HotelRatingOutOfRange(f64),

    #[error("amenity listed more than once: {0}")]
    DuplicateAmenity(String),

    #[error("review comment must not be empty")]
    EmptyComment,
}
