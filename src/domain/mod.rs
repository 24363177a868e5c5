pub mod listing;
pub mod logic;
pub mod normalize;

pub use listing::{
    captured_now, ColumnValue, Coordinates, EnrichedListing, RawListing, LANDMARK_COUNT,
    NO_DISTANCE_KM, NO_INFO, OUTPUT_COLUMNS,
};
pub use normalize::normalize;
