pub mod distance;
pub mod enricher;
pub mod geocoder;
mod provinces;
mod retry;

pub use distance::DistanceCalculator;
pub use enricher::GeocodingEnricher;
pub use geocoder::{build_geocoder, Geocoder};
pub use provinces::province_for;
pub use retry::RetryPolicy;
