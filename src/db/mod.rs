pub mod connection;
pub mod listings;
pub mod probes;
pub mod runs;

pub use connection::{init_db, Database};
pub use listings::ListingSink;
