pub mod engine;
pub mod normalize;

pub use engine::diff;
pub use normalize::{normalize, parse_number};
