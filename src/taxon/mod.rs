//! Species-name reconciliation: slugging display names and matching
//! filename tokens back to known slugs.
pub mod normalizer;
pub mod resolver;

pub use normalizer::normalize;
pub use resolver::resolve;
