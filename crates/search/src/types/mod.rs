//! Core types shared across the search pipeline.

mod filter_type;
mod request;

pub use filter_type::FilterType;
pub use request::SearchRequest;
