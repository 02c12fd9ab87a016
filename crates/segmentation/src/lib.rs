//! Campaign classification rules: portfolio type and campaign segment
//! derived from free-text names.

pub mod rules;

pub use rules::{classify_portfolio, classify_segment};
