//! CSV ingestion: field normalization and loading of the campaign and
//! business exports.

pub mod loader;
pub mod normalize;

pub use loader::{load_business_csv, load_campaign_csv, CsvLoad};
pub use normalize::{parse_count, parse_currency, parse_date, parse_percent};
