//! Shared domain types, configuration, and error taxonomy for the
//! ad-performance report pipeline.

pub mod config;
pub mod error;
pub mod types;

pub use config::ReportConfig;
pub use error::{ReportError, ReportResult};
pub use types::{
    month_label, week_label, BusinessRecord, CampaignRecord, PortfolioType, Segment,
};
