//! The metric-aggregation engine: derived-metric computation, grouped
//! aggregation over time and categorical dimensions, and the named table
//! set consumed by the report renderer.

pub mod aggregate;
pub mod metrics;
pub mod tables;

pub use aggregate::{
    aggregate_by_month, aggregate_by_portfolio, aggregate_by_segment, aggregate_by_week,
    aggregate_portfolio_by_month, aggregate_segment_by_month, period_deltas, AggregateRow,
    CrossRow, CrossSection, PeriodDelta,
};
pub use metrics::{organic_sales, tacos, BusinessFigures, MetricSet, RawTotals};
pub use tables::{filter_business_records, filter_campaign_records, OrganicRow, ReportTables};
