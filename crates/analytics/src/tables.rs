//! Assembly of the named table set handed to the report renderer.

use adperf_core::{BusinessRecord, CampaignRecord, ReportConfig};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::aggregate::{
    aggregate_by_month, aggregate_by_portfolio, aggregate_by_segment, aggregate_by_week,
    aggregate_portfolio_by_month, aggregate_segment_by_month, period_deltas, AggregateRow,
    CrossSection, PeriodDelta,
};
use crate::metrics::{BusinessFigures, MetricSet, RawTotals};

/// One month of the organic-vs-paid breakdown. Percentages are fractions
/// of total sales (0..=1), matching the percent cell formats downstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganicRow {
    pub month: String,
    pub total_sales: f64,
    pub ad_sales: f64,
    pub organic_sales: f64,
    pub ad_share: f64,
    pub organic_share: f64,
    pub tacos: f64,
}

/// Every aggregation the renderer consumes, computed fresh per run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportTables {
    pub date_min: Option<NaiveDate>,
    pub date_max: Option<NaiveDate>,
    pub overall: AggregateRow,
    /// Whole-run business figures; `None` when no business data was
    /// supplied (TACOS/organic outputs degrade to unavailable).
    pub overall_business: Option<BusinessFigures>,
    pub by_segment: Vec<AggregateRow>,
    pub by_portfolio: Vec<AggregateRow>,
    pub by_month: Vec<AggregateRow>,
    pub by_week: Vec<AggregateRow>,
    pub segment_by_month: CrossSection,
    pub portfolio_by_month: CrossSection,
    pub organic_by_month: Vec<OrganicRow>,
    pub mom_changes: Vec<PeriodDelta>,
    pub wow_changes: Vec<PeriodDelta>,
}

impl ReportTables {
    /// Build all tables from already-filtered records.
    pub fn build(records: &[CampaignRecord], business: Option<&[BusinessRecord]>) -> Self {
        let overall_totals = RawTotals::from_records(records);
        let overall = AggregateRow {
            label: "Overall".to_string(),
            metrics: MetricSet::from_totals(&overall_totals),
            totals: overall_totals,
            business: None,
        };

        let overall_business = business.map(|biz| {
            let total_sales: f64 = biz.iter().map(|b| b.total_sales).sum();
            let units: u64 = biz.iter().map(|b| b.units_ordered).sum();
            let sessions: u64 = biz.iter().map(|b| b.sessions).sum();
            BusinessFigures::join(total_sales, units, sessions, &overall_totals)
        });

        let by_month = aggregate_by_month(records, business);
        let by_week = aggregate_by_week(records, business);
        let mom_changes = period_deltas(&by_month);
        let wow_changes = period_deltas(&by_week);
        let organic_by_month = organic_rows(&by_month);

        let tables = Self {
            date_min: records.iter().map(|r| r.date).min(),
            date_max: records.iter().map(|r| r.date).max(),
            overall,
            overall_business,
            by_segment: aggregate_by_segment(records),
            by_portfolio: aggregate_by_portfolio(records),
            by_month,
            by_week,
            segment_by_month: aggregate_segment_by_month(records),
            portfolio_by_month: aggregate_portfolio_by_month(records),
            organic_by_month,
            mom_changes,
            wow_changes,
        };

        info!(
            records = records.len(),
            months = tables.by_month.len(),
            weeks = tables.by_week.len(),
            business = tables.overall_business.is_some(),
            "Aggregation complete"
        );
        tables
    }

    pub fn has_business_data(&self) -> bool {
        self.overall_business.is_some()
    }
}

/// Apply the configured date-range and portfolio filters.
pub fn filter_campaign_records(
    records: Vec<CampaignRecord>,
    config: &ReportConfig,
) -> Vec<CampaignRecord> {
    records
        .into_iter()
        .filter(|r| config.date_in_range(r.date))
        .filter(|r| {
            config
                .portfolio_filter
                .map_or(true, |wanted| r.portfolio_type == wanted)
        })
        .collect()
}

/// Apply the configured date-range filter to business records.
pub fn filter_business_records(
    records: Vec<BusinessRecord>,
    config: &ReportConfig,
) -> Vec<BusinessRecord> {
    records
        .into_iter()
        .filter(|r| config.date_in_range(r.date))
        .collect()
}

fn organic_rows(by_month: &[AggregateRow]) -> Vec<OrganicRow> {
    by_month
        .iter()
        .filter_map(|row| {
            let figures = row.business.as_ref()?;
            let total = figures.total_sales;
            Some(OrganicRow {
                month: row.label.clone(),
                total_sales: total,
                ad_sales: row.totals.sales,
                organic_sales: figures.organic_sales,
                ad_share: share(row.totals.sales, total),
                organic_share: share(figures.organic_sales, total),
                tacos: figures.tacos,
            })
        })
        .collect()
}

fn share(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        part / whole
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adperf_core::{PortfolioType, Segment};

    fn record(
        date: (i32, u32, u32),
        portfolio_type: PortfolioType,
        segment: Segment,
        spend: f64,
        sales: f64,
    ) -> CampaignRecord {
        CampaignRecord {
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            portfolio_name: String::new(),
            campaign_name: String::new(),
            impressions: 500,
            clicks: 20,
            spend,
            sales,
            orders: 2,
            portfolio_type,
            segment,
        }
    }

    fn business(date: (i32, u32, u32), total_sales: f64) -> BusinessRecord {
        BusinessRecord {
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            total_sales,
            units_ordered: 8,
            sessions: 60,
        }
    }

    fn sample() -> (Vec<CampaignRecord>, Vec<BusinessRecord>) {
        let records = vec![
            record((2024, 9, 1), PortfolioType::Jn, Segment::Branded, 40.0, 160.0),
            record((2024, 9, 15), PortfolioType::NonJn, Segment::NonBranded, 10.0, 20.0),
            record((2024, 10, 1), PortfolioType::Jn, Segment::Competitor, 25.0, 50.0),
        ];
        let biz = vec![business((2024, 9, 5), 400.0), business((2024, 10, 3), 100.0)];
        (records, biz)
    }

    #[test]
    fn builds_the_full_table_set() {
        let (records, biz) = sample();
        let tables = ReportTables::build(&records, Some(&biz));

        assert_eq!(tables.by_month.len(), 2);
        assert_eq!(tables.by_segment.len(), 3);
        assert_eq!(tables.by_portfolio.len(), 2);
        assert_eq!(tables.mom_changes.len(), 1);
        assert_eq!(tables.organic_by_month.len(), 2);
        assert!(tables.has_business_data());
        assert_eq!(
            tables.date_min,
            NaiveDate::from_ymd_opt(2024, 9, 1)
        );
        assert_eq!(
            tables.date_max,
            NaiveDate::from_ymd_opt(2024, 10, 1)
        );
    }

    #[test]
    fn overall_business_joins_whole_run_sums() {
        let (records, biz) = sample();
        let tables = ReportTables::build(&records, Some(&biz));

        let figures = tables.overall_business.unwrap();
        assert_eq!(figures.total_sales, 500.0);
        // Spend 75 over 500 total sales.
        assert!((figures.tacos - 15.0).abs() < 1e-9);
        // Ad sales 230 -> organic 270.
        assert_eq!(figures.organic_sales, 270.0);
    }

    #[test]
    fn organic_shares_are_fractions_of_total() {
        let (records, biz) = sample();
        let tables = ReportTables::build(&records, Some(&biz));

        let sep = &tables.organic_by_month[0];
        assert_eq!(sep.month, "Sep 2024");
        assert_eq!(sep.total_sales, 400.0);
        assert_eq!(sep.ad_sales, 180.0);
        assert_eq!(sep.organic_sales, 220.0);
        assert!((sep.ad_share - 0.45).abs() < 1e-9);
        assert!((sep.organic_share - 0.55).abs() < 1e-9);
    }

    #[test]
    fn no_business_data_degrades_gracefully() {
        let (records, _) = sample();
        let tables = ReportTables::build(&records, None);
        assert!(!tables.has_business_data());
        assert!(tables.organic_by_month.is_empty());
        assert!(tables.by_month.iter().all(|r| r.business.is_none()));
    }

    #[test]
    fn filters_apply_date_range_and_portfolio() {
        let (records, _) = sample();
        let config = ReportConfig {
            date_to: NaiveDate::from_ymd_opt(2024, 9, 30),
            portfolio_filter: Some(PortfolioType::Jn),
            ..ReportConfig::default()
        };
        let filtered = filter_campaign_records(records, &config);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].spend, 40.0);
    }

    #[test]
    fn rebuilding_from_identical_input_is_deterministic() {
        let (records, biz) = sample();
        let first = ReportTables::build(&records, Some(&biz));
        let second = ReportTables::build(&records, Some(&biz));
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }
}
