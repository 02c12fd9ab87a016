//! Derived-metric computation over summed raw quantities.
//!
//! Hard contract: every division-by-zero case evaluates to exactly 0.0,
//! never infinity, NaN, or an error. Report surfaces rely on this.

use adperf_core::CampaignRecord;
use serde::{Deserialize, Serialize};

/// Summed raw quantities for a set of campaign records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTotals {
    pub spend: f64,
    pub sales: f64,
    pub orders: u64,
    pub clicks: u64,
    pub impressions: u64,
}

impl RawTotals {
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a CampaignRecord>) -> Self {
        let mut totals = RawTotals::default();
        for record in records {
            totals.add(record);
        }
        totals
    }

    pub fn add(&mut self, record: &CampaignRecord) {
        self.spend += record.spend;
        self.sales += record.sales;
        self.orders += record.orders;
        self.clicks += record.clicks;
        self.impressions += record.impressions;
    }
}

/// The five derived metrics computable from campaign data alone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricSet {
    /// Return on ad spend: sales / spend.
    pub roas: f64,
    /// Advertising cost of sale: spend / sales, as a percentage.
    pub acos: f64,
    /// Conversion rate: orders / clicks, as a percentage.
    pub cvr: f64,
    /// Cost per click: spend / clicks.
    pub cpc: f64,
    /// Click-through rate: clicks / impressions, as a percentage.
    pub ctr: f64,
}

impl MetricSet {
    pub fn from_totals(totals: &RawTotals) -> Self {
        Self {
            roas: ratio(totals.sales, totals.spend),
            acos: ratio(totals.spend, totals.sales) * 100.0,
            cvr: ratio(totals.orders as f64, totals.clicks as f64) * 100.0,
            cpc: ratio(totals.spend, totals.clicks as f64),
            ctr: ratio(totals.clicks as f64, totals.impressions as f64) * 100.0,
        }
    }
}

/// Business figures joined onto a campaign aggregate, with the two
/// metrics that need total-store sales.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BusinessFigures {
    pub total_sales: f64,
    pub units: u64,
    pub sessions: u64,
    /// Total advertising cost of sale: spend / total_sales, percentage.
    pub tacos: f64,
    /// Total sales not attributed to advertising, floored at 0.
    pub organic_sales: f64,
}

impl BusinessFigures {
    pub fn join(total_sales: f64, units: u64, sessions: u64, totals: &RawTotals) -> Self {
        Self {
            total_sales,
            units,
            sessions,
            tacos: tacos(totals.spend, total_sales),
            organic_sales: organic_sales(total_sales, totals.sales),
        }
    }
}

/// spend / total_sales as a percentage, 0 when total sales is 0 or the
/// business dataset is unavailable.
pub fn tacos(spend: f64, total_sales: f64) -> f64 {
    ratio(spend, total_sales) * 100.0
}

/// max(0, total_sales - ad_sales). Over-attribution windows can push ad
/// sales above store sales; the floor keeps the split presentable.
pub fn organic_sales(total_sales: f64, ad_sales: f64) -> f64 {
    (total_sales - ad_sales).max(0.0)
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn totals(spend: f64, sales: f64, orders: u64, clicks: u64, impressions: u64) -> RawTotals {
        RawTotals {
            spend,
            sales,
            orders,
            clicks,
            impressions,
        }
    }

    #[test]
    fn derived_metrics_match_definitions() {
        let m = MetricSet::from_totals(&totals(50.0, 200.0, 10, 100, 10_000));
        assert_eq!(m.roas, 4.0);
        assert_eq!(m.acos, 25.0);
        assert_eq!(m.cvr, 10.0);
        assert_eq!(m.cpc, 0.5);
        assert_eq!(m.ctr, 1.0);
    }

    #[test]
    fn every_zero_denominator_yields_exactly_zero() {
        let m = MetricSet::from_totals(&totals(0.0, 0.0, 0, 0, 0));
        assert_eq!(m.roas, 0.0);
        assert_eq!(m.acos, 0.0);
        assert_eq!(m.cvr, 0.0);
        assert_eq!(m.cpc, 0.0);
        assert_eq!(m.ctr, 0.0);

        // Mixed zero/non-zero combinations.
        let m = MetricSet::from_totals(&totals(10.0, 0.0, 5, 0, 0));
        assert_eq!(m.roas, 0.0);
        assert_eq!(m.acos, 0.0);
        assert_eq!(m.cvr, 0.0);
        assert_eq!(m.cpc, 0.0);
        assert_eq!(m.ctr, 0.0);
        assert!(m.roas.is_finite() && m.acos.is_finite());
    }

    #[test]
    fn tacos_is_zero_without_store_sales() {
        assert_eq!(tacos(100.0, 0.0), 0.0);
        assert_eq!(tacos(100.0, 400.0), 25.0);
    }

    #[test]
    fn organic_sales_clamps_at_zero() {
        assert_eq!(organic_sales(100.0, 150.0), 0.0);
        assert_eq!(organic_sales(500.0, 150.0), 350.0);
    }

    #[test]
    fn joined_figures_carry_both_derived_fields() {
        let t = totals(50.0, 150.0, 0, 0, 0);
        let figures = BusinessFigures::join(200.0, 80, 900, &t);
        assert_eq!(figures.tacos, 25.0);
        assert_eq!(figures.organic_sales, 50.0);
        assert_eq!(figures.units, 80);
        assert_eq!(figures.sessions, 900);
    }
}
