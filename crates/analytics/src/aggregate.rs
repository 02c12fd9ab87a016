//! Grouped aggregation of classified campaign records.
//!
//! Time-bucketed outputs are ordered chronologically by each bucket's
//! earliest underlying date, never by the label's lexical order ("Jan
//! 2025" sorts after "Dec 2024"). Business sums are left-joined onto
//! time buckets by label; an unmatched bucket gets zero business
//! figures, not an error.

use std::collections::HashMap;

use adperf_core::{month_label, week_label, BusinessRecord, CampaignRecord};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::metrics::{BusinessFigures, MetricSet, RawTotals};

/// One output row of a grouped aggregation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateRow {
    pub label: String,
    pub totals: RawTotals,
    pub metrics: MetricSet,
    /// Present only on time-bucketed aggregations run with business data.
    pub business: Option<BusinessFigures>,
}

impl AggregateRow {
    pub fn from_totals(label: impl Into<String>, totals: RawTotals) -> Self {
        Self {
            label: label.into(),
            metrics: MetricSet::from_totals(&totals),
            totals,
            business: None,
        }
    }
}

/// A two-dimensional aggregation: category groups broken down across
/// chronologically ordered months.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrossSection {
    /// Month labels in chronological order.
    pub months: Vec<String>,
    pub rows: Vec<CrossRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrossRow {
    pub month: String,
    pub group: String,
    pub totals: RawTotals,
    pub metrics: MetricSet,
}

impl CrossSection {
    /// Look up the cell for a (group, month) pair. Absent cells mean no
    /// activity; callers render them as zero.
    pub fn cell(&self, group: &str, month: &str) -> Option<&CrossRow> {
        self.rows
            .iter()
            .find(|r| r.group == group && r.month == month)
    }
}

/// Percentage change of spend, sales, and ROAS against the previous
/// time bucket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodDelta {
    pub label: String,
    pub spend_pct: f64,
    pub sales_pct: f64,
    pub roas_pct: f64,
}

/// Aggregate by calendar month, joining business sums when supplied.
pub fn aggregate_by_month(
    records: &[CampaignRecord],
    business: Option<&[BusinessRecord]>,
) -> Vec<AggregateRow> {
    time_bucketed(records, business, month_label)
}

/// Aggregate by ISO week, joining business sums when supplied.
pub fn aggregate_by_week(
    records: &[CampaignRecord],
    business: Option<&[BusinessRecord]>,
) -> Vec<AggregateRow> {
    time_bucketed(records, business, week_label)
}

/// Aggregate by campaign segment, in fixed segment order. Segments with
/// no activity are omitted.
pub fn aggregate_by_segment(records: &[CampaignRecord]) -> Vec<AggregateRow> {
    adperf_core::Segment::all()
        .iter()
        .filter_map(|segment| {
            let totals =
                RawTotals::from_records(records.iter().filter(|r| r.segment == *segment));
            has_activity(&totals).then(|| AggregateRow::from_totals(segment.as_str(), totals))
        })
        .collect()
}

/// Aggregate by portfolio type, JN first.
pub fn aggregate_by_portfolio(records: &[CampaignRecord]) -> Vec<AggregateRow> {
    adperf_core::PortfolioType::all()
        .iter()
        .filter_map(|portfolio| {
            let totals =
                RawTotals::from_records(records.iter().filter(|r| r.portfolio_type == *portfolio));
            has_activity(&totals).then(|| AggregateRow::from_totals(portfolio.as_str(), totals))
        })
        .collect()
}

/// Segment × month breakdown.
pub fn aggregate_segment_by_month(records: &[CampaignRecord]) -> CrossSection {
    cross_by_month(records, |r| r.segment.as_str().to_string())
}

/// Portfolio × month breakdown.
pub fn aggregate_portfolio_by_month(records: &[CampaignRecord]) -> CrossSection {
    cross_by_month(records, |r| r.portfolio_type.as_str().to_string())
}

/// Bucket-over-bucket percentage changes. The first bucket has no
/// predecessor and produces no row; a non-positive previous value yields
/// a delta of exactly 0.
pub fn period_deltas(rows: &[AggregateRow]) -> Vec<PeriodDelta> {
    rows.windows(2)
        .map(|pair| {
            let (prev, curr) = (&pair[0], &pair[1]);
            PeriodDelta {
                label: curr.label.clone(),
                spend_pct: pct_change(prev.totals.spend, curr.totals.spend),
                sales_pct: pct_change(prev.totals.sales, curr.totals.sales),
                roas_pct: pct_change(prev.metrics.roas, curr.metrics.roas),
            }
        })
        .collect()
}

struct Bucket {
    min_date: NaiveDate,
    totals: RawTotals,
}

fn time_bucketed(
    records: &[CampaignRecord],
    business: Option<&[BusinessRecord]>,
    label_of: fn(NaiveDate) -> String,
) -> Vec<AggregateRow> {
    let buckets = time_buckets(records, label_of);
    let business_sums = business.map(|b| sum_business(b, label_of));

    buckets
        .into_iter()
        .map(|(label, bucket)| {
            let joined = business_sums.as_ref().map(|sums| {
                let (total_sales, units, sessions) = sums.get(&label).copied().unwrap_or_default();
                BusinessFigures::join(total_sales, units, sessions, &bucket.totals)
            });
            AggregateRow {
                metrics: MetricSet::from_totals(&bucket.totals),
                totals: bucket.totals,
                business: joined,
                label,
            }
        })
        .collect()
}

/// Group records into labeled time buckets ordered by earliest date.
fn time_buckets(
    records: &[CampaignRecord],
    label_of: fn(NaiveDate) -> String,
) -> Vec<(String, Bucket)> {
    let mut buckets: HashMap<String, Bucket> = HashMap::new();
    for record in records {
        let entry = buckets
            .entry(label_of(record.date))
            .or_insert_with(|| Bucket {
                min_date: record.date,
                totals: RawTotals::default(),
            });
        entry.min_date = entry.min_date.min(record.date);
        entry.totals.add(record);
    }
    let mut ordered: Vec<_> = buckets.into_iter().collect();
    ordered.sort_by(|a, b| (a.1.min_date, a.0.as_str()).cmp(&(b.1.min_date, b.0.as_str())));
    ordered
}

fn sum_business(
    records: &[BusinessRecord],
    label_of: fn(NaiveDate) -> String,
) -> HashMap<String, (f64, u64, u64)> {
    let mut sums: HashMap<String, (f64, u64, u64)> = HashMap::new();
    for record in records {
        let entry = sums.entry(label_of(record.date)).or_default();
        entry.0 += record.total_sales;
        entry.1 += record.units_ordered;
        entry.2 += record.sessions;
    }
    sums
}

fn cross_by_month(
    records: &[CampaignRecord],
    group_of: fn(&CampaignRecord) -> String,
) -> CrossSection {
    let months: Vec<String> = time_buckets(records, month_label)
        .into_iter()
        .map(|(label, _)| label)
        .collect();

    let mut cells: HashMap<(String, String), RawTotals> = HashMap::new();
    for record in records {
        let key = (group_of(record), record.month_label());
        cells.entry(key).or_default().add(record);
    }

    let mut groups: Vec<String> = cells.keys().map(|(g, _)| g.clone()).collect();
    groups.sort();
    groups.dedup();

    let mut rows = Vec::new();
    for month in &months {
        for group in &groups {
            if let Some(totals) = cells.get(&(group.clone(), month.clone())) {
                rows.push(CrossRow {
                    month: month.clone(),
                    group: group.clone(),
                    metrics: MetricSet::from_totals(totals),
                    totals: *totals,
                });
            }
        }
    }

    CrossSection { months, rows }
}

fn has_activity(totals: &RawTotals) -> bool {
    totals.spend > 0.0
        || totals.sales > 0.0
        || totals.orders > 0
        || totals.clicks > 0
        || totals.impressions > 0
}

fn pct_change(prev: f64, curr: f64) -> f64 {
    if prev > 0.0 {
        (curr - prev) / prev * 100.0
    } else {
        0.0
    }
}
