//! Loaders for the two CSV exports.
//!
//! Column names are fixed external strings from the ad console; a
//! missing required column is a fatal load error. Rows with unparseable
//! dates are excluded and counted, and the load aborts when the invalid
//! share exceeds the configured threshold.

use std::io::Read;
use std::path::Path;

use adperf_core::{
    BusinessRecord, CampaignRecord, PortfolioType, ReportConfig, ReportError, ReportResult,
    Segment,
};
use adperf_segmentation::{classify_portfolio, classify_segment};
use csv::StringRecord;
use tracing::{info, warn};

use crate::normalize::{parse_count, parse_currency, parse_date};

/// Campaign export columns.
mod campaign_columns {
    pub const DATE: &str = "Date";
    pub const PORTFOLIO: &str = "Portfolio name";
    pub const CAMPAIGN: &str = "Campaign Name";
    pub const IMPRESSIONS: &str = "Impressions";
    pub const CLICKS: &str = "Clicks";
    pub const SPEND: &str = "Spend";
    pub const SALES: &str = "7 Day Total Sales";
    pub const ORDERS: &str = "7 Day Total Orders (#)";
}

/// Business export columns.
mod business_columns {
    pub const DATE: &str = "Date";
    pub const TOTAL_SALES: &str = "Ordered Product Sales";
    pub const UNITS: &str = "Units Ordered";
    pub const SESSIONS: &str = "Sessions - Total";
}

/// Result of one CSV load: the valid records plus the count of rows
/// excluded for unparseable dates.
#[derive(Debug)]
pub struct CsvLoad<T> {
    pub records: Vec<T>,
    pub invalid_dates: usize,
}

/// Load and normalize the campaign export. Classification labels are
/// stamped onto every record here, so downstream stages never see an
/// unclassified row.
pub fn load_campaign_csv(
    path: impl AsRef<Path>,
    config: &ReportConfig,
) -> ReportResult<CsvLoad<CampaignRecord>> {
    let path = path.as_ref();
    let file_label = path.display().to_string();
    if !path.exists() {
        return Err(ReportError::InputMissing(file_label));
    }
    let file = std::fs::File::open(path)?;
    let load = read_campaign_records(file, &file_label, config)?;

    if let (Some(min), Some(max)) = (
        load.records.iter().map(|r| r.date).min(),
        load.records.iter().map(|r| r.date).max(),
    ) {
        let jn = load
            .records
            .iter()
            .filter(|r| r.portfolio_type == PortfolioType::Jn)
            .count();
        let branded = load
            .records
            .iter()
            .filter(|r| r.segment == Segment::Branded)
            .count();
        info!(
            file = %file_label,
            rows = load.records.len(),
            date_min = %min,
            date_max = %max,
            jn_rows = jn,
            branded_rows = branded,
            "Campaign export loaded"
        );
    }
    Ok(load)
}

/// Load and normalize the optional business export.
pub fn load_business_csv(
    path: impl AsRef<Path>,
    config: &ReportConfig,
) -> ReportResult<CsvLoad<BusinessRecord>> {
    let path = path.as_ref();
    let file_label = path.display().to_string();
    if !path.exists() {
        return Err(ReportError::InputMissing(file_label));
    }
    let file = std::fs::File::open(path)?;
    let load = read_business_records(file, &file_label, config)?;
    info!(file = %file_label, rows = load.records.len(), "Business export loaded");
    Ok(load)
}

fn read_campaign_records<R: Read>(
    input: R,
    file: &str,
    config: &ReportConfig,
) -> ReportResult<CsvLoad<CampaignRecord>> {
    let mut reader = csv::Reader::from_reader(input);
    let headers = reader
        .headers()
        .map_err(|e| csv_error(file, &e))?
        .clone();

    let date_idx = column_index(&headers, file, campaign_columns::DATE)?;
    let portfolio_idx = column_index(&headers, file, campaign_columns::PORTFOLIO)?;
    let campaign_idx = column_index(&headers, file, campaign_columns::CAMPAIGN)?;
    let impressions_idx = column_index(&headers, file, campaign_columns::IMPRESSIONS)?;
    let clicks_idx = column_index(&headers, file, campaign_columns::CLICKS)?;
    let spend_idx = column_index(&headers, file, campaign_columns::SPEND)?;
    let sales_idx = column_index(&headers, file, campaign_columns::SALES)?;
    let orders_idx = column_index(&headers, file, campaign_columns::ORDERS)?;

    let mut records = Vec::new();
    let mut invalid_dates = 0usize;

    for row in reader.records() {
        let row = row.map_err(|e| csv_error(file, &e))?;
        let date = match parse_date(field(&row, date_idx)) {
            Some(date) => date,
            None => {
                invalid_dates += 1;
                continue;
            }
        };

        let portfolio_name = field(&row, portfolio_idx).trim().to_string();
        let campaign_name = field(&row, campaign_idx).trim().to_string();

        records.push(CampaignRecord {
            date,
            portfolio_type: classify_portfolio(&portfolio_name),
            segment: classify_segment(&campaign_name),
            portfolio_name,
            campaign_name,
            impressions: parse_count(field(&row, impressions_idx)),
            clicks: parse_count(field(&row, clicks_idx)),
            spend: parse_currency(field(&row, spend_idx)),
            sales: parse_currency(field(&row, sales_idx)),
            orders: parse_count(field(&row, orders_idx)),
        });
    }

    enforce_date_threshold(file, records.len(), invalid_dates, config)?;
    Ok(CsvLoad {
        records,
        invalid_dates,
    })
}

fn read_business_records<R: Read>(
    input: R,
    file: &str,
    config: &ReportConfig,
) -> ReportResult<CsvLoad<BusinessRecord>> {
    let mut reader = csv::Reader::from_reader(input);
    let headers = reader
        .headers()
        .map_err(|e| csv_error(file, &e))?
        .clone();

    let date_idx = column_index(&headers, file, business_columns::DATE)?;
    let sales_idx = column_index(&headers, file, business_columns::TOTAL_SALES)?;
    let units_idx = column_index(&headers, file, business_columns::UNITS)?;
    let sessions_idx = column_index(&headers, file, business_columns::SESSIONS)?;

    let mut records = Vec::new();
    let mut invalid_dates = 0usize;

    for row in reader.records() {
        let row = row.map_err(|e| csv_error(file, &e))?;
        let date = match parse_date(field(&row, date_idx)) {
            Some(date) => date,
            None => {
                invalid_dates += 1;
                continue;
            }
        };

        records.push(BusinessRecord {
            date,
            total_sales: parse_currency(field(&row, sales_idx)),
            units_ordered: parse_count(field(&row, units_idx)),
            sessions: parse_count(field(&row, sessions_idx)),
        });
    }

    enforce_date_threshold(file, records.len(), invalid_dates, config)?;
    Ok(CsvLoad {
        records,
        invalid_dates,
    })
}

/// Abort when the share of date-invalid rows is too high to trust the
/// export. A file whose every row is invalid always aborts.
fn enforce_date_threshold(
    file: &str,
    valid: usize,
    invalid: usize,
    config: &ReportConfig,
) -> ReportResult<()> {
    if invalid == 0 {
        return Ok(());
    }
    let total = valid + invalid;
    let ratio = invalid as f64 / total as f64;
    if valid == 0 || ratio > config.max_invalid_date_ratio {
        return Err(ReportError::TooManyInvalidDates {
            file: file.to_string(),
            invalid,
            total,
            limit_pct: config.max_invalid_date_ratio * 100.0,
        });
    }
    warn!(
        file = %file,
        skipped = invalid,
        total = total,
        "Rows with unparseable dates excluded from the report"
    );
    Ok(())
}

/// Resolve a required column by name. Header cells are compared after
/// trimming and stripping a UTF-8 BOM, since the console exports carry
/// one on the first header.
fn column_index(headers: &StringRecord, file: &str, name: &str) -> ReportResult<usize> {
    headers
        .iter()
        .position(|h| h.trim_start_matches('\u{feff}').trim() == name)
        .ok_or_else(|| ReportError::MissingColumn {
            file: file.to_string(),
            column: name.to_string(),
        })
}

fn field<'r>(row: &'r StringRecord, idx: usize) -> &'r str {
    row.get(idx).unwrap_or("")
}

fn csv_error(file: &str, err: &csv::Error) -> ReportError {
    ReportError::Csv {
        file: file.to_string(),
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const CAMPAIGN_HEADER: &str =
        "Date,Portfolio name,Campaign Name,Impressions,Clicks,Spend,7 Day Total Sales ,7 Day Total Orders (#)";

    fn campaign_csv(rows: &[&str]) -> String {
        let mut csv = String::from(CAMPAIGN_HEADER);
        for row in rows {
            csv.push('\n');
            csv.push_str(row);
        }
        csv
    }

    #[test]
    fn loads_and_classifies_campaign_rows() {
        let csv = campaign_csv(&[
            "\"Sep 01, 2024\",JN-US-Main,Acme branded exact,1000,50,\"$25.50\",\"$120.00\",4",
            "\"Sep 02, 2024\",Retail,Generic - pat - campaign,500,10,$5.00,$0.00,0",
        ]);
        let load =
            read_campaign_records(csv.as_bytes(), "test.csv", &ReportConfig::default()).unwrap();

        assert_eq!(load.records.len(), 2);
        assert_eq!(load.invalid_dates, 0);

        let first = &load.records[0];
        assert_eq!(first.date, NaiveDate::from_ymd_opt(2024, 9, 1).unwrap());
        assert_eq!(first.portfolio_type, PortfolioType::Jn);
        assert_eq!(first.segment, Segment::Branded);
        assert_eq!(first.spend, 25.50);
        assert_eq!(first.sales, 120.00);
        assert_eq!(first.orders, 4);

        let second = &load.records[1];
        assert_eq!(second.portfolio_type, PortfolioType::NonJn);
        assert_eq!(second.segment, Segment::Competitor);
    }

    #[test]
    fn bad_currency_defaults_to_zero_without_dropping_the_row() {
        let csv = campaign_csv(&["\"Sep 01, 2024\",JN,Widget Search,100,5,oops,,1"]);
        let load =
            read_campaign_records(csv.as_bytes(), "test.csv", &ReportConfig::default()).unwrap();
        assert_eq!(load.records.len(), 1);
        assert_eq!(load.records[0].spend, 0.0);
        assert_eq!(load.records[0].sales, 0.0);
    }

    #[test]
    fn bad_dates_are_excluded_and_counted() {
        let csv = campaign_csv(&[
            "\"Sep 01, 2024\",JN,Widget Search,100,5,$1.00,$2.00,1",
            "not-a-date,JN,Widget Search,100,5,$1.00,$2.00,1",
            "\"Sep 03, 2024\",JN,Widget Search,100,5,$1.00,$2.00,1",
        ]);
        let load =
            read_campaign_records(csv.as_bytes(), "test.csv", &ReportConfig::default()).unwrap();
        assert_eq!(load.records.len(), 2);
        assert_eq!(load.invalid_dates, 1);
    }

    #[test]
    fn too_many_bad_dates_aborts_the_load() {
        let csv = campaign_csv(&[
            "\"Sep 01, 2024\",JN,Widget Search,100,5,$1.00,$2.00,1",
            "bad,JN,Widget Search,100,5,$1.00,$2.00,1",
            "worse,JN,Widget Search,100,5,$1.00,$2.00,1",
        ]);
        let err = read_campaign_records(csv.as_bytes(), "test.csv", &ReportConfig::default())
            .unwrap_err();
        assert!(matches!(err, ReportError::TooManyInvalidDates { invalid: 2, total: 3, .. }));
    }

    #[test]
    fn all_bad_dates_aborts_even_under_a_lenient_threshold() {
        let csv = campaign_csv(&["bad,JN,Widget Search,100,5,$1.00,$2.00,1"]);
        let config = ReportConfig {
            max_invalid_date_ratio: 1.0,
            ..ReportConfig::default()
        };
        let err = read_campaign_records(csv.as_bytes(), "test.csv", &config).unwrap_err();
        assert!(matches!(err, ReportError::TooManyInvalidDates { .. }));
    }

    #[test]
    fn missing_required_column_is_fatal() {
        let csv = "Date,Campaign Name,Impressions,Clicks,Spend,7 Day Total Sales ,7 Day Total Orders (#)\n\
                   \"Sep 01, 2024\",Widget Search,100,5,$1.00,$2.00,1";
        let err = read_campaign_records(csv.as_bytes(), "test.csv", &ReportConfig::default())
            .unwrap_err();
        match err {
            ReportError::MissingColumn { column, .. } => {
                assert_eq!(column, "Portfolio name");
            }
            other => panic!("expected MissingColumn, got {other:?}"),
        }
    }

    #[test]
    fn bom_on_first_header_is_tolerated() {
        let csv = format!("\u{feff}{}", campaign_csv(&[
            "\"Sep 01, 2024\",JN,Widget Search,100,5,$1.00,$2.00,1",
        ]));
        let load =
            read_campaign_records(csv.as_bytes(), "test.csv", &ReportConfig::default()).unwrap();
        assert_eq!(load.records.len(), 1);
    }

    #[test]
    fn loads_business_rows_with_mixed_date_format() {
        let csv = "Date,Ordered Product Sales,Units Ordered,Sessions - Total\n\
                   9/1/24,\"$2,500.00\",120,\"4,310\"\n\
                   9/2/24,$1800,95,3900";
        let load =
            read_business_records(csv.as_bytes(), "biz.csv", &ReportConfig::default()).unwrap();
        assert_eq!(load.records.len(), 2);
        assert_eq!(load.records[0].total_sales, 2500.0);
        assert_eq!(load.records[0].units_ordered, 120);
        assert_eq!(load.records[0].sessions, 4310);
        assert_eq!(
            load.records[1].date,
            NaiveDate::from_ymd_opt(2024, 9, 2).unwrap()
        );
    }
}
