use chrono::NaiveDate;
use serde::Deserialize;

use crate::types::PortfolioType;

/// Run configuration for one report generation. Loaded from environment
/// variables with the prefix `ADPERF__`; the CLI overrides individual
/// fields afterwards. Passed explicitly through the pipeline so the
/// engine stays reentrant.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    /// Path to the required campaign CSV export.
    #[serde(default = "default_campaign_file")]
    pub campaign_file: String,
    /// Path to the optional business CSV export. When absent, TACOS and
    /// organic-sales outputs are disabled for the run.
    #[serde(default)]
    pub business_file: Option<String>,
    /// Path of the XLSX artifact to write.
    #[serde(default = "default_output_file")]
    pub output_file: String,
    /// Share of date-invalid rows above which a load aborts instead of
    /// excluding the bad rows.
    #[serde(default = "default_max_invalid_date_ratio")]
    pub max_invalid_date_ratio: f64,
    /// Inclusive lower bound on record dates.
    #[serde(default)]
    pub date_from: Option<NaiveDate>,
    /// Inclusive upper bound on record dates.
    #[serde(default)]
    pub date_to: Option<NaiveDate>,
    /// Restrict the report to one portfolio type.
    #[serde(default)]
    pub portfolio_filter: Option<PortfolioType>,
    /// Row cap for the raw-data sheets (Excel Online compatibility).
    #[serde(default = "default_raw_sheet_row_cap")]
    pub raw_sheet_row_cap: usize,
}

fn default_campaign_file() -> String {
    "campaign_report.csv".to_string()
}
fn default_output_file() -> String {
    "campaign_performance_report.xlsx".to_string()
}
fn default_max_invalid_date_ratio() -> f64 {
    0.5
}
fn default_raw_sheet_row_cap() -> usize {
    10_000
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            campaign_file: default_campaign_file(),
            business_file: None,
            output_file: default_output_file(),
            max_invalid_date_ratio: default_max_invalid_date_ratio(),
            date_from: None,
            date_to: None,
            portfolio_filter: None,
            raw_sheet_row_cap: default_raw_sheet_row_cap(),
        }
    }
}

impl ReportConfig {
    /// Load configuration from `ADPERF__`-prefixed environment variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder().add_source(
            config::Environment::with_prefix("ADPERF")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// True when `date` passes the configured date-range filter.
    pub fn date_in_range(&self, date: NaiveDate) -> bool {
        if let Some(from) = self.date_from {
            if date < from {
                return false;
            }
        }
        if let Some(to) = self.date_to {
            if date > to {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_no_filters() {
        let cfg = ReportConfig::default();
        assert!(cfg.business_file.is_none());
        assert!(cfg.portfolio_filter.is_none());
        assert_eq!(cfg.max_invalid_date_ratio, 0.5);
        assert_eq!(cfg.raw_sheet_row_cap, 10_000);
    }

    #[test]
    fn date_range_filter_is_inclusive() {
        let cfg = ReportConfig {
            date_from: NaiveDate::from_ymd_opt(2024, 9, 1),
            date_to: NaiveDate::from_ymd_opt(2024, 9, 30),
            ..ReportConfig::default()
        };
        assert!(cfg.date_in_range(NaiveDate::from_ymd_opt(2024, 9, 1).unwrap()));
        assert!(cfg.date_in_range(NaiveDate::from_ymd_opt(2024, 9, 30).unwrap()));
        assert!(!cfg.date_in_range(NaiveDate::from_ymd_opt(2024, 8, 31).unwrap()));
        assert!(!cfg.date_in_range(NaiveDate::from_ymd_opt(2024, 10, 1).unwrap()));
    }
}
