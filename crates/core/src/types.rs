use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Portfolio classification of a campaign grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortfolioType {
    #[serde(rename = "JN")]
    Jn,
    #[serde(rename = "Non-JN")]
    NonJn,
}

impl PortfolioType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PortfolioType::Jn => "JN",
            PortfolioType::NonJn => "Non-JN",
        }
    }

    /// All portfolio types, in the order report sheets list them.
    pub fn all() -> [PortfolioType; 2] {
        [PortfolioType::Jn, PortfolioType::NonJn]
    }
}

impl std::fmt::Display for PortfolioType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PortfolioType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "jn" => Ok(PortfolioType::Jn),
            "non-jn" | "nonjn" | "non_jn" => Ok(PortfolioType::NonJn),
            other => Err(format!("unknown portfolio type: {other}")),
        }
    }
}

/// Campaign segment classification derived from the campaign name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Segment {
    Branded,
    Competitor,
    #[serde(rename = "Non-Branded")]
    NonBranded,
}

impl Segment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Segment::Branded => "Branded",
            Segment::Competitor => "Competitor",
            Segment::NonBranded => "Non-Branded",
        }
    }

    /// All segments, in the order report sheets list them.
    pub fn all() -> [Segment; 3] {
        [Segment::Branded, Segment::Competitor, Segment::NonBranded]
    }
}

impl std::fmt::Display for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of advertising activity from the campaign export, normalized
/// and classified. Immutable once built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignRecord {
    pub date: NaiveDate,
    pub portfolio_name: String,
    pub campaign_name: String,
    pub impressions: u64,
    pub clicks: u64,
    pub spend: f64,
    pub sales: f64,
    pub orders: u64,
    pub portfolio_type: PortfolioType,
    pub segment: Segment,
}

impl CampaignRecord {
    pub fn month_label(&self) -> String {
        month_label(self.date)
    }

    pub fn week_label(&self) -> String {
        week_label(self.date)
    }
}

/// One row of total-store sales activity from the business export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessRecord {
    pub date: NaiveDate,
    pub total_sales: f64,
    pub units_ordered: u64,
    pub sessions: u64,
}

impl BusinessRecord {
    pub fn month_label(&self) -> String {
        month_label(self.date)
    }

    pub fn week_label(&self) -> String {
        week_label(self.date)
    }
}

/// Month bucket label, e.g. "Sep 2024". Display only; bucket ordering is
/// always by underlying date, never by this string.
pub fn month_label(date: NaiveDate) -> String {
    date.format("%b %Y").to_string()
}

/// ISO year-week bucket label, e.g. "2024-W36".
pub fn week_label(date: NaiveDate) -> String {
    format!("{}-W{:02}", date.iso_week().year(), date.iso_week().week())
}
