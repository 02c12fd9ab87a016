//! Substring classification rules.
//!
//! Both classifiers are total functions of the input text: any name,
//! including an empty one, maps to a bucket. The rules mirror the naming
//! conventions of the ad console exports, so divergent names are a
//! data-quality issue, not a classification failure.

use adperf_core::{PortfolioType, Segment};

/// Marker tokens identifying competitor ("PAT") campaigns. The token
/// must be delimited; a bare "pat" inside a word does not count.
const COMPETITOR_TOKENS: [&str; 3] = [" pat ", "- pat -", "_pat_"];

/// Classify a portfolio name as JN or Non-JN. Case-insensitive substring
/// match; an empty name falls through to Non-JN.
pub fn classify_portfolio(portfolio_name: &str) -> PortfolioType {
    if portfolio_name.to_lowercase().contains("jn") {
        PortfolioType::Jn
    } else {
        PortfolioType::NonJn
    }
}

/// Classify a campaign name into a segment.
///
/// Order matters: the Branded check runs before the Competitor check, so
/// a name carrying both markers is Branded. An empty name is Non-Branded.
pub fn classify_segment(campaign_name: &str) -> Segment {
    let name = campaign_name.to_lowercase();
    if name.contains("branded") {
        Segment::Branded
    } else if COMPETITOR_TOKENS.iter().any(|t| name.contains(t)) {
        Segment::Competitor
    } else {
        Segment::NonBranded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn portfolio_matches_jn_case_insensitively() {
        assert_eq!(classify_portfolio("JN-US-Main"), PortfolioType::Jn);
        assert_eq!(classify_portfolio("main jn portfolio"), PortfolioType::Jn);
        assert_eq!(classify_portfolio("Retail"), PortfolioType::NonJn);
    }

    #[test]
    fn empty_portfolio_defaults_to_non_jn() {
        assert_eq!(classify_portfolio(""), PortfolioType::NonJn);
    }

    #[test]
    fn branded_takes_precedence_over_competitor() {
        assert_eq!(
            classify_segment("Brand X - branded - pat campaign"),
            Segment::Branded
        );
    }

    #[test]
    fn delimited_pat_token_marks_competitor() {
        assert_eq!(classify_segment("Generic - pat - campaign"), Segment::Competitor);
        assert_eq!(classify_segment("acme_pat_widgets"), Segment::Competitor);
        assert_eq!(classify_segment("Acme PAT broad"), Segment::Competitor);
    }

    #[test]
    fn bare_pat_inside_a_word_does_not_count() {
        assert_eq!(classify_segment("Patio Furniture"), Segment::NonBranded);
        assert_eq!(classify_segment("dispatch alerts"), Segment::NonBranded);
    }

    #[test]
    fn everything_else_is_non_branded() {
        assert_eq!(classify_segment("Widget Search"), Segment::NonBranded);
        assert_eq!(classify_segment(""), Segment::NonBranded);
    }
}
