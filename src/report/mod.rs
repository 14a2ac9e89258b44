//! Plain-text wealth report rendering.

use crate::distribution::Distribution;
use crate::format::{format_btc, format_large_number, format_rank, format_with_commas};
use crate::percentile::HoldingReport;
use crate::stats::DistributionStats;

const RULE_WIDTH: usize = 60;

/// Render a full report for one holding against one snapshot.
pub fn render(
    holding: &HoldingReport,
    stats: &DistributionStats,
    distribution: &Distribution,
    thresholds: &[(f64, f64)],
    spot_price_usd: Option<f64>,
) -> String {
    let mut out = String::new();
    let rule = "=".repeat(RULE_WIDTH);

    out.push_str(&format!("{rule}\n"));
    out.push_str("  BITCOIN WEALTH REPORT\n");
    out.push_str(&format!("{rule}\n"));

    out.push_str("\n## Holding\n");
    out.push_str(&format!("  Amount:          {}\n", format_btc(holding.amount_btc)));
    out.push_str(&format!(
        "  Category:        {} ({})\n",
        holding.category,
        holding.category.btc_range()
    ));
    out.push_str(&format!("                   {}\n", holding.category.description()));
    if let Some(price) = spot_price_usd {
        out.push_str(&format!(
            "  Est. value:      ${}\n",
            format_with_commas(holding.amount_btc * price)
        ));
    }

    out.push_str("\n## Position\n");
    out.push_str(&format!("  Percentile:      {:.2}%\n", holding.percentile));
    out.push_str(&format!(
        "  Rank:            {} of {} addresses hold no more than this\n",
        format_rank(holding.rank),
        format_large_number(distribution.total_addresses as f64)
    ));
    out.push_str(&format!(
        "  Addresses below: {}\n",
        format_large_number(holding.addresses_below as f64)
    ));
    out.push_str(&format!(
        "  Addresses above: {}\n",
        format_large_number(holding.addresses_above as f64)
    ));
    out.push_str(&format!(
        "  Median multiple: {:.2}x the median holding\n",
        holding.ratio_to_median
    ));
    out.push_str(&format!(
        "  Supply share:    {:.6}% of circulating supply\n",
        100.0 * holding.amount_btc / distribution.total_supply
    ));

    out.push_str("\n## Percentile thresholds\n");
    for (percentile, amount) in thresholds {
        out.push_str(&format!(
            "  {:>5.1}th percentile: {}\n",
            percentile,
            format_btc(*amount)
        ));
    }

    out.push_str("\n## Network statistics\n");
    out.push_str(&format!("  Median holding:  {}\n", format_btc(stats.median_btc)));
    out.push_str(&format!("  Mean holding:    {}\n", format_btc(stats.mean_btc)));
    out.push_str(&format!("  Gini coeff:      {:.3}\n", stats.gini_coefficient));
    out.push_str(&format!(
        "  Top 1% hold:     {:.1}% of supply\n",
        100.0 * stats.top_1_percent_supply
    ));
    out.push_str(&format!(
        "  Top 5% hold:     {:.1}% of supply\n",
        100.0 * stats.top_5_percent_supply
    ));
    out.push_str(&format!(
        "  Top 10% hold:    {:.1}% of supply\n",
        100.0 * stats.top_10_percent_supply
    ));

    out.push_str(&format!(
        "\n  Source: {} (fetched {})\n",
        distribution.source,
        distribution.fetched_at.format("%Y-%m-%d %H:%M UTC")
    ));

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::percentile::{self, percentile_thresholds};
    use crate::provider::reference_snapshot;

    #[test]
    fn test_report_sections_present() {
        let d = reference_snapshot();
        let holding = percentile::compute(&d, 0.5).unwrap();
        let stats = DistributionStats::compute(&d);
        let thresholds = percentile_thresholds(&d).unwrap();

        let text = render(&holding, &stats, &d, &thresholds, Some(60_000.0));
        assert!(text.contains("BITCOIN WEALTH REPORT"));
        assert!(text.contains("0.5 BTC"));
        assert!(text.contains("Moderate"));
        assert!(text.contains("Percentile:"));
        assert!(text.contains("99.9th percentile:"));
        assert!(text.contains("Gini coeff:"));
        assert!(text.contains("$30,000"));
    }

    #[test]
    fn test_report_without_price_omits_value_line() {
        let d = reference_snapshot();
        let holding = percentile::compute(&d, 1.0).unwrap();
        let stats = DistributionStats::compute(&d);

        let text = render(&holding, &stats, &d, &[], None);
        assert!(!text.contains("Est. value"));
    }
}
