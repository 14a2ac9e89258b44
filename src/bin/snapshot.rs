//! Distribution snapshot inspector.
//!
//! Fetches the current address-balance distribution and dumps the bucket
//! table plus summary statistics, as aligned text or JSON.
//!
//! Usage:
//!   cargo run --bin snapshot
//!   cargo run --bin snapshot -- --json

use satrank::config::Config;
use satrank::format::{format_btc, format_large_number};
use satrank::provider::DistributionProvider;
use satrank::stats::DistributionStats;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let json = std::env::args().any(|a| a == "--json");

    let config = Config::from_env();
    let provider = DistributionProvider::new(config.provider.clone());

    eprintln!("fetching distribution snapshot...");
    let distribution = provider.fetch_distribution().await;
    eprintln!(
        "  → {} buckets from {}",
        distribution.buckets.len(),
        distribution.source
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&distribution)?);
        return Ok(());
    }

    println!("\n{}", "=".repeat(70));
    println!("  ADDRESS BALANCE DISTRIBUTION");
    println!("{}", "=".repeat(70));
    println!(
        "\n  {:<24} {:>12} {:>10} {:>10}",
        "Balance range", "Addresses", "Addr %", "Supply %"
    );

    for bucket in &distribution.buckets {
        let range = match bucket.upper_btc {
            Some(upper) => format!("[{} - {})", bucket.lower_btc, upper),
            None => format!("[{} - ∞)", bucket.lower_btc),
        };
        println!(
            "  {:<24} {:>12} {:>9.2}% {:>9.2}%",
            range,
            format_large_number(bucket.address_count as f64),
            100.0 * bucket.address_count as f64 / distribution.total_addresses as f64,
            100.0 * bucket.supply_fraction
        );
    }

    let stats = DistributionStats::compute(&distribution);
    println!("\n## Statistics");
    println!(
        "  Total addresses: {}",
        format_large_number(distribution.total_addresses as f64)
    );
    println!("  Total supply:    {}", format_btc(distribution.total_supply));
    println!("  Median holding:  {}", format_btc(stats.median_btc));
    println!("  Mean holding:    {}", format_btc(stats.mean_btc));
    println!("  Gini coeff:      {:.3}", stats.gini_coefficient);
    println!(
        "  Top 1% hold:     {:.1}% of supply",
        100.0 * stats.top_1_percent_supply
    );
    println!(
        "  Top 10% hold:    {:.1}% of supply",
        100.0 * stats.top_10_percent_supply
    );
    println!(
        "\n  Source: {} (fetched {})",
        distribution.source,
        distribution.fetched_at.format("%Y-%m-%d %H:%M UTC")
    );

    Ok(())
}
