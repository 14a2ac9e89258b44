use satrank::config::Config;
use satrank::percentile;
use satrank::provider::DistributionProvider;
use satrank::report;
use satrank::stats::DistributionStats;
use satrank::store::SnapshotStore;
use std::path::Path;
use std::time::Duration;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Load config
    let config = if Path::new("satrank.toml").exists() {
        Config::load(Path::new("satrank.toml"))?
    } else {
        Config::from_env()
    };

    // Initialize logging
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    if config.logging.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .init();
    }

    info!("satrank v{} starting", env!("CARGO_PKG_VERSION"));

    // --- Arguments ---
    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let watch = if let Some(pos) = args.iter().position(|a| a == "--watch") {
        args.remove(pos);
        true
    } else {
        false
    };
    let amount_str = args.first().cloned().unwrap_or_else(|| {
        eprintln!("Usage: satrank <amount_btc> [--watch]");
        eprintln!("Example: satrank 0.25");
        eprintln!("         satrank 1.5 --watch");
        std::process::exit(1);
    });

    let amount = percentile::parse_amount(&amount_str)?;

    // --- Snapshot + report ---
    let provider = DistributionProvider::new(config.provider.clone());
    let distribution = provider.fetch_distribution().await;
    info!(
        source = %distribution.source,
        buckets = distribution.buckets.len(),
        total_addresses = distribution.total_addresses,
        "distribution snapshot loaded"
    );

    let spot_price = match provider.fetch_spot_price().await {
        Ok(price) => Some(price),
        Err(e) => {
            info!(error = %e, "spot price unavailable, omitting USD estimates");
            None
        }
    };

    let holding = percentile::compute(&distribution, amount)?;
    let stats = DistributionStats::compute(&distribution);
    let thresholds = percentile::percentile_thresholds(&distribution)?;
    println!(
        "{}",
        report::render(&holding, &stats, &distribution, &thresholds, spot_price)
    );

    if !watch {
        return Ok(());
    }

    // --- Watch mode: periodic snapshot refresh ---
    let refresh = Duration::from_secs(config.provider.refresh_interval_secs);
    let store = SnapshotStore::new(refresh * 2);
    store.replace("primary", distribution);

    let mut interval = tokio::time::interval(refresh);
    interval.tick().await; // the first tick fires immediately

    info!(
        refresh_secs = config.provider.refresh_interval_secs,
        "entering watch loop - press Ctrl+C to stop"
    );

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let fresh = provider.fetch_distribution().await;
                match percentile::compute(&fresh, amount) {
                    Ok(updated) => {
                        info!(
                            percentile = updated.percentile,
                            rank = updated.rank,
                            category = updated.category.as_str(),
                            source = %fresh.source,
                            "recomputed against fresh snapshot"
                        );
                        store.replace("primary", fresh);
                    }
                    Err(e) => error!(error = %e, "recompute against fresh snapshot failed"),
                }
            }

            _ = tokio::signal::ctrl_c() => {
                info!("shutting down...");
                break;
            }
        }
    }

    Ok(())
}
