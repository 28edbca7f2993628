//! One-shot check of a target, printed the way the watch cycle sees it.

use std::fmt::Write as _;
use std::sync::Arc;

use pricewatch_core::{AppConfig, CategoryCatalog, Target};
use pricewatch_scraper::{scan, ExtractContext, ListingSource, MarketplaceClient, Scan};
use rust_decimal::Decimal;

/// Fetches `target` once and prints the classification and every match.
///
/// # Errors
///
/// Returns an error if the target cannot be resolved or the marketplace
/// cannot be reached. Blocked or malformed responses are reported, not
/// returned as errors.
pub(crate) async fn run_check(
    config: &AppConfig,
    catalog: CategoryCatalog,
    target: Target,
    threshold: Decimal,
) -> anyhow::Result<()> {
    let client = MarketplaceClient::from_config(config, Arc::new(catalog))
        .map_err(|e| anyhow::anyhow!("failed to build marketplace client: {e}"))?;
    let (url, format) = client.request_for(&target)?;
    println!("GET {url} ({format:?})");

    let raw = client.fetch(&target).await?;
    let ctx = ExtractContext {
        site_url: config.marketplace_site_url.clone(),
        max_entries: config.max_entries,
    };
    let result = scan(&raw, threshold, &ctx);
    tracing::debug!(status = raw.status, outcome = result.label(), "check complete");

    print!("{}", render_scan(raw.status, &result, threshold));
    Ok(())
}

fn render_scan(status: u16, result: &Scan, threshold: Decimal) -> String {
    let mut out = format!("status {status}: {}\n", result.label());
    match result {
        Scan::Checked { matches, extracted } => {
            let _ = writeln!(
                out,
                "{extracted} products extracted, {} at or below {}",
                matches.len(),
                threshold.normalize()
            );
            for product in matches {
                let _ = writeln!(
                    out,
                    "{:>12}  {}  {}",
                    product.price.normalize().to_string(),
                    product.name,
                    product.link
                );
            }
        }
        Scan::Empty => out.push_str("no products listed\n"),
        Scan::Blocked => {
            out.push_str("no results: the marketplace answered with an anti-bot challenge\n");
        }
        Scan::ServerError { .. } => out.push_str("marketplace returned an error status\n"),
        Scan::Malformed { reason } => {
            let _ = writeln!(out, "unexpected payload: {reason}");
        }
    }
    out
}
