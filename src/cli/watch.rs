use super::ui;
use crate::core::config::{AppConfig, WatchEntry};
use crate::core::{PriceOracle, PriceSource, PriceUpdate};
use crate::feed::{PriceFeed, SubscriptionHandle};
use anyhow::Result;
use comfy_table::Cell;
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info};

struct Watched<'a> {
    entry: &'a WatchEntry,
    opening: f64,
    handle: SubscriptionHandle,
}

fn format_update(update: &PriceUpdate, opening: Option<f64>) -> String {
    let source = match update.source {
        PriceSource::Oracle => "live",
        PriceSource::Simulated => "sim",
    };
    let change = opening
        .filter(|open| *open != 0.0)
        .map(|open| {
            let absolute = update.price - open;
            ui::style_change(absolute, absolute / open * 100.0)
        })
        .unwrap_or_default();

    format!(
        "{:<6} {:>14.4} {} {}",
        ui::style_text(&update.symbol, ui::StyleType::TotalLabel),
        update.price,
        change,
        ui::style_text(&format!("[{source} #{}]", update.sequence), ui::StyleType::Subtle)
    )
}

/// Opening prices: the oracle's answer for crypto, the configured price otherwise.
async fn opening_prices<'a>(
    watchlist: &'a [WatchEntry],
    oracle: &dyn PriceOracle,
) -> Vec<(&'a WatchEntry, f64)> {
    let lookups = watchlist.iter().map(|entry| async move {
        let quoted = if entry.asset_class.uses_oracle() {
            oracle.fetch(&entry.symbol).await
        } else {
            None
        };
        (entry, quoted.unwrap_or(entry.price))
    });
    join_all(lookups).await
}

pub async fn run(
    config: &AppConfig,
    oracle: Arc<dyn PriceOracle>,
    duration: Option<Duration>,
) -> Result<()> {
    if config.watchlist.is_empty() {
        println!("No symbols in the watchlist.");
        return Ok(());
    }

    let feed = PriceFeed::new(Arc::clone(&oracle), config.feed.clone())?;
    let (tx, mut rx) = mpsc::unbounded_channel::<PriceUpdate>();

    let mut watched = Vec::new();
    for (entry, opening) in opening_prices(&config.watchlist, oracle.as_ref()).await {
        let tx = tx.clone();
        let handle = feed.subscribe(&entry.symbol, entry.asset_class, opening, move |update| {
            let _ = tx.send(update.clone());
        });
        watched.push(Watched {
            entry,
            opening,
            handle,
        });
    }
    drop(tx);

    // Duplicate watchlist symbols share a ticker, so the first opening wins.
    let mut openings: HashMap<&str, f64> = HashMap::new();
    for w in &watched {
        openings.entry(w.entry.symbol.as_str()).or_insert(w.opening);
    }

    info!(
        symbols = watched.len(),
        tickers = feed.active_tickers(),
        "Watching prices"
    );
    let pb = ui::new_spinner(&format!(
        "Streaming {} symbols, Ctrl-C to stop",
        feed.active_tickers()
    ));

    let deadline = async {
        match duration {
            Some(d) => tokio::time::sleep(d).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::pin!(deadline);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut deadline => break,
            _ = &mut ctrl_c => {
                debug!("Interrupted");
                break;
            }
            update = rx.recv() => match update {
                Some(update) => {
                    let opening = openings.get(update.symbol.as_str()).copied();
                    pb.println(format_update(&update, opening));
                }
                None => break,
            },
        }
    }
    pb.finish_and_clear();

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Symbol"),
        ui::header_cell("Class"),
        ui::header_cell("Opening"),
        ui::header_cell("Last"),
        ui::header_cell("Change"),
    ]);
    for w in &watched {
        let opening = openings
            .get(w.entry.symbol.as_str())
            .copied()
            .unwrap_or(w.opening);
        let last = feed.current_price(&w.entry.symbol).unwrap_or(opening);
        let change = if opening == 0.0 {
            0.0
        } else {
            (last - opening) / opening * 100.0
        };
        table.add_row(vec![
            Cell::new(&w.entry.symbol),
            Cell::new(w.entry.asset_class.to_string()),
            ui::value_cell(opening),
            ui::value_cell(last),
            ui::change_cell(change),
        ]);
    }

    for w in &watched {
        feed.unsubscribe(&w.entry.symbol, w.handle);
    }
    debug!(remaining = feed.active_tickers(), "Unsubscribed watchlist");

    println!("{table}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::AssetClass;
    use async_trait::async_trait;

    struct FixedOracle(f64);

    #[async_trait]
    impl PriceOracle for FixedOracle {
        async fn fetch(&self, _symbol: &str) -> Option<f64> {
            Some(self.0)
        }
    }

    fn entry(symbol: &str, asset_class: AssetClass, price: f64) -> WatchEntry {
        WatchEntry {
            symbol: symbol.to_string(),
            asset_class,
            price,
            cost_basis: None,
        }
    }

    #[tokio::test]
    async fn test_opening_prices_prefer_oracle_for_crypto() {
        let watchlist = vec![
            entry("BTC", AssetClass::Crypto, 60000.0),
            entry("AAPL", AssetClass::Equity, 190.0),
        ];
        let openings = opening_prices(&watchlist, &FixedOracle(61000.0)).await;

        assert_eq!(openings[0].1, 61000.0);
        assert_eq!(openings[1].1, 190.0);
    }

    #[test]
    fn test_format_update_mentions_source_and_sequence() {
        let update = PriceUpdate {
            symbol: "BTC".to_string(),
            price: 101.0,
            sequence: 7,
            source: PriceSource::Simulated,
        };
        let line = console::strip_ansi_codes(&format_update(&update, Some(100.0))).to_string();

        assert!(line.contains("BTC"));
        assert!(line.contains("101.0000"));
        assert!(line.contains("+1.00 (+1.00%)"));
        assert!(line.contains("[sim #7]"));
    }
}
