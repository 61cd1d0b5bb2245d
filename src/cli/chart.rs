use super::ui;
use crate::chart::{Chart, ChartSession, RangeKey};
use crate::core::PriceOracle;
use crate::core::config::AppConfig;
use crate::core::random::entropy_factory;
use anyhow::{Result, anyhow};
use comfy_table::Cell;
use tracing::debug;

/// Rows shown for a chart; longer series are thinned evenly.
const MAX_ROWS: usize = 13;

fn sample_indices(len: usize, max_rows: usize) -> Vec<usize> {
    if len <= max_rows || max_rows < 2 {
        return (0..len).collect();
    }
    let last = len - 1;
    let mut indices: Vec<usize> = (0..max_rows)
        .map(|i| (i * last + (max_rows - 1) / 2) / (max_rows - 1))
        .collect();
    indices.dedup();
    indices
}

impl Chart {
    pub fn display_as_table(&self, entity: &str) -> String {
        let mut table = ui::new_styled_table();
        table.set_header(vec![ui::header_cell("When"), ui::header_cell("Price")]);

        for i in sample_indices(self.points.len(), MAX_ROWS) {
            let point = &self.points[i];
            table.add_row(vec![Cell::new(&point.label), ui::value_cell(point.value)]);
        }

        let mut output = format!(
            "{} {}\n\n",
            ui::style_text(entity, ui::StyleType::Title),
            ui::style_text(&format!("({})", self.range), ui::StyleType::Subtle)
        );
        output.push_str(&table.to_string());
        output.push_str(&format!(
            "\n\n{}: {}",
            ui::style_text(&self.stats.label, ui::StyleType::TotalLabel),
            ui::style_change(self.stats.profit_absolute, self.stats.profit_percent)
        ));
        output
    }
}

/// Renders the requested range for one watchlist symbol, followed by an
/// overview of every range drawn from the same session.
pub async fn run(
    config: &AppConfig,
    oracle: &dyn PriceOracle,
    symbol: &str,
    range: RangeKey,
) -> Result<()> {
    let entry = config
        .find_watch_entry(symbol)
        .ok_or_else(|| anyhow!("Symbol {} is not in the watchlist", symbol))?;

    let live_value = if entry.asset_class.uses_oracle() {
        oracle.fetch(&entry.symbol).await.unwrap_or(entry.price)
    } else {
        entry.price
    };
    debug!(symbol = %entry.symbol, live_value, %range, "Rendering chart");

    let session = ChartSession::new(&entry.symbol, entry.cost_basis, &entropy_factory());
    let chart = session.chart(range, live_value).await;
    println!("{}", chart.display_as_table(session.entity()));

    let mut overview = ui::new_styled_table();
    overview.set_header(vec![
        ui::header_cell("Range"),
        ui::header_cell("Start"),
        ui::header_cell("Now"),
        ui::header_cell("Change"),
    ]);
    for key in RangeKey::ALL {
        let chart = session.chart(key, live_value).await;
        let start = chart.points.first().map_or(live_value, |p| p.value);
        overview.add_row(vec![
            Cell::new(format!("{} {}", key, key.description())),
            ui::value_cell(start),
            ui::value_cell(live_value),
            ui::change_cell(chart.stats.profit_percent),
        ]);
    }
    ui::print_separator();
    println!("{overview}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::assemble_at;
    use chrono::NaiveDate;

    #[test]
    fn test_sample_indices_keep_both_ends() {
        assert_eq!(sample_indices(5, 13), vec![0, 1, 2, 3, 4]);

        let sampled = sample_indices(78, 13);
        assert_eq!(sampled.len(), 13);
        assert_eq!(sampled[0], 0);
        assert_eq!(*sampled.last().unwrap(), 77);
        assert!(sampled.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_display_as_table_includes_stats() {
        let now = NaiveDate::from_ymd_opt(2026, 10, 16)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let chart = assemble_at(&[100.0, 110.0, 105.0], 130.0, RangeKey::Week, now);
        let output = console::strip_ansi_codes(&chart.display_as_table("AAPL")).to_string();

        assert!(output.contains("AAPL"));
        assert!(output.contains("(1W)"));
        assert!(output.contains("130.00"));
        assert!(output.contains("Past week: +30.00 (+30.00%)"));
    }
}
