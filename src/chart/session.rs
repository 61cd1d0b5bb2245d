use crate::chart::assembler::{self, Chart};
use crate::chart::path::generate_path;
use crate::chart::range::RangeKey;
use crate::core::cache::Cache;
use crate::core::{RandomFactory, RandomSource};
use chrono::NaiveDateTime;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info};

pub type HistoricalPath = Arc<Vec<f64>>;

/// Chart state for one entity while it is on screen.
///
/// Each range's path is synthesized on first use and then reused, so only
/// the live tip moves between calls. [`ChartSession::reset`] is the one way
/// to get new shapes.
pub struct ChartSession {
    entity: String,
    cost_basis: Option<f64>,
    paths: Cache<RangeKey, HistoricalPath>,
    rng: Mutex<Box<dyn RandomSource>>,
}

impl ChartSession {
    pub fn new(entity: &str, cost_basis: Option<f64>, random: &RandomFactory) -> Self {
        Self {
            entity: entity.to_string(),
            cost_basis,
            paths: Cache::new(),
            rng: Mutex::new(random()),
        }
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// Returns the cached path for `range`, building it to end at
    /// `live_value` if this session has not drawn that range yet.
    pub async fn path(&self, range: RangeKey, live_value: f64) -> HistoricalPath {
        self.paths
            .get_or_insert_with(range, || {
                let spec = range.spec();
                let start = spec.start_rule.start_value(live_value, self.cost_basis);
                debug!(
                    entity = %self.entity,
                    %range,
                    start,
                    end = live_value,
                    steps = spec.step_count,
                    "Synthesizing history"
                );
                let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
                Arc::new(generate_path(
                    start,
                    live_value,
                    spec.step_count,
                    spec.volatility,
                    rng.as_mut(),
                ))
            })
            .await
    }

    pub async fn chart(&self, range: RangeKey, live_value: f64) -> Chart {
        let path = self.path(range, live_value).await;
        assembler::assemble(&path, live_value, range)
    }

    pub async fn chart_at(&self, range: RangeKey, live_value: f64, now: NaiveDateTime) -> Chart {
        let path = self.path(range, live_value).await;
        assembler::assemble_at(&path, live_value, range, now)
    }

    /// Switches to another entity and drops every cached path.
    pub async fn reset(&mut self, entity: &str, cost_basis: Option<f64>) {
        info!(from = %self.entity, to = entity, "Resetting chart session");
        self.entity = entity.to_string();
        self.cost_basis = cost_basis;
        self.paths.clear().await;
    }
}
