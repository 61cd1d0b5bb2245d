//! Subscription registry and per-symbol ticker scheduling.
//!
//! A [`PriceFeed`] owns at most one ticker task per symbol, however many
//! subscribers that symbol has. Each tick produces exactly one price, taken
//! from the oracle for crypto instruments when it answers and from the
//! simulator otherwise, and delivers it to every subscriber in subscription
//! order.

use crate::core::config::FeedConfig;
use crate::core::random::entropy_factory;
use crate::core::{AssetClass, PriceOracle, PriceSource, PriceUpdate, RandomFactory, RandomSource};
use crate::feed::simulator;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

pub type UpdateCallback = Arc<dyn Fn(&PriceUpdate) + Send + Sync>;

/// Identifies one registration made with [`PriceFeed::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle(u64);

struct TickerState {
    price: f64,
    sequence: u64,
    subscribers: Vec<(SubscriptionHandle, UpdateCallback)>,
    // Set once the entry has been purged; a closed state never delivers again.
    closed: bool,
    // Thread running the current fan-out, if any.
    delivering: Option<ThreadId>,
}

struct Shared {
    state: Mutex<TickerState>,
    // Held by the ticker for a whole fan-out.
    fanout: Mutex<()>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, TickerState> {
        lock(&self.state)
    }

    /// Waits out a fan-out in progress on another thread. Returns `None`
    /// when called from one of that fan-out's own callbacks.
    fn exclude_fanout(&self) -> Option<MutexGuard<'_, ()>> {
        let in_callback = self.lock().delivering == Some(thread::current().id());
        (!in_callback).then(|| lock(&self.fanout))
    }
}

type SharedState = Arc<Shared>;

struct Entry {
    asset_class: AssetClass,
    state: SharedState,
    stop: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl Entry {
    fn close(mut self) {
        {
            let _fanout = self.state.exclude_fanout();
            let mut state = self.state.lock();
            state.closed = true;
            state.subscribers.clear();
        }
        if let Some(stop) = self.stop.take() {
            // The task may already be gone; nothing to do then.
            let _ = stop.send(());
        }
        debug!(finished = self.task.is_finished(), "Ticker stop signalled");
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct PriceFeed {
    entries: Mutex<HashMap<String, Entry>>,
    oracle: Arc<dyn PriceOracle>,
    config: FeedConfig,
    random: RandomFactory,
    next_handle: AtomicU64,
    runtime: Handle,
}

impl PriceFeed {
    /// Creates a feed bound to the current tokio runtime.
    pub fn new(oracle: Arc<dyn PriceOracle>, config: FeedConfig) -> Result<Self> {
        let runtime =
            Handle::try_current().context("PriceFeed must be created inside a tokio runtime")?;
        config.validate().context("Invalid feed settings")?;
        Ok(Self {
            entries: Mutex::new(HashMap::new()),
            oracle,
            config,
            random: entropy_factory(),
            next_handle: AtomicU64::new(1),
            runtime,
        })
    }

    /// Replaces the source of randomness handed to new tickers.
    pub fn with_random_factory(mut self, random: RandomFactory) -> Self {
        self.random = random;
        self
    }

    /// Registers `on_update` for `symbol`, starting a ticker if the symbol
    /// has none yet.
    ///
    /// A symbol that is already ticking keeps its current price and asset
    /// class; `asset_class` and `initial_price` only seed a new entry.
    /// Callbacks run on the ticker task, outside the registry's locks, and
    /// may subscribe or unsubscribe on any symbol including their own.
    /// A registration added during a fan-out first hears the next tick.
    pub fn subscribe<F>(
        &self,
        symbol: &str,
        asset_class: AssetClass,
        initial_price: f64,
        on_update: F,
    ) -> SubscriptionHandle
    where
        F: Fn(&PriceUpdate) + Send + Sync + 'static,
    {
        let handle = SubscriptionHandle(self.next_handle.fetch_add(1, Ordering::Relaxed));
        let callback: UpdateCallback = Arc::new(on_update);

        loop {
            let existing = {
                let mut entries = lock(&self.entries);
                match entries.get(symbol) {
                    Some(entry) => Arc::clone(&entry.state),
                    None => {
                        let entry = self.start_ticker(
                            symbol,
                            asset_class,
                            initial_price,
                            (handle, Arc::clone(&callback)),
                        );
                        entries.insert(symbol.to_string(), entry);
                        return handle;
                    }
                }
            };

            {
                let mut state = existing.lock();
                if !state.closed {
                    state.subscribers.push((handle, Arc::clone(&callback)));
                    debug!(
                        symbol,
                        subscribers = state.subscribers.len(),
                        "Joined existing ticker"
                    );
                    return handle;
                }
            }

            // Lost a race with the last unsubscribe: clear the dying entry and start over.
            self.purge_if_current(symbol, &existing);
        }
    }

    /// Channel flavour of [`PriceFeed::subscribe`].
    pub fn subscribe_channel(
        &self,
        symbol: &str,
        asset_class: AssetClass,
        initial_price: f64,
    ) -> (SubscriptionHandle, mpsc::UnboundedReceiver<PriceUpdate>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = self.subscribe(symbol, asset_class, initial_price, move |update| {
            // A dropped receiver just stops listening.
            let _ = tx.send(update.clone());
        });
        (handle, rx)
    }

    /// Removes one registration. Returns `false` if `handle` was not
    /// subscribed to `symbol`.
    ///
    /// Removing the last subscriber stops the ticker and forgets the price.
    pub fn unsubscribe(&self, symbol: &str, handle: SubscriptionHandle) -> bool {
        let Some(shared) = lock(&self.entries)
            .get(symbol)
            .map(|entry| Arc::clone(&entry.state))
        else {
            debug!(symbol, "Unsubscribe for unknown symbol ignored");
            return false;
        };

        let now_empty = {
            let _fanout = shared.exclude_fanout();
            let mut state = shared.lock();
            let before = state.subscribers.len();
            state.subscribers.retain(|(h, _)| *h != handle);
            if state.subscribers.len() == before {
                debug!(symbol, ?handle, "Unsubscribe for unknown handle ignored");
                return false;
            }
            if state.subscribers.is_empty() {
                state.closed = true;
            }
            state.closed
        };

        if now_empty {
            self.purge_if_current(symbol, &shared);
        }
        true
    }

    pub fn current_price(&self, symbol: &str) -> Option<f64> {
        let shared = lock(&self.entries)
            .get(symbol)
            .map(|entry| Arc::clone(&entry.state))?;
        let state = shared.lock();
        (!state.closed).then_some(state.price)
    }

    pub fn subscriber_count(&self, symbol: &str) -> usize {
        let Some(state) = lock(&self.entries)
            .get(symbol)
            .map(|entry| Arc::clone(&entry.state))
        else {
            return 0;
        };
        state.lock().subscribers.len()
    }

    pub fn asset_class(&self, symbol: &str) -> Option<AssetClass> {
        lock(&self.entries)
            .get(symbol)
            .map(|entry| entry.asset_class)
    }

    pub fn active_tickers(&self) -> usize {
        lock(&self.entries).len()
    }

    /// Stops every ticker and empties the registry.
    pub fn shutdown(&self) {
        let drained: Vec<(String, Entry)> = lock(&self.entries).drain().collect();
        for (symbol, entry) in drained {
            info!(symbol = %symbol, "Stopping ticker");
            entry.close();
        }
    }

    fn purge_if_current(&self, symbol: &str, state: &SharedState) {
        let removed = {
            let mut entries = lock(&self.entries);
            match entries.get(symbol) {
                Some(entry) if Arc::ptr_eq(&entry.state, state) => entries.remove(symbol),
                _ => None,
            }
        };
        if let Some(entry) = removed {
            info!(symbol, "Last subscriber left, stopping ticker");
            entry.close();
        }
    }

    fn start_ticker(
        &self,
        symbol: &str,
        asset_class: AssetClass,
        initial_price: f64,
        first: (SubscriptionHandle, UpdateCallback),
    ) -> Entry {
        let state = Arc::new(Shared {
            state: Mutex::new(TickerState {
                price: initial_price,
                sequence: 0,
                subscribers: vec![first],
                closed: false,
                delivering: None,
            }),
            fanout: Mutex::new(()),
        });
        let (stop_tx, stop_rx) = oneshot::channel();

        let ticker = Ticker {
            symbol: symbol.to_string(),
            asset_class,
            volatility: self.config.volatility_for(asset_class),
            state: Arc::clone(&state),
            oracle: Arc::clone(&self.oracle),
            rng: (self.random)(),
        };
        let period = self.config.interval_for(asset_class);
        let first_tick = Instant::now() + period;
        let task = self
            .runtime
            .spawn(run_ticker(ticker, first_tick, period, stop_rx));

        info!(
            symbol,
            %asset_class,
            initial_price,
            period_ms = period.as_millis() as u64,
            "Started ticker"
        );

        Entry {
            asset_class,
            state,
            stop: Some(stop_tx),
            task,
        }
    }
}

impl Drop for PriceFeed {
    fn drop(&mut self) {
        self.shutdown();
    }
}

struct Ticker {
    symbol: String,
    asset_class: AssetClass,
    volatility: f64,
    state: SharedState,
    oracle: Arc<dyn PriceOracle>,
    rng: Box<dyn RandomSource>,
}

impl Ticker {
    /// Runs one read, compute, store, notify cycle. Returns `false` once the
    /// entry has been closed.
    async fn tick(&mut self) -> bool {
        let last_price = {
            let state = self.state.lock();
            if state.closed {
                return false;
            }
            state.price
        };

        let (price, source) = self.next_price(last_price).await;
        self.deliver(price, source)
    }

    /// Stores `price` and hands it to each subscriber in order, skipping any
    /// that an earlier callback in the same fan-out removed.
    fn deliver(&self, price: f64, source: PriceSource) -> bool {
        let _fanout = lock(&self.state.fanout);
        let (update, subscribers) = {
            let mut state = self.state.lock();
            if state.closed || state.subscribers.is_empty() {
                debug!(symbol = %self.symbol, "Entry closed during tick, discarding price");
                return false;
            }
            state.price = price;
            state.sequence += 1;
            state.delivering = Some(thread::current().id());
            let update = PriceUpdate {
                symbol: self.symbol.clone(),
                price,
                sequence: state.sequence,
                source,
            };
            (update, state.subscribers.clone())
        };

        for (handle, callback) in &subscribers {
            let subscribed = self.state.lock().subscribers.iter().any(|(h, _)| h == handle);
            if subscribed {
                callback(&update);
            }
        }

        let mut state = self.state.lock();
        state.delivering = None;
        !state.closed
    }

    async fn next_price(&mut self, last_price: f64) -> (f64, PriceSource) {
        if !self.asset_class.uses_oracle() {
            return (self.simulate(last_price), PriceSource::Simulated);
        }

        match self.oracle.fetch(&self.symbol).await {
            Some(price) if price.is_finite() && price > 0.0 => (price, PriceSource::Oracle),
            _ => (
                self.fallback_to_simulation(last_price),
                PriceSource::Simulated,
            ),
        }
    }

    fn fallback_to_simulation(&mut self, last_price: f64) -> f64 {
        debug!(symbol = %self.symbol, "Oracle had no price, falling back to simulation");
        self.simulate(last_price)
    }

    fn simulate(&mut self, last_price: f64) -> f64 {
        simulator::step(last_price, self.volatility, self.rng.as_mut()).max(0.0)
    }
}

async fn run_ticker(
    mut ticker: Ticker,
    first_tick: Instant,
    period: Duration,
    mut stop: oneshot::Receiver<()>,
) {
    let mut interval = tokio::time::interval_at(first_tick, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = &mut stop => break,
            _ = interval.tick() => {}
        }
        if !ticker.tick().await {
            break;
        }
    }
    debug!(symbol = %ticker.symbol, "Ticker task finished");
}
