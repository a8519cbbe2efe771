//! Refresh scheduling and operation reconciliation

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use chrono::Local;
use console_core::{EntityQuery, RunRequest};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::api::ConsoleApi;
use crate::flag::BusyFlag;
use crate::state::{Controls, DashboardState, Visibility};

/// Tuning knobs of the synchronizer
#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub refresh_interval: Duration,
    pub auto_refresh: bool,
    /// Entity search issued on mount
    pub entity_query: EntityQuery,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            refresh_interval: Duration::from_secs(10),
            auto_refresh: true,
            entity_query: EntityQuery::new().limit(20),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Completed,
    /// Another refresh was outstanding; nothing was sent
    AlreadyInFlight,
    /// Dashboard not visible; nothing was sent
    Hidden,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    /// A run is already being submitted
    Busy,
    /// Blank intent, not submitted
    Ignored,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoryOutcome {
    Completed,
    Busy,
    Failed(String),
}

struct Ticker {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl Ticker {
    fn stop(self) {
        self.cancel.cancel();
        self.handle.abort();
    }
}

struct SyncInner<A> {
    api: A,
    options: SyncOptions,
    state: RwLock<DashboardState>,
    refreshing: BusyFlag,
    running: BusyFlag,
    summarizing: BusyFlag,
    searching: BusyFlag,
    hidden: AtomicBool,
    ticker: Mutex<Option<Ticker>>,
}

impl<A> SyncInner<A> {
    fn take_ticker(&self) -> Option<Ticker> {
        self.ticker
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
    }
}

impl<A> Drop for SyncInner<A> {
    fn drop(&mut self) {
        if let Some(ticker) = self.take_ticker() {
            ticker.stop();
        }
    }
}

/// Drives one dashboard session.
///
/// Cloning is cheap and every clone drives the same session. The
/// auto-refresh timer only holds a weak reference, so dropping the last
/// handle stops it.
pub struct DashboardSync<A> {
    inner: Arc<SyncInner<A>>,
}

impl<A> Clone for DashboardSync<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A: ConsoleApi + 'static> DashboardSync<A> {
    pub fn new(api: A, options: SyncOptions) -> Self {
        let state = DashboardState::new(options.auto_refresh);
        Self {
            inner: Arc::new(SyncInner {
                api,
                options,
                state: RwLock::new(state),
                refreshing: BusyFlag::default(),
                running: BusyFlag::default(),
                summarizing: BusyFlag::default(),
                searching: BusyFlag::default(),
                hidden: AtomicBool::new(false),
                ticker: Mutex::new(None),
            }),
        }
    }

    pub fn api(&self) -> &A {
        &self.inner.api
    }

    /// Current state, with the control flags filled in
    pub async fn snapshot(&self) -> DashboardState {
        let mut state = self.inner.state.read().await.clone();
        state.visibility = self.visibility();
        state.controls = Controls {
            run_enabled: !self.inner.running.is_set(),
            summarize_enabled: !self.inner.summarizing.is_set(),
            search_enabled: !self.inner.searching.is_set(),
            refreshing: self.inner.refreshing.is_set(),
        };
        state
    }

    /// Initial load: meta, summaries and entities concurrently, then the
    /// auto-refresh timer if enabled
    pub async fn mount(&self) {
        if self.inner.options.auto_refresh {
            self.start_ticker();
        }
        let query = self.inner.options.entity_query.clone();
        tokio::join!(
            self.refresh(),
            self.load_summaries(),
            self.search_entities(query),
        );
    }

    /// Stops every timer owned by this session
    pub fn unmount(&self) {
        if let Some(ticker) = self.inner.take_ticker() {
            ticker.stop();
            debug!("Auto refresh stopped");
        }
    }

    pub fn visibility(&self) -> Visibility {
        if self.inner.hidden.load(Ordering::Acquire) {
            Visibility::Hidden
        } else {
            Visibility::Visible
        }
    }

    pub fn set_visibility(&self, visibility: Visibility) {
        let hidden = visibility == Visibility::Hidden;
        if self.inner.hidden.swap(hidden, Ordering::AcqRel) != hidden {
            debug!(?visibility, "Dashboard visibility changed");
        }
    }

    pub async fn set_auto_refresh(&self, enabled: bool) {
        self.inner.state.write().await.auto_refresh = enabled;
        if enabled {
            self.start_ticker();
        } else {
            self.unmount();
        }
    }

    fn start_ticker(&self) {
        let mut slot = self
            .inner
            .ticker
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if slot.is_some() {
            return;
        }

        let cancel = CancellationToken::new();
        let period = self.inner.options.refresh_interval;
        let handle = tokio::spawn(run_ticker(
            Arc::downgrade(&self.inner),
            cancel.clone(),
            period,
        ));
        *slot = Some(Ticker { cancel, handle });
        debug!(period_ms = period.as_millis() as u64, "Auto refresh started");
    }

    /// Reloads the tool and execution panels.
    ///
    /// At most one refresh is outstanding at a time; extra attempts return
    /// without touching the network, as do attempts while hidden.
    pub async fn refresh(&self) -> RefreshOutcome {
        if self.visibility() == Visibility::Hidden {
            debug!("Dashboard hidden, refresh skipped");
            return RefreshOutcome::Hidden;
        }
        let Some(_guard) = self.inner.refreshing.try_acquire() else {
            debug!("Refresh already in flight, skipped");
            return RefreshOutcome::AlreadyInFlight;
        };

        let outcome = self.inner.api.meta().await;

        let mut state = self.inner.state.write().await;
        match outcome {
            Ok(meta) => {
                if meta.errors.any() {
                    warn!(
                        tools = ?meta.errors.tools,
                        executions = ?meta.errors.executions,
                        "Backend reported errors"
                    );
                }
                state.apply_meta(meta);
            }
            Err(err) => {
                warn!("Dashboard refresh failed: {}", err);
                state.apply_meta_failure(&err.to_string());
            }
        }
        state.last_updated = Some(Local::now().format("%H:%M:%S").to_string());
        RefreshOutcome::Completed
    }

    /// Submits a run, keeps its full response and refreshes once
    pub async fn submit_run(&self, request: RunRequest) -> RunOutcome {
        if request.is_blank() {
            return RunOutcome::Ignored;
        }
        let Some(_guard) = self.inner.running.try_acquire() else {
            return RunOutcome::Busy;
        };

        {
            let mut state = self.inner.state.write().await;
            state.last_result = None;
            state.run_error = None;
        }

        info!(agent_id = ?request.agent_id, "Submitting run");
        let outcome = match self.inner.api.run(&request).await {
            Ok(result) => {
                self.inner.state.write().await.last_result = Some(result);
                RunOutcome::Completed
            }
            Err(err) => {
                warn!("Run submission failed: {}", err);
                let message = err.to_string();
                self.inner.state.write().await.run_error = Some(message.clone());
                RunOutcome::Failed(message)
            }
        };

        self.refresh().await;
        outcome
    }

    /// Replaces the summary cache; failures leave it empty
    pub async fn load_summaries(&self) {
        let outcome = self.inner.api.summaries().await;
        let mut state = self.inner.state.write().await;
        match outcome {
            Ok(summaries) => state.summaries = summaries,
            Err(err) => {
                warn!("Loading summaries failed: {}", err);
                state.summaries.clear();
                state.memory_error = Some(err.to_string());
            }
        }
    }

    /// Asks the backend for a new summary, then reloads the summary list
    pub async fn summarize(&self) -> MemoryOutcome {
        let Some(_guard) = self.inner.summarizing.try_acquire() else {
            return MemoryOutcome::Busy;
        };

        match self.inner.api.summarize().await {
            Ok(_) => {
                self.inner.state.write().await.memory_error = None;
                self.load_summaries().await;
                MemoryOutcome::Completed
            }
            Err(err) => {
                warn!("Summarize failed: {}", err);
                let message = err.to_string();
                self.inner.state.write().await.memory_error = Some(message.clone());
                MemoryOutcome::Failed(message)
            }
        }
    }

    pub async fn search_entities(&self, query: EntityQuery) -> MemoryOutcome {
        let Some(_guard) = self.inner.searching.try_acquire() else {
            return MemoryOutcome::Busy;
        };

        let outcome = self.inner.api.search_entities(&query).await;
        let mut state = self.inner.state.write().await;
        match outcome {
            Ok(entities) => {
                state.entities = entities;
                state.memory_error = None;
                MemoryOutcome::Completed
            }
            Err(err) => {
                warn!("Entity search failed: {}", err);
                let message = err.to_string();
                state.entities.clear();
                state.memory_error = Some(message.clone());
                MemoryOutcome::Failed(message)
            }
        }
    }

    /// Points the tool inspector at `name`, or clears it when unknown
    pub async fn select_tool(&self, name: &str) {
        self.inner.state.write().await.select_tool(name);
    }
}

async fn run_ticker<A: ConsoleApi + 'static>(
    session: Weak<SyncInner<A>>,
    cancel: CancellationToken,
    period: Duration,
) {
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {}
        }
        let Some(inner) = session.upgrade() else {
            break;
        };
        DashboardSync { inner }.refresh().await;
    }
}
