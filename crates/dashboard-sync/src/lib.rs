//! Dashboard Synchronizer
//!
//! Client-side half of the console: periodically refreshes the dashboard
//! from the gateway's `/meta` endpoint, never runs two refreshes at once,
//! pauses while the dashboard is hidden and folds run results and knowledge
//! queries back into one owned state.

pub mod api;
pub mod error;
mod flag;
pub mod state;
pub mod sync;

pub use api::{ConsoleApi, ConsoleClient};
pub use error::{Result, SyncError};
pub use state::{BackendStatus, Controls, DashboardState, Visibility};
pub use sync::{DashboardSync, MemoryOutcome, RefreshOutcome, RunOutcome, SyncOptions};
