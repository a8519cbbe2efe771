//! Core data model for the Specter console
//!
//! This crate contains the types shared between the gateway and the
//! dashboard synchronizer:
//! - Runtime configuration
//! - Executions and the tool catalog
//! - Run requests and their event traces
//! - Knowledge store records and entity search shaping
//! - The aggregated dashboard payload

pub mod config;
pub mod execution;
pub mod knowledge;
pub mod meta;
pub mod run;
pub mod tool;

pub use config::Configuration;
pub use execution::{Execution, ExecutionStatus};
pub use knowledge::{Entity, EntityQuery, Relation, Summary};
pub use meta::{DashboardMeta, MetaErrors};
pub use run::{RunEvent, RunRequest, RunResult, RunSummary};
pub use tool::ToolSpec;
