//! Pick-finding engine: derives betting lines from player history and model predictions,
//! filters player/game pairs through configurable gates, and ranks the survivors.

pub mod cli;
pub mod diagnostics;
pub mod error;
pub mod evaluator;
pub mod history;
pub mod metrics;
pub mod orchestrator;
pub mod predictions;
pub mod progress;
pub mod runner;
pub mod source;
pub mod stat_metrics;
pub mod teams;
