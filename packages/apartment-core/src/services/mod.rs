//! Application services layer.
//!
//! Long-running tasks that orchestrate the registry in the background.

pub mod refresh_monitor;

pub use refresh_monitor::RefreshMonitor;
