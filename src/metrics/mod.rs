//! Prometheus exposition model.

mod exporter;
mod process;

pub use exporter::Exporter;
pub use process::register_master_process_collector;

/// Namespace prefixed to every exported metric.
pub const NAMESPACE: &str = "phpfpm";
