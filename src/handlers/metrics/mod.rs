pub mod sync_metrics;
pub mod import_provider;
pub mod get_metrics;
pub mod connected_sources;
