// Application layer - Snapshot assembly and the refresh cycle
pub mod metrics_source;
pub mod refresh_loop;
pub mod snapshot_service;
