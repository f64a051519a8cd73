// Domain layer - Dashboard data shapes and pure aggregation rules
pub mod device;
pub mod metrics;
pub mod snapshot;
