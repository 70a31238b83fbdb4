// Cached AI health status with liveness testing and subscribers

pub mod monitor;
pub mod status;

use std::sync::Arc;

use async_trait::async_trait;

pub use monitor::{HealthMonitor, MonitorSettings, StatusListener, Subscription};
pub use status::{HealthErrorKind, HealthStatus};

/// Where the invoker reads health from
#[async_trait]
pub trait HealthSource: Send + Sync {
    /// Last known snapshot, no I/O
    fn status(&self) -> Arc<HealthStatus>;

    /// Run a fresh check and return its snapshot
    async fn refresh(&self) -> Arc<HealthStatus>;
}
