use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tracing::{info, instrument};

use super::registry::RoomRegistry;

/// Configuration for the periodic room sweep
#[derive(Debug, Clone)]
pub struct SweepConfig {
    /// How often the sweep runs
    pub sweep_interval: Duration,
    /// How long a room may sit without subscribers before disposal
    pub empty_room_grace: Duration,
    /// How long a disconnected player's identity is preserved
    pub player_grace: Duration,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            sweep_interval: Duration::from_secs(60),
            empty_room_grace: Duration::from_secs(30 * 60),
            player_grace: Duration::from_secs(30 * 60),
        }
    }
}

/// Starts the background task that periodically evicts timed-out players and
/// disposes abandoned rooms
#[instrument(skip(registry))]
pub async fn start_sweep_task(registry: Arc<RoomRegistry>, config: SweepConfig) {
    info!(
        sweep_interval_secs = config.sweep_interval.as_secs(),
        empty_room_grace_secs = config.empty_room_grace.as_secs(),
        player_grace_secs = config.player_grace.as_secs(),
        "Starting room sweep background task"
    );

    let mut sweep_interval = interval(config.sweep_interval);

    loop {
        sweep_interval.tick().await;

        let disposed = registry.sweep(config.empty_room_grace, config.player_grace);
        if disposed > 0 {
            info!(disposed_count = disposed, "Room sweep completed");
        }
    }
}
