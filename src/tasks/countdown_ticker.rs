//! Countdown ticker background task

use std::{sync::Arc, time::Duration};

use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::state::AppState;

/// Shared clock period for every timer
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Background task that advances all timers once per tick.
///
/// Remaining time comes from each timer's deadline, so a delayed or
/// skipped tick only delays the display, never the countdown itself.
pub async fn countdown_ticker_task(state: Arc<AppState>) {
    info!("Starting countdown ticker ({:?} period)", TICK_INTERVAL);

    let mut ticker = interval(TICK_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;

        match state.advance() {
            Ok(0) => {}
            Ok(finished) => debug!("{} timers finished this tick", finished),
            Err(e) => error!("Failed to advance timers: {}", e),
        }
    }
}
