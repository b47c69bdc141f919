//! Runs the snapshot debounce on a tokio timer so callers do not have to
//! call `tick` themselves.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use snaapmap_core::debounce::Clock;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::controller::MindMapController;

pub type SharedController = Arc<Mutex<MindMapController>>;

/// Clock backed by tokio's time source, so it follows a paused or advanced
/// runtime clock in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

impl Clock for TokioClock {
    fn now(&self) -> Instant {
        tokio::time::Instant::now().into_std()
    }
}

/// Poll the controller's pending snapshot every `period`. The task ends when
/// the controller lock is poisoned; otherwise it runs until aborted.
pub fn spawn_snapshot_driver(controller: SharedController, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period.max(Duration::from_millis(1)));
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            let Ok(mut guard) = controller.lock() else {
                tracing::error!("controller lock poisoned, stopping snapshot driver");
                break;
            };
            guard.tick();
        }
    })
}
