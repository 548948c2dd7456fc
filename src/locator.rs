//! Cosmetic locator. It animates a progress bar and then reports a fixed
//! placeholder position; no lookup happens.

use std::time::Duration;

use tracing::debug;

pub const LOCATOR_STEPS: u32 = 100;
pub const DEFAULT_STEP_DELAY: Duration = Duration::from_millis(50);
pub const PLACEHOLDER_COORDINATES: &str = "long:000,lat:000";

#[derive(Debug, Clone)]
pub struct Locator {
    steps: u32,
    step_delay: Duration,
}

impl Locator {
    pub fn new(step_delay: Duration) -> Self {
        Self {
            steps: LOCATOR_STEPS,
            step_delay,
        }
    }

    /// Calls `on_step(step, total)` after each delay. An empty query does nothing.
    pub async fn locate<F>(&self, query: &str, mut on_step: F) -> Option<&'static str>
    where
        F: FnMut(u32, u32),
    {
        if query.is_empty() {
            return None;
        }
        debug!(query, steps = self.steps, "Locator started");
        for step in 1..=self.steps {
            tokio::time::sleep(self.step_delay).await;
            on_step(step, self.steps);
        }
        Some(PLACEHOLDER_COORDINATES)
    }
}
