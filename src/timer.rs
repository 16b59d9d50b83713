use std::time::{Duration, Instant};

/// Wall-clock timing of pipeline stages, reported through `tracing`
pub struct StageTimer {
    start_time: Instant,
    last_lap: Instant,
}

impl Default for StageTimer {
    fn default() -> Self {
        Self::start()
    }
}

impl StageTimer {
    pub fn start() -> Self {
        let now = Instant::now();
        Self {
            start_time: now,
            last_lap: now,
        }
    }

    /// Log and return the time since the previous lap
    pub fn lap(&mut self, message: &str) -> Duration {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_lap);
        self.last_lap = now;
        tracing::info!("{}: {:.3}s", message, elapsed.as_secs_f64());
        elapsed
    }

    /// Log and return the time since the timer started
    pub fn total(&self, message: &str) -> Duration {
        let elapsed = self.start_time.elapsed();
        tracing::info!("{}: {:.3}s", message, elapsed.as_secs_f64());
        elapsed
    }
}
