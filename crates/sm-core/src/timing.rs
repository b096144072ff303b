//! Lightweight wall-clock timing reported through `tracing`.

use std::time::Instant;

/// A simple timer that measures elapsed time.
pub struct Timer {
    label: &'static str,
    start: Instant,
}

impl Timer {
    /// Create and start a new timer with the given label.
    pub fn start(label: &'static str) -> Self {
        Self {
            label,
            start: Instant::now(),
        }
    }

    /// Elapsed wall time in seconds.
    pub fn elapsed_s(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }

    /// Stop the timer, emit a debug event and return the elapsed seconds.
    pub fn stop(self) -> f64 {
        let elapsed = self.elapsed_s();
        tracing::debug!(label = self.label, elapsed_s = elapsed, "timer stopped");
        elapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timer_is_monotonic() {
        let timer = Timer::start("test");
        let first = timer.elapsed_s();
        let second = timer.elapsed_s();
        assert!(second >= first);
        assert!(timer.stop() >= second);
    }
}
