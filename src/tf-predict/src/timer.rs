use chrono::{DateTime, Duration, Utc};
use log::{debug, info};

/// Wall-clock timer for one stage of the classification pipeline.
///
/// Stopping a timer logs the elapsed time at `info` level and keeps it around
/// so callers can report it in a [`Classification`](crate::Classification).
pub struct Timer {
    stage: String,
    started: Option<DateTime<Utc>>,
    elapsed: Option<Duration>,
}

impl Timer {
    pub fn new(stage: &str) -> Self {
        Timer {
            stage: stage.to_owned(),
            started: None,
            elapsed: None,
        }
    }

    /// Create a timer that is already running
    pub fn new_start(stage: &str) -> Self {
        let mut t = Timer::new(stage);
        t.start();
        t
    }

    pub fn start(&mut self) {
        debug!("{}: starting", self.stage);

        self.started = Some(Utc::now());
        self.elapsed = None;
    }

    /// Stop the timer and return the elapsed milliseconds.
    pub fn stop(&mut self) -> i64 {
        match self.started.take() {
            None => debug!("{}: not running!", self.stage),
            Some(started) => {
                let d = Utc::now() - started;

                self.elapsed = Some(d);
                info!("{} duration: {} msec", self.stage, d.num_milliseconds());
            }
        }

        self.millis()
    }

    /// Elapsed milliseconds of the last completed run, 0 if never stopped.
    pub fn millis(&self) -> i64 {
        self.elapsed.map_or(0, |d| d.num_milliseconds())
    }
}

#[cfg(test)]
mod tests {
    use super::Timer;

    #[test]
    fn unstarted_timer_reports_zero() {
        let mut t = Timer::new("idle");
        assert_eq!(t.stop(), 0);
        assert_eq!(t.millis(), 0);
    }

    #[test]
    fn stop_ends_the_run() {
        let mut t = Timer::new_start("stage");

        let elapsed = t.stop();
        assert!(elapsed >= 0);
        assert_eq!(t.millis(), elapsed);

        // A second stop has nothing running and keeps the last result.
        assert_eq!(t.stop(), elapsed);
    }
}
