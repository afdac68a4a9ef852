use std::time::{Duration, Instant};

/// Monotonic clock with precise sleeps and frame-time bookkeeping
pub trait Timer {
    /// Time since the timer was created
    fn now(&self) -> Duration;
    fn elapsed(&self, since: Duration) -> Duration {
        self.now().saturating_sub(since)
    }
    fn sleep(&self, d: Duration);
    fn record_frame(&mut self, d: Duration);
    fn frame_stats(&self) -> FrameStats;
    fn frame_count(&self) -> usize;

    /// Sleeps out the rest of a frame that started at `frame_start`
    fn pace(&self, frame_start: Duration, frame_interval: Duration) {
        let spent = self.elapsed(frame_start);
        if spent < frame_interval {
            self.sleep(frame_interval - spent);
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameStats {
    pub average_frame_time_ns: f64,
    /// Standard deviation of frame times
    pub jitter_ns: f64,
    pub min_frame_time_ns: f64,
    pub max_frame_time_ns: f64,
    pub effective_fps: f64,
}

impl FrameStats {
    pub fn from_samples(samples: &[Duration]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }
        let times: Vec<f64> = samples.iter().map(|d| d.as_nanos() as f64).collect();
        let avg = times.iter().sum::<f64>() / times.len() as f64;
        let var = times.iter().map(|x| (x - avg).powi(2)).sum::<f64>() / times.len() as f64;
        let min = times.iter().copied().fold(f64::INFINITY, f64::min);
        let max = times.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        FrameStats {
            average_frame_time_ns: avg,
            jitter_ns: var.sqrt(),
            min_frame_time_ns: min,
            max_frame_time_ns: max,
            effective_fps: if avg > 0.0 { 1e9 / avg } else { 0.0 },
        }
    }
}

#[derive(Debug, Clone)]
pub struct HighPrecisionTimer {
    start: Instant,
    frame_times: Vec<Duration>,
    max_samples: usize,
}

impl Timer for HighPrecisionTimer {
    fn now(&self) -> Duration {
        self.start.elapsed()
    }

    fn sleep(&self, d: Duration) {
        self.high_precision_sleep(d)
    }

    fn record_frame(&mut self, d: Duration) {
        if self.frame_times.len() >= self.max_samples {
            self.frame_times.remove(0);
        }
        self.frame_times.push(d);
    }

    fn frame_stats(&self) -> FrameStats {
        FrameStats::from_samples(&self.frame_times)
    }

    fn frame_count(&self) -> usize {
        self.frame_times.len()
    }
}

impl HighPrecisionTimer {
    pub fn new() -> Self {
        Self::with_capacity(1000)
    }

    /// Keeps at most `max_samples` of the most recent frame times
    pub fn with_capacity(max_samples: usize) -> Self {
        Self {
            start: Instant::now(),
            frame_times: Vec::with_capacity(max_samples),
            max_samples: max_samples.max(1),
        }
    }

    pub fn high_precision_sleep(&self, duration: Duration) {
        if duration.is_zero() {
            return;
        }
        #[cfg(target_os = "linux")]
        self.linux_sleep(duration);
        #[cfg(not(target_os = "linux"))]
        std::thread::sleep(duration);
    }

    #[cfg(target_os = "linux")]
    fn linux_sleep(&self, duration: Duration) {
        use libc::{clock_nanosleep, timespec, CLOCK_MONOTONIC};

        let req = timespec {
            tv_sec: duration.as_secs() as libc::time_t,
            tv_nsec: duration.subsec_nanos() as libc::c_long,
        };

        let rc = unsafe { clock_nanosleep(CLOCK_MONOTONIC, 0, &req, std::ptr::null_mut()) };
        if rc != 0 {
            tracing::debug!(rc, "clock_nanosleep interrupted, falling back to thread::sleep");
            std::thread::sleep(duration);
        }
    }
}

impl Default for HighPrecisionTimer {
    fn default() -> Self {
        Self::new()
    }
}
