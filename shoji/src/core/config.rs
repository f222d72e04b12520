use std::time::Duration;

/// Engine settings, built from CLI flags when the daemon starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub new_window_detection_debounce_ms: u64,
    /// `0` waits for the detection task without a deadline.
    pub new_window_detection_timeout_ms: u64,
    pub tray_enabled: bool,
    /// `0` disables the idle tick.
    pub poll_interval_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            new_window_detection_debounce_ms: 100,
            new_window_detection_timeout_ms: 100,
            tray_enabled: true,
            poll_interval_ms: 1000,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn debounce_delay(&self) -> Duration {
        Duration::from_millis(self.new_window_detection_debounce_ms)
    }

    pub fn detection_timeout(&self) -> Option<Duration> {
        match self.new_window_detection_timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }

    pub fn poll_interval(&self) -> Option<Duration> {
        match self.poll_interval_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }
}
