use std::process::Command;

use crate::core::FixedHz;

/// Seconds between memory reports
pub const MEMORY_LOG_INTERVAL: f32 = 2.0;

/// Periodic free-memory report, for watching buffer growth on small boards
#[derive(Debug, Clone)]
pub struct MemoryLog {
    timer: FixedHz,
    command: String,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self {
            timer: FixedHz::every(MEMORY_LOG_INTERVAL),
            command: "free".to_string(),
        }
    }

    /// Advance the timer; logs when due. `recording_for` is the time since
    /// recording was last toggled.
    pub fn tick(&mut self, delta: f32, recording_for: f32, buffered_bytes: usize) -> bool {
        if !self.timer.tick(delta) {
            return false;
        }

        match self.free_memory() {
            Some(report) => log::info!("{}", report.trim_end()),
            None => log::debug!("Free memory report unavailable"),
        }
        log::info!(
            "Time elapsed recording: {:.1}s, buffered {:.1} MiB",
            recording_for,
            buffered_bytes as f64 / (1024.0 * 1024.0)
        );
        true
    }

    /// Output of `free -h`
    fn free_memory(&self) -> Option<String> {
        let output = Command::new(&self.command).arg("-h").output().ok()?;
        output
            .status
            .success()
            .then(|| String::from_utf8_lossy(&output.stdout).to_string())
    }
}

impl Default for MemoryLog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reports_every_interval() {
        let mut log = MemoryLog {
            timer: FixedHz::every(2.0),
            command: "definitely-not-a-command".to_string(),
        };

        assert!(!log.tick(1.0, 0.0, 0));
        assert!(log.tick(1.0, 0.0, 0));
        assert!(!log.tick(1.5, 0.0, 0));
        assert!(log.tick(0.5, 0.0, 0));
    }

    #[test]
    fn test_missing_command_is_absorbed() {
        let log = MemoryLog {
            timer: FixedHz::every(2.0),
            command: "definitely-not-a-command".to_string(),
        };
        assert!(log.free_memory().is_none());
    }
}
