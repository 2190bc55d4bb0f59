use serde::{Deserialize, Serialize};
use time::Duration;

/// Unit a rotation window is measured in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowUnit {
    /// Window length counted in hours.
    Hour,
    /// Window length counted in days.
    Day,
}

/// The span of time a writer appends to one live file before rotating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotationWindow {
    /// Unit of the window.
    pub unit: WindowUnit,
    /// Positive multiplier of the unit.
    pub interval: u32,
}

impl RotationWindow {
    /// Create a window of `interval` units. A zero interval is clamped to 1.
    pub fn new(unit: WindowUnit, interval: u32) -> Self {
        Self {
            unit,
            interval: interval.max(1),
        }
    }

    /// One-hour window, the default for structured log files.
    pub fn hourly() -> Self {
        Self::new(WindowUnit::Hour, 1)
    }

    /// One-day window, the default for captured raw streams.
    pub fn daily() -> Self {
        Self::new(WindowUnit::Day, 1)
    }

    /// Length of the window as a duration.
    pub fn length(&self) -> Duration {
        match self.unit {
            WindowUnit::Hour => Duration::hours(i64::from(self.interval)),
            WindowUnit::Day => Duration::days(i64::from(self.interval)),
        }
    }
}

/// How many dated archive directories to keep, and whether completed
/// windows are packed into gzip archives. Carries no behavior of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionPolicy {
    /// Maximum number of dated archive directories to keep under the
    /// writer's root.
    pub max_days: usize,
    /// When true, a completed window's file is replaced by a `.gz` archive.
    pub compress: bool,
}

impl RetentionPolicy {
    pub fn new(max_days: usize, compress: bool) -> Self {
        Self { max_days, compress }
    }
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            max_days: 7,
            compress: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_lengths() {
        assert_eq!(RotationWindow::hourly().length(), Duration::hours(1));
        assert_eq!(RotationWindow::daily().length(), Duration::days(1));
        assert_eq!(
            RotationWindow::new(WindowUnit::Hour, 6).length(),
            Duration::hours(6)
        );
        assert_eq!(
            RotationWindow::new(WindowUnit::Day, 3).length(),
            Duration::days(3)
        );
    }

    #[test]
    fn test_zero_interval_clamped() {
        let window = RotationWindow::new(WindowUnit::Hour, 0);
        assert_eq!(window.interval, 1);
        assert_eq!(window.length(), Duration::hours(1));
    }

    #[test]
    fn test_retention_policy_default() {
        let policy = RetentionPolicy::default();
        assert_eq!(policy.max_days, 7);
        assert!(policy.compress);
    }

    #[test]
    fn test_window_deserialize() {
        let yaml = r#"
unit: day
interval: 2
"#;
        let window: RotationWindow = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(window, RotationWindow::new(WindowUnit::Day, 2));
    }
}
