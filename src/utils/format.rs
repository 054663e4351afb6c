//! Duration formatting for timer displays

use serde::{Deserialize, Serialize};

/// Display style for remaining time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatStyle {
    /// `HH:MM:SS`, every field zero padded
    #[default]
    Clock,
    /// `1h 2m 3s`
    Words,
}

/// Format a number of seconds for display
pub fn format_remaining(total_seconds: u64, style: FormatStyle) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    match style {
        FormatStyle::Clock => format!("{:02}:{:02}:{:02}", hours, minutes, seconds),
        FormatStyle::Words => format!("{}h {}m {}s", hours, minutes, seconds),
    }
}

/// Combine hour/minute/second form fields into seconds
pub fn total_seconds_from_parts(hours: u64, minutes: u64, seconds: u64) -> u64 {
    hours
        .saturating_mul(3600)
        .saturating_add(minutes.saturating_mul(60))
        .saturating_add(seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_style() {
        assert_eq!(format_remaining(3661, FormatStyle::Clock), "01:01:01");
        assert_eq!(format_remaining(0, FormatStyle::Clock), "00:00:00");
        assert_eq!(format_remaining(59, FormatStyle::Clock), "00:00:59");
        assert_eq!(format_remaining(360_000, FormatStyle::Clock), "100:00:00");
    }

    #[test]
    fn words_style() {
        assert_eq!(format_remaining(3661, FormatStyle::Words), "1h 1m 1s");
        assert_eq!(format_remaining(90, FormatStyle::Words), "0h 1m 30s");
    }

    #[test]
    fn parts_combine() {
        assert_eq!(total_seconds_from_parts(1, 1, 1), 3661);
        assert_eq!(total_seconds_from_parts(0, 0, 0), 0);
        assert_eq!(total_seconds_from_parts(0, 90, 0), 5400);
    }
}
