//! Display helpers for countdown labels
//!
//! Formatting and urgency mapping used by whatever renders the countdown.
//! The countdown itself never consults these.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Format seconds as zero-padded `MM:SS`; minutes grow past 59 without rolling into hours.
pub fn format_mm_ss(total_seconds: u64) -> String {
    let minutes = total_seconds / 60;
    let seconds = total_seconds % 60;
    format!("{minutes:02}:{seconds:02}")
}

/// Visual urgency of a countdown label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Urgency {
    Normal,
    Warning,
    Danger,
}

impl Urgency {
    /// Map the remaining fraction of a countdown to an urgency level.
    ///
    /// At or below one third remaining is `Danger`, at or below two thirds is
    /// `Warning`. A zero-length countdown has nothing left and is `Danger`.
    pub fn from_remaining(remaining_seconds: u64, duration_seconds: u64) -> Self {
        if duration_seconds == 0 {
            return Urgency::Danger;
        }

        // remaining / duration <= 1/3, compared without floating point
        let remaining = u128::from(remaining_seconds);
        let duration = u128::from(duration_seconds);
        if remaining * 3 <= duration {
            Urgency::Danger
        } else if remaining * 3 <= duration * 2 {
            Urgency::Warning
        } else {
            Urgency::Normal
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_mm_ss() {
        assert_eq!(format_mm_ss(0), "00:00");
        assert_eq!(format_mm_ss(9), "00:09");
        assert_eq!(format_mm_ss(65), "01:05");
        assert_eq!(format_mm_ss(900), "15:00");
    }

    #[test]
    fn test_format_has_no_hour_rollover() {
        assert_eq!(format_mm_ss(3600), "60:00");
        assert_eq!(format_mm_ss(6001), "100:01");
    }

    #[test]
    fn test_urgency_bands() {
        assert_eq!(Urgency::from_remaining(900, 900), Urgency::Normal);
        assert_eq!(Urgency::from_remaining(601, 900), Urgency::Normal);
        assert_eq!(Urgency::from_remaining(600, 900), Urgency::Warning);
        assert_eq!(Urgency::from_remaining(301, 900), Urgency::Warning);
        assert_eq!(Urgency::from_remaining(300, 900), Urgency::Danger);
        assert_eq!(Urgency::from_remaining(0, 900), Urgency::Danger);
    }

    #[test]
    fn test_urgency_zero_duration() {
        assert_eq!(Urgency::from_remaining(0, 0), Urgency::Danger);
    }

    #[test]
    fn test_urgency_display() {
        assert_eq!(Urgency::Warning.to_string(), "warning");
        assert_eq!("danger".parse::<Urgency>().unwrap(), Urgency::Danger);
    }
}
