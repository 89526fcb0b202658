// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wall-clock rendering.
//!
//! All conversions go through `chrono`, which resolves the local offset per call
//! and keeps its state on the stack, so these functions are safe to call from any
//! thread concurrently.
//!
//! Conversion never fails from the caller's point of view: a time that cannot be
//! expressed in the local zone is rendered in UTC, and a time that cannot be
//! expressed at all is rendered as [`FALLBACK_TIME_OF_DAY`].

use chrono::{DateTime, Local, TimeZone, Utc};
use std::time::{SystemTime, UNIX_EPOCH};

/// Rendered in place of a timestamp that no calendar conversion accepts.
pub const FALLBACK_TIME_OF_DAY: &str = "00:00:00.000";

const TIME_OF_DAY_FORMAT: &str = "%H:%M:%S%.3f";
const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S (%Z)";

fn epoch_millis(time: SystemTime) -> Option<i64> {
    match time.duration_since(UNIX_EPOCH) {
        Ok(after) => i64::try_from(after.as_millis()).ok(),
        Err(before) => i64::try_from(before.duration().as_millis())
            .ok()
            .map(|ms| -ms),
    }
}

fn render(time: SystemTime, format: &str) -> Option<String> {
    let ms = epoch_millis(time)?;
    if let Some(local) = Local.timestamp_millis_opt(ms).earliest() {
        return Some(local.format(format).to_string());
    }
    DateTime::<Utc>::from_timestamp_millis(ms).map(|utc| utc.format(format).to_string())
}

/// Renders `time` as `HH:MM:SS.mmm` in the local time zone.
pub fn format_time_of_day(time: SystemTime) -> String {
    render(time, TIME_OF_DAY_FORMAT).unwrap_or_else(|| FALLBACK_TIME_OF_DAY.to_string())
}

/// Renders `time` as `YYYY-MM-DD HH:MM:SS (offset)`, used by the startup banner.
pub fn format_date_time(time: SystemTime) -> String {
    render(time, DATE_TIME_FORMAT).unwrap_or_else(|| "unknown date".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn time_of_day_has_millisecond_resolution() {
        let time = UNIX_EPOCH + Duration::from_millis(1_684_666_544_792);
        let rendered = format_time_of_day(time);
        assert_eq!(rendered.len(), 12, "{rendered}");
        assert!(rendered.ends_with(".792"), "{rendered}");
        assert_eq!(&rendered[2..3], ":");
        assert_eq!(&rendered[5..6], ":");
    }

    #[test]
    fn pre_epoch_times_still_render() {
        let time = UNIX_EPOCH - Duration::from_millis(1_500);
        let rendered = format_time_of_day(time);
        assert!(rendered.ends_with(".500"), "{rendered}");
    }

    #[test]
    fn unrepresentable_times_fall_back() {
        let Some(time) = UNIX_EPOCH.checked_add(Duration::from_secs(1 << 60)) else {
            // platform clock cannot even hold the value
            return;
        };
        assert_eq!(format_time_of_day(time), FALLBACK_TIME_OF_DAY);
        assert_eq!(format_date_time(time), "unknown date");
    }
}
