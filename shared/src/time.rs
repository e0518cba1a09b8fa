use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

pub const SECONDS_PER_DAY: u32 = 86_400;

/// Date format of the `start_date` request field and of `<input type="date">` values.
pub const DATE_FORMAT: &str = "%Y-%m-%d";
/// Format of the `end_time` request field.
pub const REQUEST_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
/// Format of the current-time readout.
pub const DISPLAY_DATETIME_FORMAT: &str = "%d-%m-%Y %H:%M:%S";

/// The date/time range whose trajectories are requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start_date: Option<NaiveDate>,
    pub end_date: NaiveDate,
    /// Seconds since midnight, always in `[0, SECONDS_PER_DAY)`.
    pub end_time_of_day: u32,
}

impl TimeWindow {
    pub fn new(start_date: Option<NaiveDate>, end_date: NaiveDate, end_time_of_day: u32) -> Self {
        Self {
            start_date,
            end_date,
            end_time_of_day: end_time_of_day % SECONDS_PER_DAY,
        }
    }

    pub fn end_datetime(&self) -> NaiveDateTime {
        let time = NaiveTime::from_num_seconds_from_midnight_opt(
            self.end_time_of_day % SECONDS_PER_DAY,
            0,
        )
        .unwrap_or_default();
        self.end_date.and_time(time)
    }

    /// `YYYY-MM-DD HH:MM:SS`, as sent in `end_time`.
    pub fn request_end_time(&self) -> String {
        self.end_datetime()
            .format(REQUEST_DATETIME_FORMAT)
            .to_string()
    }

    pub fn request_start_date(&self) -> Option<String> {
        self.start_date
            .map(|date| date.format(DATE_FORMAT).to_string())
    }

    /// `DD-MM-YYYY HH:MM:SS`, as shown next to the slider.
    pub fn display_string(&self) -> String {
        self.end_datetime()
            .format(DISPLAY_DATETIME_FORMAT)
            .to_string()
    }
}

/// Parse a `YYYY-MM-DD` date. Surrounding whitespace is ignored.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).ok()
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn parse_request_datetime(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw.trim(), REQUEST_DATETIME_FORMAT).ok()
}

/// Format seconds-of-day as `HH:MM:SS`.
pub fn format_time_of_day(seconds: u32) -> String {
    let seconds = seconds % SECONDS_PER_DAY;
    format!(
        "{:02}:{:02}:{:02}",
        seconds / 3600,
        (seconds % 3600) / 60,
        seconds % 60
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn request_and_display_formats() {
        let window = TimeWindow::new(Some(date(2023, 12, 30)), date(2024, 1, 2), 3600 * 13 + 61);
        assert_eq!(window.request_end_time(), "2024-01-02 13:01:01");
        assert_eq!(window.display_string(), "02-01-2024 13:01:01");
        assert_eq!(window.request_start_date().as_deref(), Some("2023-12-30"));
    }

    #[test]
    fn midnight_renders_as_zero() {
        let window = TimeWindow::new(None, date(2024, 1, 1), 0);
        assert_eq!(window.request_end_time(), "2024-01-01 00:00:00");
        assert_eq!(window.request_start_date(), None);
    }

    #[test]
    fn new_keeps_time_of_day_inside_one_day() {
        let window = TimeWindow::new(None, date(2024, 1, 1), SECONDS_PER_DAY + 5);
        assert_eq!(window.end_time_of_day, 5);
    }

    #[test]
    fn parse_date_accepts_input_element_values() {
        assert_eq!(parse_date(" 2024-02-29 "), Some(date(2024, 2, 29)));
        assert_eq!(parse_date("2023-02-29"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn parse_request_datetime_matches_request_format() {
        let window = TimeWindow::new(None, date(2024, 6, 1), 7 * 3600);
        let parsed = parse_request_datetime(&window.request_end_time()).expect("parse");
        assert_eq!(parsed, window.end_datetime());
        assert!(parse_request_datetime("2024-06-01T07:00:00").is_none());
    }

    #[test]
    fn format_time_of_day_pads_fields() {
        assert_eq!(format_time_of_day(0), "00:00:00");
        assert_eq!(format_time_of_day(22 * 3600 + 5 * 60 + 9), "22:05:09");
        assert_eq!(format_time_of_day(SECONDS_PER_DAY - 1), "23:59:59");
    }
}
