use chrono::{Days, NaiveDate};

use trajview_shared::{SECONDS_PER_DAY, TimeWindow};

/// End-of-window position: a calendar date plus a time of day on the slider grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeCursor {
    start_date: Option<NaiveDate>,
    end_date: NaiveDate,
    time_of_day: u32,
    granularity: u32,
}

impl TimeCursor {
    pub fn new(end_date: NaiveDate, time_of_day: u32, granularity: u32) -> Self {
        let mut cursor = Self {
            start_date: None,
            end_date,
            time_of_day: 0,
            granularity: granularity.clamp(1, SECONDS_PER_DAY),
        };
        cursor.set_time_of_day(time_of_day);
        cursor
    }

    pub fn window(&self) -> TimeWindow {
        TimeWindow::new(self.start_date, self.end_date, self.time_of_day)
    }

    pub fn start_date(&self) -> Option<NaiveDate> {
        self.start_date
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    pub fn time_of_day(&self) -> u32 {
        self.time_of_day
    }

    pub fn granularity(&self) -> u32 {
        self.granularity
    }

    pub fn set_start_date(&mut self, date: Option<NaiveDate>) {
        self.start_date = date;
    }

    pub fn set_end_date(&mut self, date: NaiveDate) {
        self.end_date = date;
    }

    /// Snap down onto the granularity grid, within one day.
    pub fn set_time_of_day(&mut self, seconds: u32) {
        let seconds = seconds.min(SECONDS_PER_DAY - 1);
        self.time_of_day = seconds - seconds % self.granularity;
    }

    /// Move forward by `step_seconds`. Reaching midnight exactly wraps to 0 and moves
    /// the end date forward by one day.
    pub fn advance(&mut self, step_seconds: u32) {
        let total = u64::from(self.time_of_day) + u64::from(step_seconds);
        let day = u64::from(SECONDS_PER_DAY);
        let days = total / day;
        self.time_of_day = (total % day) as u32;
        if days > 0 {
            self.end_date = self
                .end_date
                .checked_add_days(Days::new(days))
                .unwrap_or(self.end_date);
        }
    }

    pub fn display_string(&self) -> String {
        self.window().display_string()
    }
}
