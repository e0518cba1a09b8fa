use chrono::NaiveDate;

/// Dashboard endpoint that forwards to the simplification service.
pub const API_ALGORITHM_PATH: &str = "/api/algorithm";

/// Real-time pause between a settled tick and the next one.
pub const TICK_DELAY_MS: u32 = 1000;

/// Playback step sizes in seconds, slowest first.
pub const SPEED_STEPS_SECS: [u32; 5] = [900, 1800, 3600, 7200, 21_600];
pub const DEFAULT_SPEED_INDEX: usize = 2;

/// Time-of-day slider step. Every playback step is a multiple of it.
pub const SLIDER_GRANULARITY_SECS: u32 = 900;

pub const DEFAULT_END_TIME_OF_DAY: u32 = 0;

pub fn default_end_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default()
}
