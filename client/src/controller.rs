use chrono::NaiveDate;

use trajview_shared::AlgorithmId;

use crate::config;
use crate::coordinator::Submission;
use crate::playback::PlaybackEngine;
use crate::selection::SelectionState;
use crate::time_cursor::TimeCursor;

/// Every user action and the playback timer, as data.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    ToggleAlgorithm { id: AlgorithmId, enabled: bool },
    SetParam { id: AlgorithmId, name: String, value: f64 },
    SetStartDate(Option<NaiveDate>),
    SetEndDate(NaiveDate),
    SetTimeOfDay(u32),
    Play,
    Pause,
    TogglePlay,
    Faster,
    Slower,
    ShowErrors(bool),
    Refresh,
    Tick,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Edit,
    Tick,
}

/// What the outside world has to do after a state transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Submit { request: Submission, origin: Origin },
    /// Nothing in flight may render any more.
    Invalidate,
    ScheduleTick(u32),
    CancelTick,
    ErrorsPanel(bool),
}

/// Owns selection, time cursor and playback, and maps commands to effects.
#[derive(Debug, Clone)]
pub struct Controller {
    selection: SelectionState,
    cursor: TimeCursor,
    playback: PlaybackEngine,
    show_errors: bool,
    tick_delay_ms: u32,
}

impl Default for Controller {
    fn default() -> Self {
        Self::new(
            TimeCursor::new(
                config::default_end_date(),
                config::DEFAULT_END_TIME_OF_DAY,
                config::SLIDER_GRANULARITY_SECS,
            ),
            PlaybackEngine::new(&config::SPEED_STEPS_SECS, config::DEFAULT_SPEED_INDEX),
            config::TICK_DELAY_MS,
        )
    }
}

impl Controller {
    pub fn new(cursor: TimeCursor, playback: PlaybackEngine, tick_delay_ms: u32) -> Self {
        Self {
            selection: SelectionState::default(),
            cursor,
            playback,
            show_errors: false,
            tick_delay_ms,
        }
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn cursor(&self) -> &TimeCursor {
        &self.cursor
    }

    pub fn playback(&self) -> &PlaybackEngine {
        &self.playback
    }

    pub fn show_errors(&self) -> bool {
        self.show_errors
    }

    pub fn dispatch(&mut self, command: Command, now_ms: f64) -> Vec<Effect> {
        match command {
            Command::ToggleAlgorithm { id, enabled } => {
                if !self.selection.set_enabled(id, enabled) {
                    return Vec::new();
                }
                if self.selection.is_empty() {
                    let mut effects = Vec::new();
                    if self.playback.stop() {
                        effects.push(Effect::CancelTick);
                    }
                    effects.push(Effect::Invalidate);
                    return effects;
                }
                self.edit_submit()
            }
            Command::SetParam { id, name, value } => {
                if self.selection.set_param(id, &name, value).is_none()
                    || !self.selection.is_enabled(id)
                {
                    return Vec::new();
                }
                self.edit_submit()
            }
            Command::SetStartDate(date) => {
                self.cursor.set_start_date(date);
                self.edit_submit()
            }
            Command::SetEndDate(date) => {
                self.cursor.set_end_date(date);
                self.edit_submit()
            }
            Command::SetTimeOfDay(seconds) => {
                self.cursor.set_time_of_day(seconds);
                self.edit_submit()
            }
            Command::Play => {
                if !self.selection.controls_enabled() || !self.playback.start() {
                    return Vec::new();
                }
                self.tick(now_ms)
            }
            Command::Pause => {
                if self.playback.stop() {
                    vec![Effect::CancelTick]
                } else {
                    Vec::new()
                }
            }
            Command::TogglePlay => {
                let next = if self.playback.is_running() {
                    Command::Pause
                } else {
                    Command::Play
                };
                self.dispatch(next, now_ms)
            }
            Command::Faster => {
                let changed = self.playback.faster();
                self.speed_changed(changed)
            }
            Command::Slower => {
                let changed = self.playback.slower();
                self.speed_changed(changed)
            }
            Command::ShowErrors(on) => {
                if on == self.show_errors || (on && !self.selection.controls_enabled()) {
                    return Vec::new();
                }
                self.show_errors = on;
                let mut effects = vec![Effect::ErrorsPanel(on)];
                if on {
                    effects.extend(self.edit_submit());
                }
                effects
            }
            Command::Refresh => self.edit_submit(),
            Command::Tick => self.tick(now_ms),
        }
    }

    /// The request a tick issued has resolved, one way or another.
    pub fn tick_settled(&mut self) -> Vec<Effect> {
        if self.playback.finish_tick() {
            vec![Effect::ScheduleTick(self.tick_delay_ms)]
        } else {
            Vec::new()
        }
    }

    /// A new step applies from the next tick; while stopped the edit is shown at once.
    fn speed_changed(&self, changed: bool) -> Vec<Effect> {
        if !changed || self.playback.is_running() {
            return Vec::new();
        }
        self.edit_submit()
    }

    /// Advance, then request. The next tick waits for `tick_settled`.
    fn tick(&mut self, now_ms: f64) -> Vec<Effect> {
        let Some(step) = self.playback.begin_tick(now_ms) else {
            return Vec::new();
        };
        self.cursor.advance(step);
        vec![Effect::Submit {
            request: self.submission(),
            origin: Origin::Tick,
        }]
    }

    fn edit_submit(&self) -> Vec<Effect> {
        if self.selection.is_empty() {
            return Vec::new();
        }
        vec![Effect::Submit {
            request: self.submission(),
            origin: Origin::Edit,
        }]
    }

    fn submission(&self) -> Submission {
        Submission {
            selection: self.selection.snapshot(),
            window: self.cursor.window(),
        }
    }
}
