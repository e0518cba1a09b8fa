/// Playback state machine: stopped/running, speed level, and the outstanding-tick gate.
///
/// The engine never owns a timer. It answers "may a tick run now, and with which
/// step" and "should the next tick be scheduled", so the caller can drive it from a
/// real timeout or synchronously from a test.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackEngine {
    speeds: &'static [u32],
    speed_index: usize,
    running: bool,
    tick_outstanding: bool,
    last_tick_ms: Option<f64>,
}

impl PlaybackEngine {
    pub fn new(speeds: &'static [u32], speed_index: usize) -> Self {
        Self {
            speeds,
            speed_index: speed_index.min(speeds.len().saturating_sub(1)),
            running: false,
            tick_outstanding: false,
            last_tick_ms: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn speed_index(&self) -> usize {
        self.speed_index
    }

    pub fn step_secs(&self) -> u32 {
        self.speeds.get(self.speed_index).copied().unwrap_or(0)
    }

    pub fn can_go_faster(&self) -> bool {
        self.speed_index + 1 < self.speeds.len()
    }

    pub fn can_go_slower(&self) -> bool {
        self.speed_index > 0
    }

    /// A tick's request has been issued and not yet settled.
    pub fn tick_outstanding(&self) -> bool {
        self.tick_outstanding
    }

    pub fn last_tick_ms(&self) -> Option<f64> {
        self.last_tick_ms
    }

    /// STOPPED -> RUNNING. Returns false if already running.
    pub fn start(&mut self) -> bool {
        if self.running {
            return false;
        }
        self.running = true;
        true
    }

    /// RUNNING -> STOPPED. An outstanding tick still has to settle.
    pub fn stop(&mut self) -> bool {
        if !self.running {
            return false;
        }
        self.running = false;
        true
    }

    pub fn faster(&mut self) -> bool {
        if !self.can_go_faster() {
            return false;
        }
        self.speed_index += 1;
        true
    }

    pub fn slower(&mut self) -> bool {
        if !self.can_go_slower() {
            return false;
        }
        self.speed_index -= 1;
        true
    }

    /// Claim the tick slot. Returns the step to advance by, or `None` while stopped or
    /// while a previous tick is still outstanding.
    pub fn begin_tick(&mut self, now_ms: f64) -> Option<u32> {
        if !self.running || self.tick_outstanding {
            return None;
        }
        self.tick_outstanding = true;
        self.last_tick_ms = Some(now_ms);
        Some(self.step_secs())
    }

    /// Release the tick slot. Returns whether the next tick should be scheduled.
    pub fn finish_tick(&mut self) -> bool {
        self.tick_outstanding = false;
        self.running
    }

    /// Step size rendered for the speed readout, e.g. `1h/tick`.
    pub fn speed_label(&self) -> String {
        let step = self.step_secs();
        if step > 0 && step % 3600 == 0 {
            format!("{}h/tick", step / 3600)
        } else if step > 0 && step % 60 == 0 {
            format!("{}m/tick", step / 60)
        } else {
            format!("{step}s/tick")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPEEDS: &[u32] = &[900, 1800, 3600, 7200, 21_600];

    #[test]
    fn speed_index_is_clamped_at_both_ends() {
        let mut engine = PlaybackEngine::new(SPEEDS, 2);
        assert!(engine.faster());
        assert!(engine.faster());
        assert!(!engine.faster());
        assert_eq!(engine.speed_index(), 4);
        for _ in 0..10 {
            engine.slower();
        }
        assert_eq!(engine.speed_index(), 0);
        assert!(!engine.can_go_slower());
    }

    #[test]
    fn out_of_range_default_is_clamped() {
        let engine = PlaybackEngine::new(SPEEDS, 99);
        assert_eq!(engine.speed_index(), SPEEDS.len() - 1);
    }

    #[test]
    fn ticks_require_running() {
        let mut engine = PlaybackEngine::new(SPEEDS, 2);
        assert_eq!(engine.begin_tick(0.0), None);
        engine.start();
        assert_eq!(engine.begin_tick(5.0), Some(3600));
        assert_eq!(engine.last_tick_ms(), Some(5.0));
    }

    #[test]
    fn only_one_tick_is_outstanding() {
        let mut engine = PlaybackEngine::new(SPEEDS, 2);
        engine.start();
        assert!(engine.begin_tick(0.0).is_some());
        assert_eq!(engine.begin_tick(1.0), None);
        assert!(engine.finish_tick());
        assert!(engine.begin_tick(2.0).is_some());
    }

    #[test]
    fn stopping_mid_tick_suppresses_the_next_schedule() {
        let mut engine = PlaybackEngine::new(SPEEDS, 2);
        engine.start();
        engine.begin_tick(0.0);
        assert!(engine.stop());
        assert!(!engine.finish_tick());
        assert!(!engine.tick_outstanding());
    }

    #[test]
    fn speed_change_applies_to_the_next_tick() {
        let mut engine = PlaybackEngine::new(SPEEDS, 2);
        engine.start();
        assert_eq!(engine.begin_tick(0.0), Some(3600));
        engine.faster();
        engine.finish_tick();
        assert_eq!(engine.begin_tick(1.0), Some(7200));
    }

    #[test]
    fn speed_labels() {
        let mut engine = PlaybackEngine::new(SPEEDS, 0);
        assert_eq!(engine.speed_label(), "15m/tick");
        engine.faster();
        assert_eq!(engine.speed_label(), "30m/tick");
        engine.faster();
        assert_eq!(engine.speed_label(), "1h/tick");
        engine.faster();
        engine.faster();
        assert_eq!(engine.speed_label(), "6h/tick");
    }
}
