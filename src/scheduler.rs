//! Decides when the next prompt appears.
//!
//! The scheduler is polled with the playback clock's elapsed time, many times
//! per interval. It fires at most once per interval index
//! `floor(elapsed / seconds_per_interval)` and never for index 0, so the first
//! prompt lands on the first boundary after `frequency` bars have played.
//!
//! When the poll cadence jumps over several boundaries at once only the interval
//! being entered fires; skipped boundaries are not replayed.

use crate::timing::{Bpm, Frequency, PromptIntervalConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerPhase {
    /// Reset, or no boundary reached yet.
    Idle,
    /// At least one prompt has fired since the last reset.
    Armed,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct LastFire {
    index: u64,
    at: f64,
}

#[derive(Debug, Clone)]
pub struct PromptScheduler {
    config: PromptIntervalConfig,
    last_fire: Option<LastFire>,
}

impl PromptScheduler {
    pub fn new(bpm: Bpm, frequency: Frequency) -> Self {
        Self::from_config(PromptIntervalConfig::new(bpm, frequency))
    }

    pub fn from_config(config: PromptIntervalConfig) -> Self {
        Self {
            config,
            last_fire: None,
        }
    }

    pub fn config(&self) -> PromptIntervalConfig {
        self.config
    }

    /// Changes tempo without forgetting which interval already fired.
    pub fn set_bpm(&mut self, bpm: Bpm) {
        self.config.bpm = bpm;
        self.rebase();
    }

    /// Changes prompt spacing without forgetting which interval already fired.
    pub fn set_frequency(&mut self, frequency: Frequency) {
        self.config.frequency = frequency;
        self.rebase();
    }

    // Re-derive the fired index on the new grid from when it fired, so the
    // interval holding the last prompt is not considered new.
    fn rebase(&mut self) {
        let config = self.config;
        if let Some(fire) = self.last_fire.as_mut() {
            fire.index = config.interval_index(fire.at);
        }
    }

    /// Seconds between prompts at the current settings.
    pub fn interval(&self) -> f64 {
        self.config.seconds_per_interval()
    }

    pub fn phase(&self) -> SchedulerPhase {
        match self.last_fire {
            Some(_) => SchedulerPhase::Armed,
            None => SchedulerPhase::Idle,
        }
    }

    /// Interval index of the last prompt, or -1 when idle.
    pub fn last_fired_index(&self) -> i64 {
        self.last_fire.map_or(-1, |f| f.index as i64)
    }

    pub fn reset(&mut self) {
        self.last_fire = None;
    }

    /// Fires if `elapsed` has entered an interval that has not fired yet.
    ///
    /// On a fire `supply` is called once and its result returned in `Some`;
    /// otherwise `supply` is not called and `None` is returned. `elapsed` must be
    /// finite and non-negative. A backward jump never refires an interval.
    pub fn check_and_trigger<T, F>(&mut self, elapsed: f64, supply: F) -> Option<T>
    where
        F: FnOnce() -> T,
    {
        let idx = self.config.interval_index(elapsed);
        if idx == 0 {
            return None;
        }

        if self.last_fire.is_some_and(|f| idx <= f.index) {
            return None;
        }

        self.last_fire = Some(LastFire {
            index: idx,
            at: elapsed,
        });
        Some(supply())
    }

    /// [`check_and_trigger`](Self::check_and_trigger) without a payload.
    pub fn check(&mut self, elapsed: f64) -> bool {
        self.check_and_trigger(elapsed, || ()).is_some()
    }
}
