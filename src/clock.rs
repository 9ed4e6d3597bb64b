use std::time::{Duration, Instant};

/// Source of elapsed playback time.
///
/// Elapsed seconds never decrease while playing, freeze while paused and
/// return to zero on stop.
pub trait PlaybackClock {
    fn elapsed(&self) -> f64;
    fn play(&mut self);
    fn pause(&mut self);
    fn stop(&mut self);
    fn is_playing(&self) -> bool;
}

/// Monotonic wall-clock stand-in for a beat player.
#[derive(Debug, Clone, Default)]
pub struct WallClock {
    accumulated: Duration,
    started: Option<Instant>,
}

impl WallClock {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PlaybackClock for WallClock {
    fn elapsed(&self) -> f64 {
        let running = self.started.map(|s| s.elapsed()).unwrap_or_default();
        (self.accumulated + running).as_secs_f64()
    }

    fn play(&mut self) {
        if self.started.is_none() {
            self.started = Some(Instant::now());
        }
    }

    fn pause(&mut self) {
        if let Some(started) = self.started.take() {
            self.accumulated += started.elapsed();
        }
    }

    fn stop(&mut self) {
        self.started = None;
        self.accumulated = Duration::ZERO;
    }

    fn is_playing(&self) -> bool {
        self.started.is_some()
    }
}

/// Hand-driven clock for tests and headless runs.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    elapsed: f64,
    playing: bool,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves time forward; ignored while not playing.
    pub fn advance(&mut self, secs: f64) {
        if self.playing {
            self.elapsed += secs;
        }
    }

    pub fn set(&mut self, secs: f64) {
        self.elapsed = secs;
    }
}

impl PlaybackClock for ManualClock {
    fn elapsed(&self) -> f64 {
        self.elapsed
    }

    fn play(&mut self) {
        self.playing = true;
    }

    fn pause(&mut self) {
        self.playing = false;
    }

    fn stop(&mut self) {
        self.playing = false;
        self.elapsed = 0.0;
    }

    fn is_playing(&self) -> bool {
        self.playing
    }
}
