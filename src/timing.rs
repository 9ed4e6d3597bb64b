//! Beat timing: converts tempo and bar counts into durations, and answers
//! "where in the bar grid are we" for an elapsed playback time.
//!
//! The free functions take raw numbers and validate them. The value types
//! (`Bpm`, `Frequency`, `PromptIntervalConfig`) carry already-validated settings
//! so the scheduler never has to re-check them.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const SECONDS_PER_MINUTE: f64 = 60.0;
pub const DEFAULT_BEATS_PER_BAR: u32 = 4;
pub const BARS_PER_PHRASE: u32 = 4;
pub const DEFAULT_BEAT_TOLERANCE: f64 = 0.05;

// Slack for elapsed values that are an exact multiple of the interval in
// theory but land a hair below it in floating point.
const BOUNDARY_EPSILON: f64 = 1e-9;

/// Tempo in beats per minute. Always finite and strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Bpm(f64);

impl Bpm {
    pub fn new(bpm: f64) -> Result<Self> {
        if bpm.is_finite() && bpm > 0.0 {
            Ok(Self(bpm))
        } else {
            Err(Error::InvalidArgument(format!("bpm must be > 0, got {bpm}")))
        }
    }

    pub fn get(self) -> f64 {
        self.0
    }

    pub fn seconds_per_beat(self) -> f64 {
        SECONDS_PER_MINUTE / self.0
    }

    pub fn seconds_per_bar(self, beats_per_bar: u32) -> f64 {
        self.seconds_per_beat() * beats_per_bar as f64
    }
}

impl fmt::Display for Bpm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_bpm(self.0))
    }
}

impl TryFrom<f64> for Bpm {
    type Error = Error;

    fn try_from(value: f64) -> Result<Self> {
        Self::new(value)
    }
}

/// How many bars pass between two word prompts.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, strum_macros::Display,
)]
#[serde(try_from = "u32", into = "u32")]
pub enum Frequency {
    #[strum(to_string = "every 4 bars")]
    Four,
    #[default]
    #[strum(to_string = "every 8 bars")]
    Eight,
    #[strum(to_string = "every 16 bars")]
    Sixteen,
}

impl Frequency {
    pub const ALL: [Frequency; 3] = [Frequency::Four, Frequency::Eight, Frequency::Sixteen];

    pub fn bars(self) -> u32 {
        match self {
            Frequency::Four => 4,
            Frequency::Eight => 8,
            Frequency::Sixteen => 16,
        }
    }

    /// Cycles 4 -> 8 -> 16 -> 4.
    pub fn next(self) -> Self {
        match self {
            Frequency::Four => Frequency::Eight,
            Frequency::Eight => Frequency::Sixteen,
            Frequency::Sixteen => Frequency::Four,
        }
    }
}

impl TryFrom<u32> for Frequency {
    type Error = Error;

    fn try_from(bars: u32) -> Result<Self> {
        match bars {
            4 => Ok(Frequency::Four),
            8 => Ok(Frequency::Eight),
            16 => Ok(Frequency::Sixteen),
            other => Err(Error::UnsupportedFrequency(other)),
        }
    }
}

impl From<Frequency> for u32 {
    fn from(f: Frequency) -> Self {
        f.bars()
    }
}

/// Derived timing for a tempo. Recomputed whenever the tempo changes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeatTiming {
    pub bpm: Bpm,
    pub beats_per_bar: u32,
    pub bars_per_phrase: u32,
    pub seconds_per_beat: f64,
    pub seconds_per_bar: f64,
}

impl BeatTiming {
    pub fn new(bpm: f64) -> Result<Self> {
        Self::with_beats_per_bar(bpm, DEFAULT_BEATS_PER_BAR)
    }

    pub fn with_beats_per_bar(bpm: f64, beats_per_bar: u32) -> Result<Self> {
        let bpm = Bpm::new(bpm)?;
        check_beats_per_bar(beats_per_bar)?;
        Ok(Self {
            bpm,
            beats_per_bar,
            bars_per_phrase: BARS_PER_PHRASE,
            seconds_per_beat: bpm.seconds_per_beat(),
            seconds_per_bar: bpm.seconds_per_bar(beats_per_bar),
        })
    }
}

/// Tempo plus prompt frequency: everything needed to place interval boundaries.
///
/// Boundaries sit at `k * seconds_per_interval()` for `k >= 1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PromptIntervalConfig {
    pub bpm: Bpm,
    pub frequency: Frequency,
}

impl PromptIntervalConfig {
    pub fn new(bpm: Bpm, frequency: Frequency) -> Self {
        Self { bpm, frequency }
    }

    pub fn seconds_per_bar(&self) -> f64 {
        self.bpm.seconds_per_bar(DEFAULT_BEATS_PER_BAR)
    }

    pub fn seconds_per_interval(&self) -> f64 {
        self.seconds_per_bar() * self.frequency.bars() as f64
    }

    pub fn interval_index(&self, elapsed: f64) -> u64 {
        interval_index(elapsed, self.seconds_per_interval())
    }

    pub fn current_bar(&self, elapsed: f64) -> u64 {
        interval_index(elapsed, self.seconds_per_bar()) + 1
    }

    pub fn interval_progress(&self, elapsed: f64) -> f64 {
        progress_within(elapsed, self.seconds_per_interval())
    }

    pub fn next_boundary(&self, elapsed: f64) -> f64 {
        let interval = self.seconds_per_interval();
        (interval_index(elapsed, interval) + 1) as f64 * interval
    }
}

/// Floor of `elapsed / interval`, tolerant of representation error at exact
/// boundaries. Negative elapsed values map to interval 0.
pub(crate) fn interval_index(elapsed: f64, interval: f64) -> u64 {
    let idx = ((elapsed + BOUNDARY_EPSILON) / interval).floor();
    if idx > 0.0 {
        idx as u64
    } else {
        0
    }
}

fn progress_within(elapsed: f64, interval: f64) -> f64 {
    let start = interval_index(elapsed, interval) as f64 * interval;
    ((elapsed - start) / interval).clamp(0.0, 1.0)
}

fn check_beats_per_bar(beats_per_bar: u32) -> Result<()> {
    if beats_per_bar == 0 {
        return Err(Error::InvalidArgument("beats per bar must be > 0".into()));
    }
    Ok(())
}

fn check_frequency(frequency_in_bars: u32) -> Result<()> {
    if frequency_in_bars == 0 {
        return Err(Error::InvalidArgument(
            "prompt frequency must be at least one bar".into(),
        ));
    }
    Ok(())
}

pub fn seconds_per_beat(bpm: f64) -> Result<f64> {
    Ok(Bpm::new(bpm)?.seconds_per_beat())
}

pub fn seconds_per_bar(bpm: f64, beats_per_bar: u32) -> Result<f64> {
    check_beats_per_bar(beats_per_bar)?;
    Ok(Bpm::new(bpm)?.seconds_per_bar(beats_per_bar))
}

pub fn seconds_per_interval(bpm: f64, frequency_in_bars: u32) -> Result<f64> {
    check_frequency(frequency_in_bars)?;
    Ok(seconds_per_bar(bpm, DEFAULT_BEATS_PER_BAR)? * frequency_in_bars as f64)
}

/// 1-indexed bar number: bar 1 spans `[0, seconds_per_bar)`.
pub fn current_bar(elapsed: f64, bpm: f64, beats_per_bar: u32) -> Result<u64> {
    let bar = seconds_per_bar(bpm, beats_per_bar)?;
    Ok(interval_index(elapsed, bar) + 1)
}

/// Fraction of the current prompt interval already played, in `[0, 1]`.
pub fn interval_progress(elapsed: f64, bpm: f64, frequency_in_bars: u32) -> Result<f64> {
    let interval = seconds_per_interval(bpm, frequency_in_bars)?;
    Ok(progress_within(elapsed, interval))
}

/// Time of the first interval boundary strictly after the current interval's start.
pub fn next_boundary(elapsed: f64, bpm: f64, frequency_in_bars: u32) -> Result<f64> {
    let interval = seconds_per_interval(bpm, frequency_in_bars)?;
    Ok((interval_index(elapsed, interval) + 1) as f64 * interval)
}

pub fn time_until_next_boundary(elapsed: f64, bpm: f64, frequency_in_bars: u32) -> Result<f64> {
    Ok((next_boundary(elapsed, bpm, frequency_in_bars)? - elapsed).max(0.0))
}

/// How many prompts a session of `duration` seconds will show.
pub fn expected_prompts(duration: f64, bpm: f64, frequency_in_bars: u32) -> Result<u64> {
    let interval = seconds_per_interval(bpm, frequency_in_bars)?;
    Ok(interval_index(duration, interval))
}

/// Whether `elapsed` is within `tolerance` beats of a beat boundary.
pub fn is_on_beat(elapsed: f64, bpm: f64, tolerance: f64) -> Result<bool> {
    let beat_pos = elapsed / seconds_per_beat(bpm)?;
    Ok((beat_pos - beat_pos.round()).abs() <= tolerance)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum TempoCategory {
    Slow,
    Medium,
    Fast,
    #[strum(to_string = "Very Fast")]
    VeryFast,
}

impl TempoCategory {
    pub fn of(bpm: f64) -> Self {
        if bpm < 85.0 {
            TempoCategory::Slow
        } else if bpm < 110.0 {
            TempoCategory::Medium
        } else if bpm < 140.0 {
            TempoCategory::Fast
        } else {
            TempoCategory::VeryFast
        }
    }
}

pub fn format_bpm(bpm: f64) -> String {
    if bpm.fract() == 0.0 {
        format!("{bpm:.0} BPM")
    } else {
        format!("{bpm:.1} BPM")
    }
}
