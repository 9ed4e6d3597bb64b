//! Practice-session glue: feeds clock samples to the scheduler, pulls words
//! from the generator on each fire and publishes what the screen should show.
//!
//! The scheduler and the generator live side by side in `PracticeSession` and
//! are only ever mutated together through `&mut self`, so word selection can
//! never drift from boundary detection.

use crate::clock::PlaybackClock;
use crate::scheduler::PromptScheduler;
use crate::timing::{Bpm, Frequency};
use crate::word_generator::WordGenerator;
use crate::words::{Difficulty, WordCandidate};
use std::time::Duration;

/// How long a freshly fired word is highlighted.
pub const DEFAULT_WORD_DISPLAY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Stopped,
    Playing,
    Paused,
}

/// What the presentation layer renders after each tick.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptFrame {
    pub current_word: Option<String>,
    /// True for a short while after a new word fired.
    pub show_word: bool,
    pub bar_count: u64,
    pub interval_progress: f64,
    pub next_boundary: f64,
    pub prompt_count: u32,
    pub elapsed: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub duration_secs: f64,
    pub prompt_count: u32,
    pub words: Vec<String>,
}

/// One-way push target for frames.
pub trait PromptSink {
    fn push(&mut self, frame: &PromptFrame);
}

impl<F: FnMut(&PromptFrame)> PromptSink for F {
    fn push(&mut self, frame: &PromptFrame) {
        self(frame)
    }
}

#[derive(Debug, Clone)]
pub struct PracticeSession {
    scheduler: PromptScheduler,
    generator: WordGenerator,
    state: PlaybackState,
    current_word: Option<String>,
    shown_at: Option<f64>,
    next_word: Option<WordCandidate>,
    prompt_count: u32,
    words_shown: Vec<String>,
    last_elapsed: f64,
    word_display: Duration,
}

impl PracticeSession {
    pub fn new(scheduler: PromptScheduler, mut generator: WordGenerator) -> Self {
        let next_word = generator.random_word();
        Self {
            scheduler,
            generator,
            state: PlaybackState::Stopped,
            current_word: None,
            shown_at: None,
            next_word,
            prompt_count: 0,
            words_shown: Vec::new(),
            last_elapsed: 0.0,
            word_display: DEFAULT_WORD_DISPLAY,
        }
    }

    pub fn with_word_display(mut self, word_display: Duration) -> Self {
        self.word_display = word_display;
        self
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn scheduler(&self) -> &PromptScheduler {
        &self.scheduler
    }

    pub fn generator(&self) -> &WordGenerator {
        &self.generator
    }

    pub fn current_word(&self) -> Option<&str> {
        self.current_word.as_deref()
    }

    /// The word that will appear at the next boundary, if any.
    pub fn next_word(&self) -> Option<&str> {
        self.next_word.as_ref().map(|w| w.text.as_str())
    }

    pub fn prompt_count(&self) -> u32 {
        self.prompt_count
    }

    pub fn difficulty(&self) -> Difficulty {
        self.generator.difficulty()
    }

    pub fn play(&mut self) {
        self.state = PlaybackState::Playing;
    }

    /// Freezes scheduler and generator as they are.
    pub fn pause(&mut self) {
        if self.state == PlaybackState::Playing {
            self.state = PlaybackState::Paused;
        }
    }

    /// Ends the run and resets scheduler and generator for the next one.
    pub fn stop(&mut self) -> SessionSummary {
        let summary = SessionSummary {
            duration_secs: self.last_elapsed,
            prompt_count: self.prompt_count,
            words: std::mem::take(&mut self.words_shown),
        };

        self.state = PlaybackState::Stopped;
        self.scheduler.reset();
        self.generator.reset();
        self.current_word = None;
        self.shown_at = None;
        self.prompt_count = 0;
        self.last_elapsed = 0.0;
        self.next_word = self.generator.random_word();

        summary
    }

    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        self.generator.set_difficulty(difficulty);
        self.next_word = self.generator.random_word();
    }

    pub fn set_bpm(&mut self, bpm: Bpm) {
        self.scheduler.set_bpm(bpm);
    }

    pub fn set_frequency(&mut self, frequency: Frequency) {
        self.scheduler.set_frequency(frequency);
    }

    /// Advances the session to `elapsed` playback seconds. Does nothing and
    /// returns `None` unless playing.
    pub fn tick(&mut self, elapsed: f64) -> Option<PromptFrame> {
        if self.state != PlaybackState::Playing {
            return None;
        }
        self.last_elapsed = elapsed;

        let Self {
            scheduler,
            generator,
            next_word,
            ..
        } = self;
        let fired = scheduler.check_and_trigger(elapsed, || {
            next_word.take().or_else(|| generator.random_word())
        });

        match fired {
            Some(Some(word)) => {
                log::debug!(
                    "prompt {} at {:.2}s: {}",
                    self.prompt_count + 1,
                    elapsed,
                    word.text
                );
                self.words_shown.push(word.text.clone());
                self.current_word = Some(word.text);
                self.shown_at = Some(elapsed);
                self.prompt_count += 1;
                self.next_word = self.generator.random_word();
            }
            Some(None) => {
                log::debug!(
                    "no {} word available for interval {}, skipping",
                    self.generator.difficulty(),
                    self.scheduler.last_fired_index()
                );
                self.current_word = None;
                self.shown_at = None;
            }
            None => {}
        }

        Some(self.frame())
    }

    pub fn frame(&self) -> PromptFrame {
        let config = self.scheduler.config();
        let elapsed = self.last_elapsed;
        let show_word = self
            .shown_at
            .is_some_and(|t| elapsed - t < self.word_display.as_secs_f64());

        PromptFrame {
            current_word: self.current_word.clone(),
            show_word,
            bar_count: config.current_bar(elapsed),
            interval_progress: config.interval_progress(elapsed),
            next_boundary: config.next_boundary(elapsed),
            prompt_count: self.prompt_count,
            elapsed,
        }
    }
}

/// Owns the playback clock for a session and polls it.
#[derive(Debug)]
pub struct SessionDriver<C: PlaybackClock> {
    clock: C,
    session: PracticeSession,
    duration_limit: Option<f64>,
    finished: bool,
}

impl<C: PlaybackClock> SessionDriver<C> {
    pub fn new(clock: C, session: PracticeSession) -> Self {
        Self {
            clock,
            session,
            duration_limit: None,
            finished: false,
        }
    }

    /// Ends playback once the beat has run for `secs`.
    pub fn with_duration_limit(mut self, secs: Option<f64>) -> Self {
        self.duration_limit = secs.filter(|s| *s > 0.0);
        self
    }

    pub fn session(&self) -> &PracticeSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut PracticeSession {
        &mut self.session
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    pub fn is_playing(&self) -> bool {
        self.session.state() == PlaybackState::Playing
    }

    /// True once the duration limit was reached; cleared by `stop`.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn play(&mut self) {
        if self.finished {
            return;
        }
        self.clock.play();
        self.session.play();
    }

    pub fn pause(&mut self) {
        self.clock.pause();
        self.session.pause();
    }

    pub fn toggle(&mut self) {
        if self.is_playing() {
            self.pause();
        } else {
            self.play();
        }
    }

    pub fn stop(&mut self) -> SessionSummary {
        self.clock.stop();
        self.finished = false;
        self.session.stop()
    }

    /// Samples the clock and advances the session. `None` while not playing.
    pub fn poll(&mut self) -> Option<PromptFrame> {
        if !self.is_playing() {
            return None;
        }

        let mut elapsed = self.clock.elapsed();
        let reached_end = self.duration_limit.is_some_and(|limit| elapsed >= limit);
        if let Some(limit) = self.duration_limit {
            elapsed = elapsed.min(limit);
        }

        let frame = self.session.tick(elapsed);

        if reached_end {
            log::debug!("beat ended at {elapsed:.2}s");
            self.pause();
            self.finished = true;
        }

        frame
    }

    /// Polls and pushes the resulting frame, if any, into `sink`.
    pub fn poll_into<S: PromptSink + ?Sized>(&mut self, sink: &mut S) -> bool {
        match self.poll() {
            Some(frame) => {
                sink.push(&frame);
                true
            }
            None => false,
        }
    }
}
