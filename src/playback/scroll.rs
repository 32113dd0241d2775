//! Continuous-Scroll scheduler.
//!
//! Positions are in pixels of a content extent the host reports through
//! [`ScrollScheduler::set_extent`]. Each [`frame`](ScrollScheduler::frame)
//! advances by `speed * elapsed`, measured from the previous frame.

use super::PlayState;
use super::speech::{Speech, Voice};
use std::time::Instant;

pub const DEFAULT_SPEED: f64 = 50.0;
pub const SPEED_RANGE: (f64, f64) = (10.0, 500.0);
/// Distance from the bottom that already counts as the end.
pub const END_EPSILON: f64 = 10.0;
/// Manual scroll step in pixels.
pub const SCROLL_STEP: f64 = 200.0;

pub struct ScrollScheduler<S: Speech> {
    position: f64,
    /// Pixels per second
    speed: f64,
    content_extent: f64,
    viewport: f64,
    playing: bool,
    /// Reference for the next frame's elapsed time; cleared on stop
    last_frame: Option<Instant>,
    /// Text spoken once per start
    text: String,
    speech: S,
    voice: Option<Voice>,
    utterance_active: bool,
}

impl<S: Speech> ScrollScheduler<S> {
    pub fn new(text: impl Into<String>, speech: S) -> Self {
        Self {
            position: 0.0,
            speed: DEFAULT_SPEED,
            content_extent: 0.0,
            viewport: 0.0,
            playing: false,
            last_frame: None,
            text: text.into(),
            speech,
            voice: None,
            utterance_active: false,
        }
    }

    pub fn with_speed(mut self, speed: f64) -> Self {
        self.set_speed(speed);
        self
    }

    pub fn with_voice(mut self, voice: Option<Voice>) -> Self {
        self.voice = voice;
        self
    }

    pub fn state(&self) -> PlayState {
        if self.playing {
            PlayState::Playing
        } else {
            PlayState::Stopped
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn speech(&self) -> &S {
        &self.speech
    }

    /// Adjustable at any time; a running loop keeps going at the new speed.
    pub fn set_speed(&mut self, speed: f64) {
        self.speed = if speed.is_finite() {
            speed.clamp(SPEED_RANGE.0, SPEED_RANGE.1)
        } else {
            DEFAULT_SPEED
        };
    }

    pub fn set_extent(&mut self, content_extent: f64, viewport: f64) {
        self.content_extent = content_extent.max(0.0);
        self.viewport = viewport.max(0.0);
        self.position = self.position.min(self.max_position());
    }

    fn max_position(&self) -> f64 {
        (self.content_extent - self.viewport).max(0.0)
    }

    pub fn at_end(&self) -> bool {
        self.position + self.viewport >= self.content_extent - END_EPSILON
    }

    pub fn start(&mut self) {
        if self.playing {
            return;
        }
        self.playing = true;
        self.last_frame = None;
        self.speech.cancel();
        self.utterance_active = false;
        let Some(voice) = &self.voice else {
            return;
        };
        if !self.text.trim().is_empty() {
            let utterance = voice.utterance(self.text.clone());
            self.utterance_active = self.speech.speak(&utterance);
            if !self.utterance_active {
                log::debug!("speech did not start; scrolling silently");
            }
        }
    }

    pub fn stop(&mut self) {
        self.playing = false;
        self.last_frame = None;
        self.utterance_active = false;
        self.speech.cancel();
    }

    pub fn toggle(&mut self) {
        if self.playing {
            self.stop();
        } else {
            self.start();
        }
    }

    /// Advance the loop to `now`. Returns whether the position changed.
    ///
    /// The first frame after a start only records its timestamp, so time
    /// spent paused is never applied.
    pub fn frame(&mut self, now: Instant) -> bool {
        if !self.playing {
            return false;
        }
        if self.utterance_active && !self.speech.is_speaking() {
            self.on_speech_finished();
            return false;
        }

        let last = self.last_frame.replace(now).unwrap_or(now);
        let elapsed = now.saturating_duration_since(last).as_secs_f64();
        let before = self.position;
        self.position = (self.position + self.speed * elapsed).min(self.max_position());

        if self.at_end() {
            log::debug!("scroll reached the end at {:.0}px", self.position);
            self.stop();
        }
        self.position != before
    }

    /// The whole-text utterance ended on its own.
    pub fn on_speech_finished(&mut self) {
        if self.utterance_active {
            self.utterance_active = false;
            self.stop();
        }
    }

    /// Manual scroll by `delta` pixels. Does not change play state.
    pub fn scroll_by(&mut self, delta: f64) {
        self.position = (self.position + delta).clamp(0.0, self.max_position());
    }

    pub fn scroll_up(&mut self) {
        self.scroll_by(-SCROLL_STEP);
    }

    pub fn scroll_down(&mut self) {
        self.scroll_by(SCROLL_STEP);
    }
}
