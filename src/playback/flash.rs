//! Timed-Flash (RSVP) scheduler.
//!
//! The repeating timer is a single deadline. The host loop calls
//! [`FlashScheduler::poll`] whenever it wakes up, and every period that has
//! elapsed since the last tick is applied, so a late host never drifts.

use super::PlayState;
use super::speech::{Speech, Voice};
use crate::models::{PlaybackCursor, clamp_index};
use crate::tokenizer::TokenStream;
use std::time::{Duration, Instant};

pub const DEFAULT_WPM: u32 = 300;
pub const WPM_RANGE: (u32, u32) = (100, 1000);
pub const WPM_STEP: u32 = 25;
pub const GROUP_RANGE: (usize, usize) = (1, 7);
pub const SKIP_WORDS: usize = 10;

pub struct FlashScheduler<S: Speech> {
    tokens: TokenStream,
    cursor: PlaybackCursor,
    wpm: u32,
    group_size: usize,
    /// Deadline of the next tick; `Some` exactly while playing
    next_tick: Option<Instant>,
    speech: S,
    /// `None` keeps the scheduler silent
    voice: Option<Voice>,
}

impl<S: Speech> FlashScheduler<S> {
    pub fn new(tokens: TokenStream, speech: S) -> Self {
        Self {
            tokens,
            cursor: PlaybackCursor::default(),
            wpm: DEFAULT_WPM,
            group_size: 1,
            next_tick: None,
            speech,
            voice: None,
        }
    }

    pub fn with_wpm(mut self, wpm: u32) -> Self {
        self.wpm = clamp_wpm(wpm);
        self
    }

    pub fn with_group_size(mut self, group_size: usize) -> Self {
        self.group_size = group_size.clamp(GROUP_RANGE.0, GROUP_RANGE.1);
        self
    }

    pub fn with_voice(mut self, voice: Option<Voice>) -> Self {
        self.voice = voice;
        self
    }

    pub fn state(&self) -> PlayState {
        if self.cursor.playing {
            PlayState::Playing
        } else {
            PlayState::Stopped
        }
    }

    pub fn is_playing(&self) -> bool {
        self.cursor.playing
    }

    pub fn index(&self) -> usize {
        self.cursor.index
    }

    pub fn tokens(&self) -> &TokenStream {
        &self.tokens
    }

    pub fn wpm(&self) -> u32 {
        self.wpm
    }

    pub fn group_size(&self) -> usize {
        self.group_size
    }

    pub fn speech(&self) -> &S {
        &self.speech
    }

    /// When the host should next call [`poll`](Self::poll).
    pub fn next_deadline(&self) -> Option<Instant> {
        self.next_tick
    }

    /// `(60 / wpm) * 1000 * group_size` milliseconds.
    pub fn period(&self) -> Duration {
        Duration::from_secs_f64(60.0 / self.wpm as f64 * self.group_size as f64)
    }

    /// Percent read, counting the current word as read.
    pub fn progress(&self) -> f64 {
        if self.tokens.is_empty() {
            return 0.0;
        }
        (self.cursor.index + 1) as f64 / self.tokens.len() as f64 * 100.0
    }

    /// The words currently on screen.
    pub fn current_words(&self) -> String {
        self.tokens.range(self.cursor.index, self.group_size).join(" ")
    }

    pub fn start(&mut self, now: Instant) {
        if self.cursor.playing || self.tokens.is_empty() {
            return;
        }
        self.cursor.playing = true;
        self.next_tick = Some(now + self.period());
        self.cursor_changed();
    }

    pub fn stop(&mut self) {
        self.next_tick = None;
        self.cursor.playing = false;
        self.speech.cancel();
    }

    /// Play/pause. Starting from the last word rewinds to the beginning.
    pub fn toggle(&mut self, now: Instant) {
        if self.cursor.playing {
            self.stop();
            return;
        }
        if self.cursor.index + 1 >= self.tokens.len() {
            self.cursor.index = 0;
        }
        self.start(now);
    }

    pub fn reset(&mut self) {
        self.stop();
        self.cursor.index = 0;
    }

    /// Apply every tick due by `now`. Returns whether the cursor moved.
    pub fn poll(&mut self, now: Instant) -> bool {
        let mut moved = false;
        while let Some(deadline) = self.next_tick {
            if deadline > now {
                break;
            }
            self.next_tick = Some(deadline + self.period());
            self.tick();
            moved = true;
        }
        if moved {
            self.cursor_changed();
        }
        moved
    }

    /// Advance by one group, stopping on the last word.
    fn tick(&mut self) {
        let count = self.tokens.len();
        if count == 0 {
            return;
        }
        let next = self.cursor.index + self.group_size;
        if next >= count {
            self.cursor.index = count - 1;
            self.next_tick = None;
            self.cursor.playing = false;
        } else {
            self.cursor.index = next;
        }
    }

    /// Manual tick: same end-of-stream handling as the timer.
    pub fn advance(&mut self) {
        self.tick();
        self.cursor_changed();
    }

    pub fn back(&mut self) {
        self.step(-(self.group_size as isize));
    }

    pub fn skip_back(&mut self) {
        self.step(-(SKIP_WORDS as isize));
    }

    pub fn skip_forward(&mut self) {
        self.step(SKIP_WORDS as isize);
    }

    /// Move by `delta` words, clamped. Play state is unchanged.
    pub fn step(&mut self, delta: isize) {
        self.cursor.step(delta, self.tokens.len());
        self.cursor_changed();
    }

    /// Jump to `fraction` (0..1) of the stream. Play state is unchanged.
    pub fn seek(&mut self, fraction: f64) {
        let fraction = if fraction.is_nan() { 0.0 } else { fraction.clamp(0.0, 1.0) };
        let target = (fraction * self.tokens.len() as f64).floor() as usize;
        self.cursor.index = clamp_index(target, self.tokens.len());
        self.cursor_changed();
    }

    /// Change the rate; a running timer is re-armed with the new period.
    pub fn set_wpm(&mut self, wpm: u32, now: Instant) {
        self.wpm = clamp_wpm(wpm);
        if self.next_tick.is_some() {
            self.next_tick = Some(now + self.period());
        }
    }

    pub fn faster(&mut self, now: Instant) {
        self.set_wpm(self.wpm.saturating_add(WPM_STEP), now);
    }

    pub fn slower(&mut self, now: Instant) {
        self.set_wpm(self.wpm.saturating_sub(WPM_STEP), now);
    }

    pub fn set_group_size(&mut self, group_size: usize, now: Instant) {
        self.group_size = group_size.clamp(GROUP_RANGE.0, GROUP_RANGE.1);
        if self.next_tick.is_some() {
            self.next_tick = Some(now + self.period());
        }
    }

    pub fn set_voice(&mut self, voice: Option<Voice>) {
        self.voice = voice;
        self.cursor_changed();
    }

    /// A moved cursor silences the old utterance before the new one starts.
    fn cursor_changed(&mut self) {
        self.speech.cancel();
        self.speak_current();
    }

    fn speak_current(&mut self) {
        if !self.cursor.playing {
            return;
        }
        let Some(voice) = &self.voice else {
            return;
        };
        let words = self.current_words();
        if !words.is_empty() {
            let utterance = voice.utterance(words);
            self.speech.speak(&utterance);
        }
    }
}

pub fn clamp_wpm(wpm: u32) -> u32 {
    wpm.clamp(WPM_RANGE.0, WPM_RANGE.1)
}
