use crate::playback::flash::{DEFAULT_WPM, GROUP_RANGE, WPM_RANGE};
use crate::playback::scroll::{DEFAULT_SPEED, SPEED_RANGE};
use crate::playback::speech::{PITCH_RANGE, RATE_RANGE, Voice};
use crate::tokenizer::TokenizerConfig;
use crate::transform::{
    CharacterAids, Color, FIXATION_RANGE, LetterColors, OPACITY_RANGE, RHYTHM_RANGE, Style,
    TransformOptions,
};
use crate::window::VirtualizationConfig;
use serde::{Deserialize, Serialize};

pub const TTS_PRESET_LIST: &[&str] = &["edge-playback", "espeak", "say"];

pub const WORDS_PER_CHUNK_RANGE: (usize, usize) = (50, 500);
pub const VIRTUAL_BUFFER_RANGE: (usize, usize) = (2, 10);
pub const PARAGRAPH_HEIGHT_RANGE: (f64, f64) = (80.0, 300.0);
pub const TEXT_CHUNK_RANGE: (usize, usize) = (25_000, 200_000);
pub const MAX_RENDER_RANGE: (usize, usize) = (10, 100);

const BLUE: Color = Color::rgb(0x3B, 0x82, 0xF6);
const RED: Color = Color::rgb(0xEF, 0x44, 0x44);
const GREEN: Color = Color::rgb(0x22, 0xC5, 0x5E);
const ORANGE: Color = Color::rgb(0xF9, 0x73, 0x16);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReadingMode {
    #[default]
    Scroll,
    RsvpSingle,
    RsvpMulti,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub reading_mode: ReadingMode,
    pub wpm: u32,
    pub words_per_group: usize,

    pub bionic_enabled: bool,
    pub bionic_style: Style,
    pub fixation_strength: u8,
    pub saccade_rhythm: u8,
    pub skip_common_words: bool,
    pub bionic_opacity: f32,

    pub syllable_color_enabled: bool,
    pub syllable_colors: [Color; 2],
    pub char_disambiguation_enabled: bool,
    pub char_b_color: Color,
    pub char_d_color: Color,
    pub char_p_color: Color,
    pub char_q_color: Color,
    pub homophone_enabled: bool,
    pub beeline_enabled: bool,
    pub beeline_colors: [Color; 2],

    pub tts_enabled: bool,
    pub tts_rate: f32,
    pub tts_pitch: f32,
    pub tts_voice: String,
    pub preferred_tts_engine: Option<String>,

    /// Pixels per second
    pub scroll_speed: f64,

    pub words_per_chunk: usize,
    pub virtual_buffer_size: usize,
    pub paragraph_height_estimate: f64,
    pub enable_virtualization: bool,
    pub text_processing_chunk_size: usize,
    pub max_render_paragraphs: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            reading_mode: ReadingMode::Scroll,
            wpm: DEFAULT_WPM,
            words_per_group: 3,
            bionic_enabled: true,
            bionic_style: Style::BoldStart,
            fixation_strength: 3,
            saccade_rhythm: 1,
            skip_common_words: false,
            bionic_opacity: 0.5,
            syllable_color_enabled: false,
            syllable_colors: [BLUE, RED],
            char_disambiguation_enabled: false,
            char_b_color: BLUE,
            char_d_color: RED,
            char_p_color: GREEN,
            char_q_color: ORANGE,
            homophone_enabled: false,
            beeline_enabled: false,
            beeline_colors: [BLUE, RED],
            tts_enabled: false,
            tts_rate: 1.0,
            tts_pitch: 1.0,
            tts_voice: String::new(),
            preferred_tts_engine: None,
            scroll_speed: DEFAULT_SPEED,
            words_per_chunk: 200,
            virtual_buffer_size: 5,
            paragraph_height_estimate: 150.0,
            enable_virtualization: true,
            text_processing_chunk_size: 100_000,
            max_render_paragraphs: 30,
        }
    }
}

fn clamp_f32(value: f32, (min, max): (f32, f32), fallback: f32) -> f32 {
    if value.is_nan() { fallback } else { value.clamp(min, max) }
}

fn clamp_f64(value: f64, (min, max): (f64, f64), fallback: f64) -> f64 {
    if value.is_nan() { fallback } else { value.clamp(min, max) }
}

impl Settings {
    /// Copy with every numeric setting forced into its valid range.
    pub fn clamped(&self) -> Self {
        let defaults = Self::default();
        Self {
            wpm: self.wpm.clamp(WPM_RANGE.0, WPM_RANGE.1),
            words_per_group: self.words_per_group.clamp(GROUP_RANGE.0, GROUP_RANGE.1),
            fixation_strength: self.fixation_strength.clamp(FIXATION_RANGE.0, FIXATION_RANGE.1),
            saccade_rhythm: self.saccade_rhythm.clamp(RHYTHM_RANGE.0, RHYTHM_RANGE.1),
            bionic_opacity: clamp_f32(self.bionic_opacity, OPACITY_RANGE, defaults.bionic_opacity),
            tts_rate: clamp_f32(self.tts_rate, RATE_RANGE, defaults.tts_rate),
            tts_pitch: clamp_f32(self.tts_pitch, PITCH_RANGE, defaults.tts_pitch),
            scroll_speed: clamp_f64(self.scroll_speed, SPEED_RANGE, defaults.scroll_speed),
            words_per_chunk: self
                .words_per_chunk
                .clamp(WORDS_PER_CHUNK_RANGE.0, WORDS_PER_CHUNK_RANGE.1),
            virtual_buffer_size: self
                .virtual_buffer_size
                .clamp(VIRTUAL_BUFFER_RANGE.0, VIRTUAL_BUFFER_RANGE.1),
            paragraph_height_estimate: clamp_f64(
                self.paragraph_height_estimate,
                PARAGRAPH_HEIGHT_RANGE,
                defaults.paragraph_height_estimate,
            ),
            text_processing_chunk_size: self
                .text_processing_chunk_size
                .clamp(TEXT_CHUNK_RANGE.0, TEXT_CHUNK_RANGE.1),
            max_render_paragraphs: self
                .max_render_paragraphs
                .clamp(MAX_RENDER_RANGE.0, MAX_RENDER_RANGE.1),
            ..self.clone()
        }
    }

    /// Words shown per flash: always one in single-word mode.
    pub fn group_size(&self) -> usize {
        match self.reading_mode {
            ReadingMode::RsvpSingle => 1,
            ReadingMode::Scroll | ReadingMode::RsvpMulti => {
                self.words_per_group.clamp(GROUP_RANGE.0, GROUP_RANGE.1)
            }
        }
    }

    pub fn transform_options(&self) -> TransformOptions {
        TransformOptions {
            style: self.bionic_style,
            fixation_strength: self.fixation_strength,
            rhythm_stride: self.saccade_rhythm,
            skip_common_words: self.skip_common_words,
            opacity: self.bionic_opacity,
        }
        .clamped()
    }

    /// Options for single-word display, where every word is emphasized.
    pub fn flash_transform_options(&self) -> TransformOptions {
        TransformOptions {
            rhythm_stride: 1,
            skip_common_words: false,
            ..self.transform_options()
        }
    }

    pub fn character_aids(&self) -> CharacterAids {
        CharacterAids {
            syllable_colors: self.syllable_color_enabled.then_some(self.syllable_colors),
            letter_colors: self.char_disambiguation_enabled.then_some(LetterColors {
                b: self.char_b_color,
                d: self.char_d_color,
                p: self.char_p_color,
                q: self.char_q_color,
            }),
        }
    }

    pub fn tokenizer_config(&self) -> TokenizerConfig {
        TokenizerConfig {
            chunk_chars: self
                .text_processing_chunk_size
                .clamp(TEXT_CHUNK_RANGE.0, TEXT_CHUNK_RANGE.1),
            ..TokenizerConfig::default()
        }
    }

    pub fn virtualization(&self) -> VirtualizationConfig {
        let clamped = self.clamped();
        VirtualizationConfig {
            enabled: clamped.enable_virtualization,
            item_height: clamped.paragraph_height_estimate,
            buffer: clamped.virtual_buffer_size,
            max_render: clamped.max_render_paragraphs,
        }
    }

    /// `None` when speech is switched off.
    pub fn voice(&self) -> Option<Voice> {
        self.tts_enabled.then(|| Voice {
            rate: self.tts_rate,
            pitch: self.tts_pitch,
            name: (!self.tts_voice.trim().is_empty()).then(|| self.tts_voice.clone()),
        })
    }

    pub fn tts_engine(&self) -> &str {
        self.preferred_tts_engine.as_deref().unwrap_or(TTS_PRESET_LIST[0])
    }
}
