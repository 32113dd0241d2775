//! Terminal styling for transformed text.
//!
//! Words are turned into [`StyledRun`]s once and then rendered either as
//! ratatui spans for the interactive readers or as ANSI text for `--bionic`.

use crate::settings::Settings;
use crate::transform::{
    CharacterAids, Color, Emphasis, SpanRole, TransformOptions, beeline_gradient,
    compute_render_token, homophone_hint, styled_chars,
};
use crossterm::style::{Attribute, ContentStyle, StyledContent};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};

/// Highlight colour for the colour styles.
pub const ACCENT: Color = Color::rgb(0xF5, 0x9E, 0x0B);

#[derive(Debug, Clone, PartialEq, Default)]
pub struct StyledRun {
    pub text: String,
    pub bold: bool,
    pub dim: bool,
    pub underline: bool,
    pub fg: Option<Color>,
}

impl StyledRun {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    fn with_text(&self, text: String, fg: Option<Color>) -> Self {
        Self {
            text,
            fg,
            ..self.clone()
        }
    }

    pub fn to_span(&self) -> Span<'static> {
        let mut style = Style::default();
        if self.bold {
            style = style.add_modifier(Modifier::BOLD);
        }
        if self.dim {
            style = style.add_modifier(Modifier::DIM);
        }
        if self.underline {
            style = style.add_modifier(Modifier::UNDERLINED);
        }
        if let Some(color) = self.fg {
            style = style.fg(ratatui::style::Color::Rgb(color.r, color.g, color.b));
        }
        Span::styled(self.text.clone(), style)
    }

    pub fn to_ansi(&self) -> String {
        let mut style = ContentStyle::new();
        if self.bold {
            style.attributes.set(Attribute::Bold);
        }
        if self.dim {
            style.attributes.set(Attribute::Dim);
        }
        if self.underline {
            style.attributes.set(Attribute::Underlined);
        }
        style.foreground_color = self.fg.map(|color| crossterm::style::Color::Rgb {
            r: color.r,
            g: color.g,
            b: color.b,
        });
        StyledContent::new(style, self.text.as_str()).to_string()
    }
}

pub fn to_line(runs: &[StyledRun]) -> Line<'static> {
    Line::from(runs.iter().map(StyledRun::to_span).collect::<Vec<_>>())
}

pub fn to_ansi(runs: &[StyledRun]) -> String {
    runs.iter().map(StyledRun::to_ansi).collect()
}

/// Everything that decides how a word looks on screen.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextStyler {
    /// `None` renders words without bionic emphasis
    pub bionic: Option<TransformOptions>,
    pub aids: CharacterAids,
    pub homophones: bool,
    pub beeline: Option<[Color; 2]>,
}

impl TextStyler {
    /// Styler for running text.
    pub fn for_text(settings: &Settings) -> Self {
        Self {
            bionic: settings
                .bionic_enabled
                .then(|| settings.transform_options()),
            aids: settings.character_aids(),
            homophones: settings.homophone_enabled,
            beeline: settings.beeline_enabled.then_some(settings.beeline_colors),
        }
    }

    /// Styler for flashed words: every word is emphasized and there are no
    /// lines to carry a gradient across.
    pub fn for_flash(settings: &Settings) -> Self {
        Self {
            bionic: settings
                .bionic_enabled
                .then(|| settings.flash_transform_options()),
            beeline: None,
            ..Self::for_text(settings)
        }
    }

    pub fn word_runs(&self, word: &str, index: usize) -> Vec<StyledRun> {
        let underline = self.homophones && homophone_hint(word).is_some();
        let runs = match &self.bionic {
            Some(options) => {
                let token = compute_render_token(word, index, options);
                let emphasis = options.style.emphasis();
                token
                    .spans()
                    .into_iter()
                    .map(|(text, role)| {
                        let mut run = StyledRun::plain(text);
                        if !token.is_skipped {
                            apply_emphasis(&mut run, role, emphasis, token.has_center_marker);
                        }
                        run
                    })
                    .collect()
            }
            None => vec![StyledRun::plain(word)],
        };

        let mut runs = self.apply_aids(runs);
        if underline {
            runs.iter_mut().for_each(|run| run.underline = true);
        }
        runs
    }

    /// Split runs wherever a character aid changes the colour.
    fn apply_aids(&self, runs: Vec<StyledRun>) -> Vec<StyledRun> {
        if self.aids.syllable_colors.is_none() && self.aids.letter_colors.is_none() {
            return runs;
        }
        let word: String = runs.iter().map(|run| run.text.as_str()).collect();
        let colors: Vec<Option<Color>> =
            styled_chars(&word, &self.aids).into_iter().map(|(_, c)| c).collect();

        let mut out = Vec::new();
        let mut position = 0;
        for run in runs {
            let mut current: Option<StyledRun> = None;
            for c in run.text.chars() {
                let fg = colors.get(position).copied().flatten().or(run.fg);
                position += 1;
                match current.as_mut() {
                    Some(open) if open.fg == fg => open.text.push(c),
                    _ => {
                        out.extend(current.take());
                        current = Some(run.with_text(c.to_string(), fg));
                    }
                }
            }
            out.extend(current);
        }
        out
    }

    /// Style one wrapped line. `first_word` is the paragraph-wide index of
    /// the line's first word; the index after the last word is returned.
    pub fn line_runs(
        &self,
        line: &str,
        line_index: usize,
        first_word: usize,
    ) -> (Vec<StyledRun>, usize) {
        let mut runs = Vec::new();
        let mut index = first_word;
        let mut rest = line;
        while !rest.is_empty() {
            let starts_with_space = rest.starts_with(char::is_whitespace);
            let boundary = rest
                .find(|c: char| c.is_whitespace() != starts_with_space)
                .unwrap_or(rest.len());
            let (segment, tail) = rest.split_at(boundary);
            if starts_with_space {
                runs.push(StyledRun::plain(segment));
            } else {
                runs.extend(self.word_runs(segment, index));
                index += 1;
            }
            rest = tail;
        }

        if let Some(colors) = self.beeline {
            runs = apply_beeline(runs, beeline_gradient(line_index, colors));
        }
        (runs, index)
    }

    /// Wrap a paragraph to `width` columns and style every line.
    pub fn paragraph_lines(&self, paragraph: &str, width: usize) -> Vec<Vec<StyledRun>> {
        let mut index = 0;
        textwrap::wrap(paragraph, width.max(1))
            .iter()
            .enumerate()
            .map(|(line_index, line)| {
                let (runs, next) = self.line_runs(line, line_index, index);
                index = next;
                runs
            })
            .collect()
    }
}

fn apply_emphasis(run: &mut StyledRun, role: SpanRole, emphasis: Emphasis, center_marker: bool) {
    match (role, emphasis) {
        (SpanRole::Highlight, Emphasis::Bold | Emphasis::Faded) => run.bold = true,
        (SpanRole::Highlight, Emphasis::Accent) => {
            run.bold = true;
            run.fg = Some(ACCENT);
        }
        (SpanRole::Rest, Emphasis::Faded) => run.dim = true,
        _ => {}
    }
    if center_marker && role == SpanRole::Highlight {
        run.underline = true;
    }
}

fn lerp(from: u8, to: u8, t: f64) -> u8 {
    (from as f64 + (to as f64 - from as f64) * t).round() as u8
}

/// Colour every uncoloured character along the line's gradient.
fn apply_beeline(runs: Vec<StyledRun>, (start, end): (Color, Color)) -> Vec<StyledRun> {
    let total: usize = runs.iter().map(|run| run.text.chars().count()).sum();
    let span = total.saturating_sub(1).max(1) as f64;
    let mut position = 0;
    let mut out = Vec::with_capacity(total);
    for run in runs {
        if run.fg.is_some() || run.text.trim().is_empty() {
            position += run.text.chars().count();
            out.push(run);
            continue;
        }
        for c in run.text.chars() {
            let t = position as f64 / span;
            let color = Color::rgb(
                lerp(start.r, end.r, t),
                lerp(start.g, end.g, t),
                lerp(start.b, end.b, t),
            );
            out.push(run.with_text(c.to_string(), Some(color)));
            position += 1;
        }
    }
    out
}
