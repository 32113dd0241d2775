use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Gauge, Paragraph},
};
use std::time::Instant;

use crate::playback::{FlashScheduler, PlayState, Speech};
use crate::transform::homophone_hint;
use crate::ui::style::{StyledRun, TextStyler, to_line};
use crate::ui::{IDLE_POLL, Tui, header_line};

const HELP: &str = "space play/pause  \u{2190}/\u{2192} step  [/] skip  \u{2191}/\u{2193} speed  +/- group  r reset  q quit";

/// Word-flash reader.
pub struct FlashReader<S: Speech> {
    title: String,
    scheduler: FlashScheduler<S>,
    styler: TextStyler,
    should_quit: bool,
}

impl<S: Speech> FlashReader<S> {
    pub fn new(title: impl Into<String>, scheduler: FlashScheduler<S>, styler: TextStyler) -> Self {
        Self {
            title: title.into(),
            scheduler,
            styler,
            should_quit: false,
        }
    }

    pub fn scheduler(&self) -> &FlashScheduler<S> {
        &self.scheduler
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Run until the user quits. The poll timeout is the time left to the
    /// scheduler's next tick, so no tick is ever late by more than a redraw.
    pub fn run(&mut self, terminal: &mut Tui) -> eyre::Result<()> {
        loop {
            self.scheduler.poll(Instant::now());
            terminal.draw(|frame| self.render(frame))?;
            if self.should_quit {
                break;
            }

            let timeout = self
                .scheduler
                .next_deadline()
                .map(|deadline| deadline.saturating_duration_since(Instant::now()))
                .unwrap_or(IDLE_POLL);
            if !event::poll(timeout)? {
                continue;
            }
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    self.handle_key(key, Instant::now());
                }
            }
        }
        self.scheduler.stop();
        Ok(())
    }

    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) {
        let scheduler = &mut self.scheduler;
        match key.code {
            KeyCode::Char(' ') => scheduler.toggle(now),
            KeyCode::Left | KeyCode::Char('h') => scheduler.back(),
            KeyCode::Right | KeyCode::Char('l') => scheduler.advance(),
            KeyCode::Char('[') => scheduler.skip_back(),
            KeyCode::Char(']') => scheduler.skip_forward(),
            KeyCode::Up | KeyCode::Char('k') => scheduler.faster(now),
            KeyCode::Down | KeyCode::Char('j') => scheduler.slower(now),
            KeyCode::Char('+') | KeyCode::Char('=') => {
                scheduler.set_group_size(scheduler.group_size() + 1, now)
            }
            KeyCode::Char('-') => {
                scheduler.set_group_size(scheduler.group_size().saturating_sub(1), now)
            }
            KeyCode::Char('r') => scheduler.reset(),
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            _ => {}
        }
    }

    fn word_line(&self) -> Line<'static> {
        let index = self.scheduler.index();
        let words = self
            .scheduler
            .tokens()
            .range(index, self.scheduler.group_size());
        let mut runs = Vec::new();
        for (offset, word) in words.iter().enumerate() {
            if offset > 0 {
                runs.push(StyledRun::plain(" "));
            }
            runs.extend(self.styler.word_runs(word, index + offset));
        }
        to_line(&runs)
    }

    pub fn render(&self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .split(frame.area());

        let progress = self.scheduler.progress();
        let percent = format!("{progress:.0}%");
        frame.render_widget(
            Paragraph::new(header_line(&self.title, Some(&percent), chunks[0].width)),
            chunks[0],
        );

        let middle = chunks[1].height.saturating_sub(1) / 2;
        let mut lines = vec![Line::default(); middle as usize];
        lines.push(self.word_line());
        if self.styler.homophones && self.scheduler.group_size() == 1 {
            let hint = self
                .scheduler
                .tokens()
                .get(self.scheduler.index())
                .and_then(homophone_hint);
            if let Some(hint) = hint {
                lines.push(Line::styled(
                    hint.to_string(),
                    Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
                ));
            }
        }
        frame.render_widget(
            Paragraph::new(lines).alignment(Alignment::Center),
            chunks[1],
        );

        let total = self.scheduler.tokens().len();
        let label = format!("{}/{}", (self.scheduler.index() + 1).min(total), total);
        frame.render_widget(
            Gauge::default()
                .gauge_style(Style::default().fg(Color::Blue))
                .ratio((progress / 100.0).clamp(0.0, 1.0))
                .label(label),
            chunks[2],
        );

        let state = match self.scheduler.state() {
            PlayState::Playing => "playing",
            PlayState::Stopped => "paused",
        };
        let status = format!(
            "{} wpm  {} per flash  {}  |  {}",
            self.scheduler.wpm(),
            self.scheduler.group_size(),
            state,
            HELP
        );
        frame.render_widget(
            Paragraph::new(status).style(Style::default().fg(Color::DarkGray)),
            chunks[3],
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::SilentSpeech;
    use crate::tokenizer::TokenStream;
    use crossterm::event::KeyModifiers;
    use ratatui::{Terminal, backend::TestBackend};

    fn reader(words: &[&str]) -> FlashReader<SilentSpeech> {
        let tokens = TokenStream::from(words.iter().map(|w| w.to_string()).collect::<Vec<_>>());
        FlashReader::new("Title", FlashScheduler::new(tokens, SilentSpeech), TextStyler::default())
    }

    fn press(reader: &mut FlashReader<SilentSpeech>, code: KeyCode, now: Instant) {
        reader.handle_key(KeyEvent::new(code, KeyModifiers::NONE), now);
    }

    fn screen(reader: &FlashReader<SilentSpeech>) -> String {
        let mut terminal = Terminal::new(TestBackend::new(60, 8)).unwrap();
        terminal.draw(|frame| reader.render(frame)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_keys_drive_scheduler() {
        let now = Instant::now();
        let mut reader = reader(&["one", "two", "three", "four"]);
        press(&mut reader, KeyCode::Char(' '), now);
        assert!(reader.scheduler().is_playing());
        press(&mut reader, KeyCode::Right, now);
        assert_eq!(reader.scheduler().index(), 1);
        press(&mut reader, KeyCode::Up, now);
        assert_eq!(reader.scheduler().wpm(), 325);
        press(&mut reader, KeyCode::Char(' '), now);
        assert!(!reader.scheduler().is_playing());
        press(&mut reader, KeyCode::Left, now);
        assert_eq!(reader.scheduler().index(), 0);
        press(&mut reader, KeyCode::Char('+'), now);
        assert_eq!(reader.scheduler().group_size(), 2);
        press(&mut reader, KeyCode::Char('q'), now);
        assert!(reader.should_quit());
    }

    #[test]
    fn test_render_shows_current_word_and_progress() {
        let mut reader = reader(&["alpha", "beta"]);
        press(&mut reader, KeyCode::Right, Instant::now());
        let screen = screen(&reader);
        assert!(screen.contains("beta"));
        assert!(screen.contains("100%"));
        assert!(screen.contains("2/2"));
    }

    #[test]
    fn test_render_homophone_hint() {
        let mut reader = reader(&["their"]);
        reader.styler.homophones = true;
        assert!(screen(&reader).contains("possession"));
    }
}
