use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    widgets::Paragraph,
};
use std::time::{Duration, Instant};

use crate::playback::{PlayState, ScrollScheduler, Speech};
use crate::ui::board::{Board, ROW_PX};
use crate::ui::{IDLE_POLL, Tui, header_line};

/// Redraw interval while scrolling.
const FRAME_INTERVAL: Duration = Duration::from_millis(33);
pub const SPEED_STEP: f64 = 10.0;
/// Header and status rows around the text.
const CHROME_ROWS: u16 = 2;

const HELP: &str = "space play/pause  \u{2191}/\u{2193} scroll  \u{2190}/\u{2192} speed  r top  q quit";

/// Continuous-scroll reader.
pub struct ScrollReader<S: Speech> {
    title: String,
    scheduler: ScrollScheduler<S>,
    board: Board,
    viewport_rows: u16,
    should_quit: bool,
}

impl<S: Speech> ScrollReader<S> {
    pub fn new(title: impl Into<String>, scheduler: ScrollScheduler<S>, board: Board) -> Self {
        Self {
            title: title.into(),
            scheduler,
            board,
            viewport_rows: 0,
            should_quit: false,
        }
    }

    pub fn scheduler(&self) -> &ScrollScheduler<S> {
        &self.scheduler
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Report the terminal height so the scroll extent matches the screen.
    pub fn resize(&mut self, height: u16) {
        self.viewport_rows = height.saturating_sub(CHROME_ROWS);
        let viewport = self.viewport_px();
        self.scheduler
            .set_extent(self.board.content_extent(viewport), viewport);
    }

    fn viewport_px(&self) -> f64 {
        self.viewport_rows as f64 * ROW_PX
    }

    pub fn run(&mut self, terminal: &mut Tui) -> eyre::Result<()> {
        loop {
            self.resize(terminal.size()?.height);
            self.scheduler.frame(Instant::now());
            terminal.draw(|frame| self.render(frame))?;
            if self.should_quit {
                break;
            }

            let timeout = if self.scheduler.is_playing() {
                FRAME_INTERVAL
            } else {
                IDLE_POLL
            };
            if !event::poll(timeout)? {
                continue;
            }
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    self.handle_key(key);
                }
            }
        }
        self.scheduler.stop();
        Ok(())
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        let page = self.viewport_px().max(ROW_PX);
        let scheduler = &mut self.scheduler;
        match key.code {
            KeyCode::Char(' ') => scheduler.toggle(),
            KeyCode::Up | KeyCode::Char('k') => scheduler.scroll_up(),
            KeyCode::Down | KeyCode::Char('j') => scheduler.scroll_down(),
            KeyCode::PageUp => scheduler.scroll_by(-page),
            KeyCode::PageDown => scheduler.scroll_by(page),
            KeyCode::Right | KeyCode::Char('l') => {
                scheduler.set_speed(scheduler.speed() + SPEED_STEP)
            }
            KeyCode::Left | KeyCode::Char('h') => {
                scheduler.set_speed(scheduler.speed() - SPEED_STEP)
            }
            KeyCode::Char('r') => {
                scheduler.stop();
                scheduler.scroll_by(-scheduler.position());
            }
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            _ => {}
        }
    }

    /// Percent of the text scrolled past.
    pub fn progress(&self) -> f64 {
        let scrollable = self.board.content_extent(self.viewport_px()) - self.viewport_px();
        if scrollable <= 0.0 {
            return 0.0;
        }
        (self.scheduler.position() / scrollable * 100.0).clamp(0.0, 100.0)
    }

    pub fn render(&self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(frame.area());

        let percent = format!("{:.0}%", self.progress());
        frame.render_widget(
            Paragraph::new(header_line(&self.title, Some(&percent), chunks[0].width)),
            chunks[0],
        );

        let body = chunks[1];
        let padding = if body.width <= 20 { 0 } else { (body.width / 10).max(2) };
        let text_area = Rect {
            x: body.x + padding,
            y: body.y,
            width: body.width.saturating_sub(padding * 2),
            height: body.height,
        };
        self.board.render(frame, text_area, self.scheduler.position());

        let state = match self.scheduler.state() {
            PlayState::Playing => "playing",
            PlayState::Stopped => "paused",
        };
        let status = format!("{:.0} px/s  {}  |  {}", self.scheduler.speed(), state, HELP);
        frame.render_widget(
            Paragraph::new(status).style(Style::default().fg(Color::DarkGray)),
            chunks[2],
        );
    }
}
