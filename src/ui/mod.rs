pub mod board;
pub mod flash;
pub mod scroll;
pub mod style;

pub use flash::FlashReader;
pub use scroll::ScrollReader;

use ratatui::{Terminal, backend::CrosstermBackend};
use std::io::{self, Stdout};
use std::time::Duration;

pub type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Poll interval while nothing is scheduled.
pub const IDLE_POLL: Duration = Duration::from_millis(250);

/// Switch to raw mode on the alternate screen.
pub fn enter() -> eyre::Result<Tui> {
    crossterm::terminal::enable_raw_mode()?;
    crossterm::execute!(io::stdout(), crossterm::terminal::EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;
    terminal.clear()?;
    terminal.hide_cursor()?;
    Ok(terminal)
}

/// Restore the terminal left by [`enter`].
pub fn leave(terminal: &mut Tui) -> eyre::Result<()> {
    terminal.clear()?;
    terminal.show_cursor()?;
    crossterm::execute!(io::stdout(), crossterm::terminal::LeaveAlternateScreen)?;
    crossterm::terminal::disable_raw_mode()?;
    Ok(())
}

/// Title centred in the space left of `right_text`, which is right-aligned.
pub fn header_line(title: &str, right_text: Option<&str>, width: u16) -> String {
    let width = width as usize;
    if width == 0 {
        return String::new();
    }

    let mut buffer = vec![' '; width];
    let right_len = right_text.map(|text| text.chars().count()).unwrap_or(0);
    let content_width = if right_len > 0 {
        width.saturating_sub(right_len + 1)
    } else {
        width
    };

    let title_chars: Vec<char> = title.chars().take(content_width).collect();
    let title_start = content_width.saturating_sub(title_chars.len()) / 2;
    for (i, ch) in title_chars.into_iter().enumerate() {
        if let Some(slot) = buffer.get_mut(title_start + i) {
            *slot = ch;
        }
    }

    if let Some(right_text) = right_text {
        let start = width.saturating_sub(right_len);
        for (i, ch) in right_text.chars().enumerate() {
            if let Some(slot) = buffer.get_mut(start + i) {
                *slot = ch;
            }
        }
    }

    buffer.into_iter().collect()
}
