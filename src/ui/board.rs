use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::Line,
    widgets::Paragraph,
};

use crate::models::VisibleWindow;
use crate::ui::style::{TextStyler, to_line};
use crate::window::VirtualizationConfig;

/// Scroll distance of one terminal row.
pub const ROW_PX: f64 = 20.0;

/// Paragraph view for the scroll reader.
///
/// Paragraph `i` owns the scroll range `[i * h, (i + 1) * h)` where `h` is
/// the estimated paragraph height; its wrapped rows are scrolled through in
/// proportion. Only paragraphs inside the virtualized window are styled.
pub struct Board {
    paragraphs: Vec<String>,
    virtualization: VirtualizationConfig,
    styler: TextStyler,
}

impl Board {
    pub fn new(paragraphs: Vec<String>) -> Self {
        Self {
            paragraphs,
            virtualization: VirtualizationConfig::default(),
            styler: TextStyler::default(),
        }
    }

    pub fn with_virtualization(mut self, virtualization: VirtualizationConfig) -> Self {
        self.virtualization = virtualization;
        self
    }

    pub fn with_styler(mut self, styler: TextStyler) -> Self {
        self.styler = styler;
        self
    }

    pub fn paragraph_count(&self) -> usize {
        self.paragraphs.len()
    }

    fn item_height(&self) -> f64 {
        let height = self.virtualization.item_height;
        if height.is_finite() && height > 0.0 { height } else { ROW_PX }
    }

    /// Total scroll extent. One extra viewport lets the last paragraph scroll
    /// fully into view.
    pub fn content_extent(&self, viewport_px: f64) -> f64 {
        self.paragraphs.len() as f64 * self.item_height() + viewport_px.max(0.0)
    }

    pub fn window(&self, offset: f64, rows: u16) -> VisibleWindow {
        self.virtualization
            .window(offset, rows as f64 * ROW_PX, self.paragraphs.len())
    }

    /// Rows visible at `offset` in a `rows` x `width` area.
    pub fn visible_lines(&self, offset: f64, rows: u16, width: u16) -> Vec<Line<'static>> {
        let rows = rows as usize;
        let window = self.window(offset, rows as u16);
        let position = offset.max(0.0) / self.item_height();
        let first = position.floor() as usize;
        if window.is_empty() || first >= self.paragraphs.len() {
            return Vec::new();
        }

        let mut lines = Vec::with_capacity(rows);
        for index in first.max(window.start)..window.end {
            let wrapped = self
                .styler
                .paragraph_lines(&self.paragraphs[index], width as usize);
            let skip = if index == first {
                ((position - first as f64) * wrapped.len() as f64).floor() as usize
            } else {
                lines.push(Line::default());
                0
            };
            lines.extend(wrapped.iter().skip(skip).map(|runs| to_line(runs)));
            if lines.len() >= rows {
                break;
            }
        }
        lines.truncate(rows);
        lines
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, offset: f64) {
        if self.paragraphs.is_empty() {
            self.render_empty(frame, area);
            return;
        }
        let lines = self.visible_lines(offset, area.height, area.width);
        frame.render_widget(Paragraph::new(lines), area);
    }

    fn render_empty(&self, frame: &mut Frame, area: Rect) {
        let paragraph = Paragraph::new(Line::from("No content loaded"))
            .style(Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC));
        frame.render_widget(paragraph, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_text(line: &Line) -> String {
        line.spans.iter().map(|span| span.content.as_ref()).collect()
    }

    fn board(count: usize) -> Board {
        let paragraphs = (0..count).map(|i| format!("paragraph {i}")).collect();
        Board::new(paragraphs).with_virtualization(VirtualizationConfig {
            enabled: true,
            item_height: 100.0,
            buffer: 1,
            max_render: 10,
        })
    }

    #[test]
    fn test_board_content_extent() {
        assert_eq!(board(10).content_extent(400.0), 1_400.0);
        assert_eq!(Board::new(Vec::new()).content_extent(400.0), 400.0);
    }

    #[test]
    fn test_board_visible_lines_from_top() {
        let lines = board(10).visible_lines(0.0, 3, 40);
        let texts: Vec<String> = lines.iter().map(line_text).collect();
        assert_eq!(texts, vec!["paragraph 0", "", "paragraph 1"]);
    }

    #[test]
    fn test_board_visible_lines_start_at_scrolled_paragraph() {
        let lines = board(10).visible_lines(250.0, 2, 40);
        assert_eq!(line_text(&lines[0]), "paragraph 2");
    }

    #[test]
    fn test_board_partial_paragraph_skips_rows() {
        let board = Board::new(vec!["one two three four".to_string()]).with_virtualization(
            VirtualizationConfig {
                item_height: 100.0,
                ..VirtualizationConfig::default()
            },
        );
        // Width 5 wraps to one word per row; half way through skips two.
        let lines = board.visible_lines(50.0, 5, 5);
        let texts: Vec<String> = lines.iter().map(line_text).collect();
        assert_eq!(texts, vec!["three", "four"]);
    }

    #[test]
    fn test_board_past_the_end_is_empty() {
        assert!(board(3).visible_lines(5_000.0, 10, 40).is_empty());
    }

    #[test]
    fn test_board_window_is_capped() {
        let window = board(100).window(0.0, 200);
        assert_eq!(window.len(), 10);
    }
}
