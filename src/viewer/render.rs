//! Drawing one viewer frame.

use ratatui::{
    layout::Size,
    style::Stylize,
    text::Line,
    widgets::{Block, Paragraph},
    Frame,
};
use unicode_width::UnicodeWidthChar;

/// Rows taken by the frame border (top and bottom).
pub const BORDER_ROWS: u16 = 2;
/// Columns taken by the frame border (left and right).
pub const BORDER_COLS: u16 = 2;

/// Content rows and columns available inside the border for a terminal of
/// `size`.
pub fn content_size(size: Size) -> (usize, usize) {
    (
        size.height.saturating_sub(BORDER_ROWS) as usize,
        size.width.saturating_sub(BORDER_COLS) as usize,
    )
}

/// Header and footer text around the output.
#[derive(Debug, Clone, Default)]
pub struct FrameInfo<'a> {
    /// e.g. `Every 2s: make test`
    pub title: &'a str,
    /// Wall-clock time of the last resync
    pub updated: Option<&'a str>,
    pub follow: bool,
}

/// Expand tabs and drop other control characters.
pub fn sanitize_line(line: &str, tab_width: usize) -> String {
    let tab_width = tab_width.max(1);
    let mut out = String::with_capacity(line.len());
    let mut column = 0;
    for c in line.chars() {
        if c == '\t' {
            let pad = tab_width - column % tab_width;
            out.extend(std::iter::repeat(' ').take(pad));
            column += pad;
        } else if c.is_control() {
            continue;
        } else {
            out.push(c);
            column += c.width().unwrap_or(0);
        }
    }
    out
}

/// Cut `line` so that it occupies at most `width` terminal columns.
///
/// A wide character that would straddle the edge is dropped entirely.
pub fn truncate_to_width(line: &str, width: usize) -> &str {
    let mut used = 0;
    for (index, c) in line.char_indices() {
        let w = c.width().unwrap_or(0);
        if used + w > width {
            return &line[..index];
        }
        used += w;
    }
    line
}

/// The lines to show for a viewport starting at `offset`, sanitized and
/// truncated. Nothing is produced past the end of `lines`.
pub fn visible_lines(
    lines: &[String],
    offset: usize,
    height: usize,
    width: usize,
    tab_width: usize,
) -> Vec<String> {
    lines
        .iter()
        .skip(offset)
        .take(height)
        .map(|line| truncate_to_width(&sanitize_line(line, tab_width), width).to_string())
        .collect()
}

/// `first-last/total`, 1-based, for the footer.
pub fn position_label(offset: usize, height: usize, total: usize) -> String {
    if total == 0 {
        return "0/0".to_string();
    }
    let first = offset.min(total - 1) + 1;
    let last = (offset + height).min(total);
    format!("{}-{}/{}", first, last.max(first), total)
}

/// Draw the border, header, footer and visible output.
pub fn draw_frame(frame: &mut Frame, visible: &[String], position: &str, info: &FrameInfo) {
    let area = frame.area();

    let mut block = Block::bordered().title(Line::from(format!(" {} ", info.title)).bold());
    if let Some(updated) = info.updated {
        block = block.title(Line::from(format!(" {} ", updated)).right_aligned());
    }
    let footer = if info.follow {
        format!(" {} [follow] ", position)
    } else {
        format!(" {} ", position)
    };
    block = block.title_bottom(Line::from(footer).right_aligned());

    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.width == 0 || inner.height == 0 {
        return;
    }

    let text: Vec<Line> = visible.iter().map(|line| Line::raw(line.as_str())).collect();
    frame.render_widget(Paragraph::new(text), inner);
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn screen_rows(terminal: &Terminal<TestBackend>) -> Vec<String> {
        let buffer = terminal.backend().buffer();
        (0..buffer.area.height)
            .map(|y| {
                (0..buffer.area.width)
                    .map(|x| buffer[(x, y)].symbol())
                    .collect::<String>()
            })
            .collect()
    }

    fn owned(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_content_size_subtracts_border() {
        assert_eq!(content_size(Size::new(80, 24)), (22, 78));
        assert_eq!(content_size(Size::new(1, 1)), (0, 0));
    }

    #[test]
    fn test_sanitize_expands_tabs() {
        assert_eq!(sanitize_line("a\tb", 4), "a   b");
        assert_eq!(sanitize_line("\tx", 8), "        x");
        assert_eq!(sanitize_line("abcd\te", 4), "abcd    e");
    }

    #[test]
    fn test_sanitize_drops_control_characters() {
        assert_eq!(sanitize_line("a\x1b[31mred\x1b[0m", 8), "a[31mred[0m");
        assert_eq!(sanitize_line("x\ry\u{7}", 8), "xy");
    }

    #[test]
    fn test_truncate_to_width() {
        assert_eq!(truncate_to_width("hello world", 5), "hello");
        assert_eq!(truncate_to_width("hi", 5), "hi");
        assert_eq!(truncate_to_width("anything", 0), "");
        // Each CJK character is two columns wide.
        assert_eq!(truncate_to_width("你好世界", 5), "你好");
    }

    #[test]
    fn test_visible_lines_window() {
        let lines = owned(&["0", "1", "2", "3", "4", "5"]);
        assert_eq!(visible_lines(&lines, 2, 3, 10, 8), owned(&["2", "3", "4"]));
        // No padding past the end.
        assert_eq!(visible_lines(&lines, 4, 10, 10, 8), owned(&["4", "5"]));
        assert!(visible_lines(&lines, 10, 3, 10, 8).is_empty());
    }

    #[test]
    fn test_position_label() {
        assert_eq!(position_label(0, 10, 0), "0/0");
        assert_eq!(position_label(0, 10, 3), "1-3/3");
        assert_eq!(position_label(5, 10, 100), "6-15/100");
    }

    #[test]
    fn test_draw_frame_renders_border_and_lines() {
        let mut terminal = Terminal::new(TestBackend::new(20, 5)).unwrap();
        let visible = owned(&["first line", "a line that is far too long"]);
        let visible = visible_lines(&visible, 0, 3, 18, 8);
        let info = FrameInfo {
            title: "cmd",
            updated: None,
            follow: false,
        };

        terminal
            .draw(|frame| draw_frame(frame, &visible, "1-2/2", &info))
            .unwrap();

        let rows = screen_rows(&terminal);
        assert!(rows[0].starts_with("┌ cmd "), "row 0: {:?}", rows[0]);
        assert_eq!(rows[1], "│first line        │");
        assert_eq!(rows[2], "│a line that is far│");
        assert_eq!(rows[3], "│                  │");
        assert!(rows[4].contains("1-2/2"), "row 4: {:?}", rows[4]);
    }

    #[test]
    fn test_draw_frame_shows_follow_marker() {
        let mut terminal = Terminal::new(TestBackend::new(30, 4)).unwrap();
        let info = FrameInfo {
            title: "cmd",
            updated: Some("12:00:00"),
            follow: true,
        };

        terminal
            .draw(|frame| draw_frame(frame, &[], "0/0", &info))
            .unwrap();

        let rows = screen_rows(&terminal);
        assert!(rows[0].contains("12:00:00"), "row 0: {:?}", rows[0]);
        assert!(rows[3].contains("[follow]"), "row 3: {:?}", rows[3]);
    }
}
