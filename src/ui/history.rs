//! Transcript display component

use crate::session::{Message, MessageOrigin};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};

/// Renders the append-only transcript, anchored to the newest messages
#[derive(Clone)]
pub struct TranscriptView {
    messages: Vec<Message>,
    pending: usize,
    model: String,
}

impl TranscriptView {
    pub fn new(messages: &[Message], pending: usize, model: &str) -> Self {
        Self {
            messages: messages.to_vec(),
            pending,
            model: model.to_string(),
        }
    }

    /// Render a single message into lines
    fn render_message(&self, message: &Message, width: u16) -> Vec<Line<'static>> {
        let mut lines = Vec::new();

        let label = match message.origin {
            MessageOrigin::User => "you",
            MessageOrigin::Assistant => "ai",
            MessageOrigin::SystemNotice => "notice",
        };

        let timestamp = message.timestamp.format("%H:%M:%S").to_string();
        let header = format!("{} {} {}", label, timestamp, "─".repeat(20));

        lines.push(Line::from(vec![Span::styled(
            header,
            Style::default().fg(Color::DarkGray),
        )]));

        let content_lines = wrap_text(&message.text, width.saturating_sub(2) as usize);
        for content_line in content_lines {
            lines.push(Line::from(vec![
                Span::raw("  "),
                Span::styled(content_line, self.content_style(message.origin)),
            ]));
        }

        lines
    }

    fn content_style(&self, origin: MessageOrigin) -> Style {
        match origin {
            MessageOrigin::User => Style::default().fg(Color::Blue),
            MessageOrigin::Assistant => Style::default().fg(Color::Green),
            MessageOrigin::SystemNotice => Style::default().fg(Color::Yellow),
        }
    }
}

impl Widget for TranscriptView {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!("Puter AI Chat — {}", self.model));

        let inner_area = block.inner(area);
        block.render(area, buf);

        let mut all_lines: Vec<Line> = Vec::new();
        for message in self.messages.iter() {
            let mut lines = self.render_message(message, inner_area.width);
            all_lines.append(&mut lines);
            // spacing between messages
            all_lines.push(Line::from(vec![Span::raw("")]));
        }

        if self.pending > 0 {
            let waiting = if self.pending == 1 {
                "… waiting for a reply".to_string()
            } else {
                format!("… waiting for {} replies", self.pending)
            };
            all_lines.push(Line::from(vec![Span::styled(
                waiting,
                Style::default().fg(Color::DarkGray),
            )]));
        }

        // Show the tail of the transcript that fits.
        let height = inner_area.height as usize;
        let total = all_lines.len();
        let start = total.saturating_sub(height);
        let visible = &all_lines[start..];

        for (i, line) in visible.iter().enumerate() {
            buf.set_line(inner_area.x, inner_area.y + i as u16, line, inner_area.width);
        }
    }
}

/// Wrap text to fit within the given width
fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut current_line = String::new();

        for word in paragraph.split_whitespace() {
            if current_line.chars().count() + word.chars().count() + 1 <= width {
                if !current_line.is_empty() {
                    current_line.push(' ');
                }
                current_line.push_str(word);
            } else {
                if !current_line.is_empty() {
                    lines.push(current_line);
                    current_line = String::new();
                }
                current_line.push_str(word);
            }
        }

        lines.push(current_line);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_long_lines_on_word_boundaries() {
        let lines = wrap_text("one two three four", 9);
        assert_eq!(lines, vec!["one two", "three", "four"]);
    }

    #[test]
    fn preserves_explicit_newlines() {
        let lines = wrap_text("first\nsecond", 40);
        assert_eq!(lines, vec!["first", "second"]);
    }
}
