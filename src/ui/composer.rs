use crate::ui::commands::{parse_slash_command, ParsedCommand};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};

/// Result returned when the user interacts with the composer
#[derive(Debug, PartialEq)]
pub enum ComposerResult {
    Submitted(String),
    Command(ParsedCommand),
    None,
}

/// Single-line input state
#[derive(Debug, Clone, Default)]
struct InputState {
    content: String,
    cursor_position: usize,
}

/// Text input control: the session reads and clears it on submission
#[derive(Clone)]
pub struct Composer {
    state: InputState,
    placeholder: String,
    has_focus: bool,
}

impl Composer {
    pub fn new(placeholder: String) -> Self {
        Self {
            state: InputState::default(),
            placeholder,
            has_focus: true,
        }
    }

    /// Handle key input
    pub fn handle_key(&mut self, key: KeyEvent) -> ComposerResult {
        if key.kind != KeyEventKind::Press {
            return ComposerResult::None;
        }

        match key.code {
            KeyCode::Enter => {
                if !self.state.content.trim().is_empty() {
                    let content = self.state.content.clone();
                    self.state.content.clear();
                    self.state.cursor_position = 0;
                    if let Some(command) = parse_slash_command(content.trim()) {
                        return ComposerResult::Command(command);
                    }
                    return ComposerResult::Submitted(content);
                }
                // Whitespace-only input: read-and-clear still applies.
                self.state.content.clear();
                self.state.cursor_position = 0;
            }
            KeyCode::Char(c) => {
                if key.modifiers.contains(KeyModifiers::CONTROL) {
                    return ComposerResult::None;
                }
                self.state.content.insert(self.state.cursor_position, c);
                self.state.cursor_position += c.len_utf8();
            }
            KeyCode::Backspace => {
                if let Some(prev) = self.prev_boundary() {
                    self.state.content.remove(prev);
                    self.state.cursor_position = prev;
                }
            }
            KeyCode::Delete => {
                if self.state.cursor_position < self.state.content.len() {
                    self.state.content.remove(self.state.cursor_position);
                }
            }
            KeyCode::Left => {
                if let Some(prev) = self.prev_boundary() {
                    self.state.cursor_position = prev;
                }
            }
            KeyCode::Right => {
                if let Some(next) = self.next_boundary() {
                    self.state.cursor_position = next;
                }
            }
            KeyCode::Home => {
                self.state.cursor_position = 0;
            }
            KeyCode::End => {
                self.state.cursor_position = self.state.content.len();
            }
            _ => {}
        }

        ComposerResult::None
    }

    /// Set focus state
    #[allow(dead_code)]
    pub fn set_focus(&mut self, has_focus: bool) {
        self.has_focus = has_focus;
    }

    /// Byte index of the char boundary before the cursor
    fn prev_boundary(&self) -> Option<usize> {
        self.state.content[..self.state.cursor_position]
            .char_indices()
            .next_back()
            .map(|(index, _)| index)
    }

    /// Byte index of the char boundary after the cursor
    fn next_boundary(&self) -> Option<usize> {
        self.state.content[self.state.cursor_position..]
            .chars()
            .next()
            .map(|c| self.state.cursor_position + c.len_utf8())
    }
}

impl Widget for Composer {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title("Message")
            .style(if self.has_focus {
                Style::default().fg(Color::Green)
            } else {
                Style::default().fg(Color::Gray)
            });

        let inner_area = block.inner(area);
        block.render(area, buf);

        if self.state.content.is_empty() {
            let placeholder_line = Line::from(vec![Span::styled(
                &self.placeholder,
                Style::default().fg(Color::DarkGray),
            )]);
            buf.set_line(inner_area.x, inner_area.y, &placeholder_line, inner_area.width);
        } else {
            let mut content = self.state.content.clone();
            if self.has_focus {
                content.insert(self.state.cursor_position.min(content.len()), '▌');
            }
            let line = Line::from(vec![Span::raw(content)]);
            buf.set_line(inner_area.x, inner_area.y, &line, inner_area.width);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::commands::SlashCommand;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(composer: &mut Composer, text: &str) {
        for c in text.chars() {
            composer.handle_key(press(KeyCode::Char(c)));
        }
    }

    #[test]
    fn enter_submits_and_clears_the_input() {
        let mut composer = Composer::new("...".to_string());
        type_text(&mut composer, "Hello");

        assert_eq!(
            composer.handle_key(press(KeyCode::Enter)),
            ComposerResult::Submitted("Hello".to_string())
        );
        // Input buffer is cleared for the next turn.
        assert_eq!(
            composer.handle_key(press(KeyCode::Enter)),
            ComposerResult::None
        );
    }

    #[test]
    fn slash_input_parses_as_command() {
        let mut composer = Composer::new("...".to_string());
        type_text(&mut composer, "/model gpt-4");

        match composer.handle_key(press(KeyCode::Enter)) {
            ComposerResult::Command(parsed) => {
                assert_eq!(parsed.command, SlashCommand::Model);
                assert_eq!(parsed.argument(), Some("gpt-4"));
            }
            other => panic!("expected command, got {:?}", other),
        }
    }

    #[test]
    fn backspace_handles_multibyte_chars() {
        let mut composer = Composer::new("...".to_string());
        type_text(&mut composer, "héllo");
        for _ in 0..5 {
            composer.handle_key(press(KeyCode::Backspace));
        }

        assert_eq!(
            composer.handle_key(press(KeyCode::Enter)),
            ComposerResult::None
        );
    }
}
