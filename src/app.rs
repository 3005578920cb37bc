use std::io;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::{Frame, Terminal};
use tracing::info;

use crate::models;
use crate::session::ChatSession;
use crate::ui::{
    get_help_text, Composer, ComposerResult, ParsedCommand, SlashCommand, TranscriptView,
};

/// Top-level TUI application: one session, a transcript pane and a composer
pub struct App {
    session: ChatSession,
    composer: Composer,
    should_exit: bool,
}

impl App {
    pub fn new(session: ChatSession) -> Self {
        Self {
            session,
            composer: Composer::new("Type a message, or / for commands...".to_string()),
            should_exit: false,
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_exit = true;
            return;
        }

        match self.composer.handle_key(key) {
            ComposerResult::Submitted(input) => {
                self.session.submit(&input);
            }
            ComposerResult::Command(command) => self.handle_slash_command(command),
            ComposerResult::None => {}
        }
    }

    fn handle_slash_command(&mut self, command: ParsedCommand) {
        match command.command {
            SlashCommand::Model => match command.argument() {
                Some(model) => self.session.set_model(model.trim().to_string()),
                None => self
                    .session
                    .notice("Usage: /model <name>. See /models for known names.".to_string()),
            },
            SlashCommand::Models => {
                let mut text = String::from("Known models:\n");
                for model in models::KNOWN_MODELS {
                    text.push_str(&format!("  {}\n", model));
                }
                self.session.notice(text);
            }
            SlashCommand::Help => {
                self.session.notice(get_help_text());
            }
            SlashCommand::Bye => {
                self.should_exit = true;
            }
        }
    }

    fn render(&self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(10),   // Transcript
                Constraint::Length(3), // Composer
            ])
            .split(frame.size());

        let view = TranscriptView::new(
            self.session.transcript(),
            self.session.pending(),
            self.session.model(),
        );
        frame.render_widget(view, chunks[0]);
        frame.render_widget(self.composer.clone(), chunks[1]);
    }
}

/// Run the TUI until the user exits
pub async fn run(mut app: App) -> Result<()> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("Failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;

    let result = event_loop(&mut app, &mut terminal).await;

    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("Failed to leave alternate screen")?;
    terminal.show_cursor().context("Failed to restore cursor")?;

    result
}

async fn event_loop(
    app: &mut App,
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
) -> Result<()> {
    info!("starting chat session");

    loop {
        // Settled calls append their replies before each draw.
        app.session.drain_outcomes();

        terminal.draw(|frame| app.render(frame))?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                app.handle_key(key);
            }
        }

        if app.should_exit {
            info!("session ended");
            return Ok(());
        }
    }
}
