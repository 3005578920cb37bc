//! Terminal UI components for the chat interface

pub mod commands;
pub mod composer;
pub mod history;

pub use commands::{get_help_text, parse_slash_command, ParsedCommand, SlashCommand};
pub use composer::{Composer, ComposerResult};
pub use history::TranscriptView;
