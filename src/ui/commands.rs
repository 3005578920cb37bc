use std::str::FromStr;

use strum::{AsRefStr, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

/// Commands that can be invoked by starting a message with a leading slash.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, EnumIter, AsRefStr, IntoStaticStr,
)]
#[strum(serialize_all = "kebab-case")]
pub enum SlashCommand {
    /// Switch to a different model
    Model,
    /// List the known model identifiers
    Models,
    /// Show help
    Help,
    /// Exit the application
    Bye,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub command: SlashCommand,
    pub argument: Option<String>,
}

impl ParsedCommand {
    pub fn argument(&self) -> Option<&str> {
        self.argument.as_deref()
    }
}

impl SlashCommand {
    /// User-visible description shown in help.
    pub fn description(self) -> &'static str {
        match self {
            SlashCommand::Model => "switch to a different model, e.g. /model gpt-4",
            SlashCommand::Models => "list the known model identifiers",
            SlashCommand::Help => "show available commands",
            SlashCommand::Bye => "exit the application",
        }
    }

    /// Command string without the leading '/'.
    pub fn command(self) -> &'static str {
        self.into()
    }
}

/// Return all built-in commands paired with their command string.
pub fn built_in_slash_commands() -> Vec<(&'static str, SlashCommand)> {
    SlashCommand::iter().map(|c| (c.command(), c)).collect()
}

/// Parse a slash command from user input
pub fn parse_slash_command(input: &str) -> Option<ParsedCommand> {
    if !input.starts_with('/') {
        return None;
    }

    let mut parts = input[1..].split_whitespace();
    let head = parts.next()?;
    let rest: Vec<String> = parts.map(|s| s.to_string()).collect();

    let command = SlashCommand::from_str(head)
        .ok()
        .or_else(|| match head.to_lowercase().as_str() {
            "q" | "quit" | "exit" => Some(SlashCommand::Bye),
            "h" => Some(SlashCommand::Help),
            "m" => Some(SlashCommand::Model),
            _ => None,
        })?;

    let argument = if rest.is_empty() {
        None
    } else {
        Some(rest.join(" "))
    };

    Some(ParsedCommand { command, argument })
}

/// Get help text for all available commands
pub fn get_help_text() -> String {
    let mut help = String::from("Available commands:\n");
    for (command_str, command) in built_in_slash_commands() {
        help.push_str(&format!("/{} - {}\n", command_str, command.description()));
    }

    help.push_str("\nAliases: /q for /bye, /h for /help, /m for /model");

    help
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_command_with_argument() {
        let parsed = parse_slash_command("/model claude-3-opus").unwrap();
        assert_eq!(parsed.command, SlashCommand::Model);
        assert_eq!(parsed.argument(), Some("claude-3-opus"));
    }

    #[test]
    fn parses_aliases() {
        assert_eq!(
            parse_slash_command("/q").map(|p| p.command),
            Some(SlashCommand::Bye)
        );
        assert_eq!(
            parse_slash_command("/m gpt-4").map(|p| p.command),
            Some(SlashCommand::Model)
        );
    }

    #[test]
    fn plain_text_is_not_a_command() {
        assert_eq!(parse_slash_command("hello there"), None);
        assert_eq!(parse_slash_command("/nonsense"), None);
    }
}
