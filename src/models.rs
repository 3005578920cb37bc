/// Model identifiers the Puter endpoint is known to accept.
///
/// The endpoint itself decides what it serves, so this list is advisory:
/// unknown names are still forwarded, with a warning in the transcript.
pub const KNOWN_MODELS: [&str; 5] = [
    "claude-sonnet-4",
    "claude-3-5-sonnet",
    "claude-3-opus",
    "gpt-4",
    "gpt-3.5-turbo",
];

pub const DEFAULT_MODEL: &str = "claude-sonnet-4";

pub fn is_known(model: &str) -> bool {
    KNOWN_MODELS.contains(&model)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_model_is_known() {
        assert!(is_known(DEFAULT_MODEL));
        assert!(!is_known("made-up-model"));
    }
}
