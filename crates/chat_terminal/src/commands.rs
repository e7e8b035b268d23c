#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Clear,
    Quit,
    Unknown(String),
}

/// Bare words that also end the session.
const QUIT_WORDS: [&str; 3] = ["sair", "exit", "quit"];

pub fn parse_command(input: &str) -> Option<Command> {
    let trimmed = input.trim();
    if QUIT_WORDS
        .iter()
        .any(|word| trimmed.eq_ignore_ascii_case(word))
    {
        return Some(Command::Quit);
    }
    if !trimmed.starts_with('/') {
        return None;
    }

    let command = trimmed
        .split_whitespace()
        .next()
        .unwrap_or(trimmed)
        .to_ascii_lowercase();

    let parsed = match command.as_str() {
        "/help" | "/ajuda" => Command::Help,
        "/clear" | "/limpar" => Command::Clear,
        "/quit" | "/sair" => Command::Quit,
        _ => Command::Unknown(command),
    };

    Some(parsed)
}

/// Answers that confirm a prompt; anything else declines.
pub fn is_confirmation(input: &str) -> bool {
    matches!(
        input.trim().to_lowercase().as_str(),
        "s" | "sim" | "y" | "yes"
    )
}
