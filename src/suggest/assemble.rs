//! Commit message assembly from per-file suggestions.

use super::dispatch::SuggestionSet;

/// Join per-file messages into one commit message.
///
/// Each file's words are joined with single spaces, and files are separated
/// by `endline` newlines in dispatch order. `echo` receives each file's line
/// as it is appended.
pub fn assemble_message<F>(suggestions: &SuggestionSet, endline: usize, mut echo: F) -> String
where
    F: FnMut(&str),
{
    let separator = "\n".repeat(endline);
    let mut message = String::new();

    for (i, entry) in suggestions.iter().enumerate() {
        if i > 0 {
            message.push_str(&separator);
        }
        let line = entry.message.text();
        echo(&line);
        message.push_str(&line);
    }

    message
}
