//! Pattern helpers for prompt and echo detection.

use regex::bytes::Regex;

/// Longest command suffix used to recognise an echo. Devices wrap or
/// truncate long command lines, so only the tail is reliable.
pub const ECHO_WINDOW: usize = 32;

/// Compile a prompt pattern string into a regex.
///
/// Prompts are only meaningful at the end of the received text, so the
/// pattern is anchored to the end of the buffer unless it already is.
pub fn compile_prompt_pattern(pattern: &str) -> Result<Regex, regex::Error> {
    let pattern = if pattern.ends_with('$') {
        pattern.to_string()
    } else {
        format!("(?:{pattern})\\s*$")
    };
    Regex::new(&pattern)
}

/// Literal pattern matching the echo of `command`.
pub fn echo_pattern(command: &str) -> Result<Regex, regex::Error> {
    let command = command.trim();
    let skip = command.chars().count().saturating_sub(ECHO_WINDOW);
    let window: String = command.chars().skip(skip).collect();
    Regex::new(&regex::escape(&window))
}

/// Case-insensitive literal alternation, for "output contains one of" checks.
pub fn any_literal<S: AsRef<str>>(words: &[S]) -> Result<Regex, regex::Error> {
    let alternation = words
        .iter()
        .map(|w| regex::escape(w.as_ref()))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!("(?i){alternation}"))
}
