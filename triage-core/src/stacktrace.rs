//! Canonical printed stacktraces and throw-location fingerprints
//!
//! Reports are compared as text. Every causal frame is printed as a
//! `Caused by: {message}` header followed by one `\tat` line per non-native
//! stack frame, in the order the frames were reported. The same text is
//! embedded in the description of the records we file, so a stored record can
//! be compared against a fresh report without re-parsing anything.

use crate::report::{ExceptionReport, StackLine};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

const UNKNOWN_SOURCE: &str = "Unknown Source";

fn caused_by_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)^\W*caused\W+by").expect("static pattern is valid"))
}

/// A report's causal chain rendered as comparable text
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrintedStacktrace(String);

impl PrintedStacktrace {
    /// Print the causal chain of a report
    pub fn format(report: &ExceptionReport) -> Self {
        let mut output = String::new();
        for frame in &report.frames {
            output.push_str("Caused by: ");
            output.push_str(&frame.message);
            output.push('\n');
            for line in frame.lines.iter().filter(|line| !line.native_method) {
                output.push_str(&Self::format_line(line));
            }
        }
        Self(output)
    }

    /// Wrap text that was printed elsewhere, e.g. a stored record description
    pub fn from_text<S: Into<String>>(text: S) -> Self {
        Self(text.into())
    }

    fn format_line(line: &StackLine) -> String {
        format!(
            "\tat {}.{}({}:{})\n",
            line.class_name,
            line.method_name,
            line.file_name.as_deref().unwrap_or(UNKNOWN_SOURCE),
            line.line_number
        )
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Fingerprint of where the root cause was thrown
    pub fn throw_location(&self) -> &str {
        throw_location(&self.0)
    }
}

impl fmt::Display for PrintedStacktrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PrintedStacktrace {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn is_line_break(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\u{0b}' | '\u{0c}' | '\u{1c}' | '\u{1d}' | '\u{1e}' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}

/// Split on every line boundary, with `\r\n` counting as one.
///
/// Stored records may carry carriage returns or other separators from the
/// reporting client; all of them end a line. A trailing break does not open
/// an extra empty line.
fn split_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((index, c)) = chars.next() {
        if !is_line_break(c) {
            continue;
        }
        lines.push(&text[start..index]);
        start = index + c.len_utf8();
        if c == '\r' {
            if let Some(&(next, '\n')) = chars.peek() {
                chars.next();
                start = next + 1;
            }
        }
    }
    if start < text.len() {
        lines.push(&text[start..]);
    }
    lines
}

/// Extract the throw-location fingerprint from printed stacktrace text.
///
/// The fingerprint is the line right after the last `caused by` header, cut
/// at its first `:`. Without any header the first line is used. A missing
/// line yields an empty fingerprint.
pub fn throw_location(text: &str) -> &str {
    let lines = split_lines(text);
    let index = lines
        .iter()
        .rposition(|line| caused_by_pattern().is_match(line))
        .map_or(0, |last| last + 1);

    match lines.get(index) {
        Some(line) => line.split_once(':').map_or(*line, |(head, _)| head),
        None => "",
    }
}
