//! Line unfolding: physical lines → logical lines.
//!
//! A physical line starting with a single space or tab continues the previous
//! logical line. Exactly that one whitespace character is removed and the rest
//! is appended with no separator.

use std::iter::Peekable;
use std::str::Lines;

/// One unfolded line plus the 1-based physical line number it starts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalLine {
    pub number: usize,
    pub text: String,
}

/// Lazy iterator over the logical lines of a text.
///
/// Cloning an `Unfolder` restarts nothing; it forks the iteration at the
/// current position. Call [`unfold`] again to start over.
#[derive(Debug, Clone)]
pub struct Unfolder<'a> {
    lines: Peekable<Lines<'a>>,
    physical: usize,
}

/// Unfold `text` into logical lines. Accepts `\n` and `\r\n` line breaks;
/// empty physical lines are skipped.
pub fn unfold(text: &str) -> Unfolder<'_> {
    Unfolder {
        lines: text.lines().peekable(),
        physical: 0,
    }
}

fn continuation(line: &str) -> Option<&str> {
    line.strip_prefix(' ').or_else(|| line.strip_prefix('\t'))
}

impl Iterator for Unfolder<'_> {
    type Item = LogicalLine;

    fn next(&mut self) -> Option<LogicalLine> {
        loop {
            let line = self.lines.next()?;
            self.physical += 1;
            if line.is_empty() {
                continue;
            }

            let number = self.physical;
            // A continuation with nothing before it opens its own logical line.
            let mut text = continuation(line).unwrap_or(line).to_string();

            while let Some(rest) = self.lines.peek().copied().and_then(continuation) {
                text.push_str(rest);
                self.lines.next();
                self.physical += 1;
            }

            return Some(LogicalLine { number, text });
        }
    }
}
