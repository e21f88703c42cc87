//! Parsing of assistant replies for display: at most one pipe table is split
//! out of the text, the table is parsed into a [`TableModel`] and the rest is
//! parsed into line blocks with bold spans.

mod blocks;
mod render;
mod split;
mod table;

use once_cell::sync::Lazy;
use regex::Regex;

pub use blocks::{Block, BlockKind, InlineSpan, parse_blocks};
pub use render::render_reply;
pub use split::split_table;
pub use table::{TableModel, parse_table};

// Optional leading pipe, then runs of `-`, `:` or spaces each closed by a pipe,
// with an optional unterminated last run.
static SEPARATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\|?(?:[\s:-]+\|)+[\s:-]*$").expect("valid separator pattern"));

/// Whether `line` is a table header separator such as `|---|:--:|` or `-|-`.
pub(crate) fn is_separator(line: &str) -> bool {
    let line = line.trim();
    line.contains('-') && SEPARATOR.is_match(line)
}

/// Splits on `\n`, dropping the `\r` of CRLF endings. Unlike `str::lines`, a
/// trailing newline still yields a final empty line.
pub(crate) fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    text.split('\n').map(|line| line.strip_suffix('\r').unwrap_or(line))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separator_variants() {
        assert!(is_separator("-|-"));
        assert!(is_separator("|---|---|"));
        assert!(is_separator("| :-- | --: |"));
        assert!(is_separator("---|"));
        assert!(is_separator("  |---|  "));
    }

    #[test]
    fn non_separators() {
        assert!(!is_separator("---"));
        assert!(!is_separator("a|b"));
        assert!(!is_separator("  |  "));
        assert!(!is_separator(""));
        assert!(!is_separator("|-x-|"));
    }
}
