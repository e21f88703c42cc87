use super::{is_separator, split_lines};

/// A reply split around its first pipe table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSegments {
    pub before: String,
    pub table: Option<String>,
    pub after: Option<String>,
}

impl TextSegments {
    fn plain(text: &str) -> Self {
        Self {
            before: text.to_string(),
            table: None,
            after: None,
        }
    }
}

/// Locates the first pipe table in `text` and partitions the text around it.
///
/// A table starts on a line containing `|` that is directly followed by a
/// separator line, and runs through the last contiguous line that still
/// contains a pipe. Anything table-like after that region is left in `after`.
pub fn split_table(text: &str) -> TextSegments {
    let lines: Vec<&str> = split_lines(text).collect();

    let Some(start) = lines
        .windows(2)
        .position(|pair| pair[0].contains('|') && is_separator(pair[1]))
    else {
        return TextSegments::plain(text);
    };

    let mut end = start + 1;
    while end + 1 < lines.len() && lines[end + 1].contains('|') {
        end += 1;
    }

    TextSegments {
        before: lines[..start].join("\n").trim().to_string(),
        table: Some(lines[start..=end].join("\n")),
        after: Some(lines[end + 1..].join("\n").trim().to_string()),
    }
}
