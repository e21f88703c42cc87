use super::split_lines;
use once_cell::sync::Lazy;
use regex::Regex;

static BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.*?)\*\*").expect("valid bold pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// Level 1 to 3.
    Heading(u8),
    Paragraph,
    Spacer,
}

/// One line of a reply, classified for styling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub index: usize,
    pub kind: BlockKind,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InlineSpan {
    Plain(String),
    Bold(String),
}

impl Block {
    /// Splits the content on `**...**` pairs, matched left to right and
    /// non-greedily. Markers are never nested.
    pub fn spans(&self) -> Vec<InlineSpan> {
        let mut spans = Vec::new();
        let mut last = 0;

        for caps in BOLD.captures_iter(&self.content) {
            let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            if whole.start() > last {
                spans.push(InlineSpan::Plain(
                    self.content[last..whole.start()].to_string(),
                ));
            }
            if !inner.as_str().is_empty() {
                spans.push(InlineSpan::Bold(inner.as_str().to_string()));
            }
            last = whole.end();
        }

        if last < self.content.len() {
            spans.push(InlineSpan::Plain(self.content[last..].to_string()));
        }

        spans
    }
}

fn classify(line: &str) -> (BlockKind, &str) {
    if let Some(rest) = line.strip_prefix("### ") {
        (BlockKind::Heading(3), rest)
    } else if let Some(rest) = line.strip_prefix("## ") {
        (BlockKind::Heading(2), rest)
    } else if let Some(rest) = line.strip_prefix("# ") {
        (BlockKind::Heading(1), rest)
    } else if line.trim().is_empty() {
        (BlockKind::Spacer, "")
    } else {
        (BlockKind::Paragraph, line)
    }
}

/// Classifies every line of `text` as a heading, paragraph or spacer block.
pub fn parse_blocks(text: &str) -> Vec<Block> {
    split_lines(text)
        .enumerate()
        .map(|(index, line)| {
            let (kind, content) = classify(line);
            Block {
                index,
                kind,
                content: content.to_string(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<(BlockKind, String)> {
        parse_blocks(text)
            .into_iter()
            .map(|b| (b.kind, b.content))
            .collect()
    }

    #[test]
    fn heading_spacer_paragraph() {
        assert_eq!(
            kinds("# Title\n\nbody"),
            vec![
                (BlockKind::Heading(1), "Title".to_string()),
                (BlockKind::Spacer, String::new()),
                (BlockKind::Paragraph, "body".to_string()),
            ]
        );
    }

    #[test]
    fn heading_levels_and_non_headings() {
        let blocks = kinds("### Three\n## Two\n#hashtag\n   \n####  Four");
        assert_eq!(blocks[0], (BlockKind::Heading(3), "Three".to_string()));
        assert_eq!(blocks[1], (BlockKind::Heading(2), "Two".to_string()));
        assert_eq!(blocks[2], (BlockKind::Paragraph, "#hashtag".to_string()));
        assert_eq!(blocks[3].0, BlockKind::Spacer);
        assert_eq!(blocks[4], (BlockKind::Paragraph, "####  Four".to_string()));
    }

    #[test]
    fn crlf_endings_are_not_part_of_content() {
        assert_eq!(
            kinds("# T\r\nbody\r\n\r\n**b**"),
            vec![
                (BlockKind::Heading(1), "T".to_string()),
                (BlockKind::Paragraph, "body".to_string()),
                (BlockKind::Spacer, String::new()),
                (BlockKind::Paragraph, "**b**".to_string()),
            ]
        );
    }

    #[test]
    fn indices_follow_lines() {
        let indices: Vec<usize> = parse_blocks("a\nb\n\nc").iter().map(|b| b.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
    }

    #[test]
    fn parsing_is_deterministic() {
        let text = "## Sleep\nBabies need **a lot** of sleep.\n\n- naps";
        assert_eq!(parse_blocks(text), parse_blocks(text));
    }

    #[test]
    fn bold_spans_alternate() {
        let block = &parse_blocks("Offer **water** and **rest** often")[0];
        assert_eq!(
            block.spans(),
            vec![
                InlineSpan::Plain("Offer ".into()),
                InlineSpan::Bold("water".into()),
                InlineSpan::Plain(" and ".into()),
                InlineSpan::Bold("rest".into()),
                InlineSpan::Plain(" often".into()),
            ]
        );
    }

    #[test]
    fn unmatched_marker_stays_plain() {
        let block = &parse_blocks("**bold** and **dangling")[0];
        assert_eq!(
            block.spans(),
            vec![
                InlineSpan::Bold("bold".into()),
                InlineSpan::Plain(" and **dangling".into()),
            ]
        );
    }

    #[test]
    fn heading_content_gets_spans() {
        let block = &parse_blocks("## **Fever** guide")[0];
        assert_eq!(block.kind, BlockKind::Heading(2));
        assert_eq!(block.spans()[0], InlineSpan::Bold("Fever".into()));
    }
}
