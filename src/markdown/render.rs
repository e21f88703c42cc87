use super::{Block, BlockKind, InlineSpan, TableModel, parse_blocks, parse_table, split_table};
use comfy_table::{ContentArrangement, Table};

const BOLD_ON: &str = "\x1b[1m";
const BOLD_OFF: &str = "\x1b[22m";
const UNDERLINE_ON: &str = "\x1b[4m";
const UNDERLINE_OFF: &str = "\x1b[24m";

fn render_spans(block: &Block) -> String {
    let mut out = String::new();
    for span in block.spans() {
        match span {
            InlineSpan::Plain(text) => out.push_str(&text),
            InlineSpan::Bold(text) => {
                out.push_str(BOLD_ON);
                out.push_str(&text);
                out.push_str(BOLD_OFF);
            }
        }
    }
    out
}

fn render_blocks(text: &str, out: &mut Vec<String>) {
    for block in parse_blocks(text) {
        match block.kind {
            BlockKind::Heading(1) => {
                let text = render_spans(&block);
                out.push(format!("{UNDERLINE_ON}{BOLD_ON}{text}{BOLD_OFF}{UNDERLINE_OFF}"));
            }
            BlockKind::Heading(_) => {
                out.push(format!("{BOLD_ON}{}{BOLD_OFF}", render_spans(&block)));
            }
            BlockKind::Paragraph => out.push(render_spans(&block)),
            BlockKind::Spacer => out.push(String::new()),
        }
    }
}

fn render_table(model: &TableModel, width: u16) -> Vec<String> {
    let mut table = Table::new();
    table.set_width(width);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    if !model.headers.is_empty() {
        table.set_header(&model.headers);
    }
    for row in &model.rows {
        table.add_row(row);
    }

    table.to_string().lines().map(String::from).collect()
}

/// Renders an assistant reply for a terminal of `width` columns.
pub fn render_reply(text: &str, width: u16) -> String {
    let segments = split_table(text);
    let mut lines = Vec::new();

    if !segments.before.is_empty() {
        render_blocks(&segments.before, &mut lines);
    }

    if let Some(region) = segments.table.as_deref() {
        if !lines.is_empty() {
            lines.push(String::new());
        }
        match parse_table(region) {
            Some(model) => lines.extend(render_table(&model, width)),
            None => render_blocks(region, &mut lines),
        }
    }

    if let Some(after) = segments.after.as_deref().filter(|a| !a.is_empty()) {
        lines.push(String::new());
        render_blocks(after, &mut lines);
    }

    lines.join("\n")
}
