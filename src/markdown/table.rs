use super::is_separator;

/// Header and body cells of a pipe table. Rows may have a different number of
/// cells than the header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableModel {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

fn split_cells(line: &str) -> Vec<String> {
    line.split('|')
        .map(str::trim)
        .filter(|cell| !cell.is_empty())
        .map(String::from)
        .collect()
}

/// Parses a table region into headers and rows.
///
/// Returns `None` when there are fewer than two non-empty lines or when the
/// second line is not a separator. Body lines without a pipe are skipped.
pub fn parse_table(text: &str) -> Option<TableModel> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    if lines.len() < 2 || !is_separator(lines[1]) {
        return None;
    }

    let rows = lines[2..]
        .iter()
        .filter(|line| line.contains('|'))
        .map(|line| split_cells(line))
        .collect();

    Some(TableModel {
        headers: split_cells(lines[0]),
        rows,
    })
}
