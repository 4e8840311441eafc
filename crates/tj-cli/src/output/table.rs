const MIN_WIDTH: usize = 4;
const MAX_CELL: usize = 60;

/// Aligned plain-text table. Long cells are cut with an ellipsis.
#[must_use]
pub fn render(headers: &[&str], rows: &[Vec<String>]) -> String {
    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(index, header)| {
            rows.iter()
                .filter_map(|row| row.get(index))
                .map(|cell| cell.chars().count().min(MAX_CELL))
                .chain([header.chars().count(), MIN_WIDTH])
                .max()
                .unwrap_or(MIN_WIDTH)
        })
        .collect();

    let header_line = line(headers.iter().copied(), &widths);
    let divider = "-".repeat(widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1));
    let mut lines = vec![header_line, divider];
    for row in rows {
        lines.push(line(row.iter().map(String::as_str), &widths));
    }
    lines.join("\n")
}

fn line<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    cells
        .zip(widths)
        .map(|(cell, width)| pad(&truncate(cell, *width), *width))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}

fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }
    let mut out: String = value.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}

fn pad(value: &str, width: usize) -> String {
    let len = value.chars().count();
    format!("{value}{}", " ".repeat(width.saturating_sub(len)))
}

#[cfg(test)]
mod tests {
    use super::render;

    #[test]
    fn columns_align() {
        let table = render(
            &["job", "unread"],
            &[
                vec!["Fix fence".into(), "2".into()],
                vec!["Move couch".into(), "1".into()],
            ],
        );
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[2].find('2'), lines[0].find("unread"));
    }

    #[test]
    fn long_cells_are_cut() {
        let long = "x".repeat(100);
        let table = render(&["body"], &[vec![long]]);
        assert!(table.lines().nth(2).unwrap().ends_with('…'));
    }
}
