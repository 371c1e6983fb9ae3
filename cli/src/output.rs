use owo_colors::OwoColorize;
use ozmon_core::SessionLiveness;
use ozmon_core::SessionStatus;
use supports_color::Stream;

/// Prints rows under left-aligned headers, padding each column to its widest
/// cell.
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) {
    for line in table_lines(headers, rows) {
        println!("{line}");
    }
}

pub fn table_lines(headers: &[&str], rows: &[Vec<String>]) -> Vec<String> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if i >= widths.len() {
                widths.push(cell.len());
            } else {
                widths[i] = widths[i].max(cell.len());
            }
        }
    }

    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(pad_line(headers, &widths));
    for row in rows {
        let cells: Vec<&str> = row.iter().map(String::as_str).collect();
        lines.push(pad_line(&cells, &widths));
    }
    lines
}

fn pad_line(cells: &[&str], widths: &[usize]) -> String {
    cells
        .iter()
        .enumerate()
        .map(|(i, cell)| {
            format!(
                "{cell:<width$}",
                width = widths.get(i).copied().unwrap_or(cell.len())
            )
        })
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}

/// Status shown to users: the recorded status, corrected by a live probe for
/// sessions recorded as running.
pub fn display_status(status: SessionStatus, liveness: SessionLiveness) -> &'static str {
    match (status, liveness) {
        (SessionStatus::Running, SessionLiveness::Running) => "running",
        (SessionStatus::Running, _) => "exited",
        (SessionStatus::Stopped, _) => "stopped",
        (SessionStatus::Error, _) => "error",
    }
}

pub fn success(message: &str) -> String {
    if color_enabled() {
        format!("{} {message}", "✔".green())
    } else {
        format!("✔ {message}")
    }
}

pub fn failure(message: &str) -> String {
    if color_enabled() {
        format!("{} {message}", "✖".red())
    } else {
        format!("✖ {message}")
    }
}

pub fn dim(text: &str) -> String {
    if color_enabled() {
        text.dimmed().to_string()
    } else {
        text.to_string()
    }
}

fn color_enabled() -> bool {
    supports_color::on_cached(Stream::Stdout).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn columns_are_padded_to_widest_cell() {
        let lines = table_lines(
            &["ID", "Tool"],
            &[
                vec!["abcd1234".to_string(), "t".to_string()],
                vec!["x".to_string(), "large-transfer".to_string()],
            ],
        );
        assert_eq!(
            lines,
            vec![
                "ID        Tool".to_string(),
                "abcd1234  t".to_string(),
                "x         large-transfer".to_string(),
            ]
        );
    }

    #[test]
    fn dead_running_session_reads_as_exited() {
        assert_eq!(
            display_status(SessionStatus::Running, SessionLiveness::NotRunning),
            "exited"
        );
        assert_eq!(
            display_status(SessionStatus::Running, SessionLiveness::Running),
            "running"
        );
        assert_eq!(
            display_status(SessionStatus::Error, SessionLiveness::NotRunning),
            "error"
        );
    }
}
