use flowdesk_core::policy::Action;
use flowdesk_core::timeline::TimelineEntry;
use serde::Serialize;

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

pub fn print_table(headers: &[&str], rows: Vec<Vec<String>>) {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }
    }

    let header_row: Vec<String> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| format!("{:width$}", h, width = widths[i]))
        .collect();
    println!("{}", header_row.join("  "));

    let sep: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    println!("{}", sep.join("  "));

    for row in &rows {
        let cells: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                let w = widths.get(i).copied().unwrap_or(0);
                format!("{:width$}", cell, width = w)
            })
            .collect();
        println!("{}", cells.join("  ").trim_end());
    }
}

/// One-line rendering of an action a user may take.
pub fn describe_action(action: &Action) -> String {
    match action {
        Action::Assign {
            next_status,
            candidates,
        } => {
            let ids: Vec<&str> = candidates.iter().map(|u| u.id.as_str()).collect();
            format!("assign -> {next_status} (to: {})", ids.join(", "))
        }
        Action::SetStatus { target } => format!("status -> {target}"),
    }
}

pub fn timeline_rows(entries: &[TimelineEntry]) -> Vec<Vec<String>> {
    entries
        .iter()
        .map(|e| {
            vec![
                e.at.format("%Y-%m-%d %H:%M").to_string(),
                e.from.map(|s| s.to_string()).unwrap_or_else(|| "-".into()),
                e.to.to_string(),
                e.assigned_to_name.clone().unwrap_or_else(|| "-".into()),
                e.assigned_by_name.clone(),
                e.notes.clone().unwrap_or_default(),
            ]
        })
        .collect()
}
