use crate::models::Assignment;
use crate::models::view::DATE_FORMAT;

pub const CSV_HEADER: [&str; 7] = [
    "Title",
    "Course",
    "Due Date",
    "Priority",
    "Estimated Time (min)",
    "Notes",
    "Completed",
];

pub const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";
pub const CSV_FILENAME: &str = "assignments.csv";

/// Renders assignments as RFC 4180 CSV, header row first.
pub fn to_csv(assignments: &[Assignment]) -> String {
    let mut out = String::new();
    push_row(&mut out, CSV_HEADER.iter().map(|h| h.to_string()));

    for a in assignments {
        push_row(
            &mut out,
            [
                a.title.clone(),
                a.course.clone(),
                a.due_date.format(DATE_FORMAT).to_string(),
                a.priority.get().to_string(),
                a.estimated_time.map(|m| m.to_string()).unwrap_or_default(),
                a.notes.clone(),
                if a.completed { "Yes" } else { "No" }.to_string(),
            ],
        );
    }

    out
}

fn push_row(out: &mut String, cells: impl IntoIterator<Item = String>) {
    let row: Vec<String> = cells.into_iter().map(|c| escape(&c)).collect();
    out.push_str(&row.join(","));
    out.push_str("\r\n");
}

fn escape(cell: &str) -> String {
    if cell.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}
