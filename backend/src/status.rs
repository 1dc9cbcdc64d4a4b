//! Overdue / due-soon flags and the "by due date" grouping of the list view.
//!
//! All comparisons use UTC: the due instant is midnight UTC of the due day and
//! "today" is the current UTC calendar date.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;

use crate::models::view::DATE_FORMAT;
use crate::models::{Assignment, AssignmentView};

pub const GROUP_LABEL_FORMAT: &str = "%a, %b %d";
pub const UNKNOWN_GROUP: &str = "Unknown";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AssignmentStatus {
    pub is_overdue: bool,
    pub is_due_soon: bool,
}

impl AssignmentStatus {
    pub fn derive(assignment: &Assignment, now: DateTime<Utc>) -> Self {
        if assignment.completed {
            return Self::default();
        }

        let is_overdue = assignment.due_date < now.date_naive();

        let until_due = assignment.due_instant().and_utc() - now;
        let is_due_soon = until_due >= Duration::zero() && until_due <= Duration::hours(24);

        Self {
            is_overdue,
            is_due_soon,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DueGroup {
    pub label: String,
    pub assignments: Vec<AssignmentView>,
}

pub fn group_label(due_date: &str) -> String {
    match NaiveDate::parse_from_str(due_date, DATE_FORMAT) {
        Ok(date) => date.format(GROUP_LABEL_FORMAT).to_string(),
        Err(_) => UNKNOWN_GROUP.to_string(),
    }
}

/// Buckets views by due-date label, keeping first-appearance order.
pub fn group_by_due_date(assignments: Vec<AssignmentView>) -> Vec<DueGroup> {
    let mut groups: Vec<DueGroup> = Vec::new();

    for assignment in assignments {
        let label = group_label(&assignment.due_date);
        match groups.iter_mut().find(|g| g.label == label) {
            Some(group) => group.assignments.push(assignment),
            None => groups.push(DueGroup {
                label,
                assignments: vec![assignment],
            }),
        }
    }

    groups
}
