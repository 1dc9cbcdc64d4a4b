use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::models::Assignment;
use crate::status::AssignmentStatus;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Transfer form of an assignment, as returned by the JSON API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssignmentView {
    pub id: String,
    pub title: String,
    pub course: String,
    pub notes: String,
    pub due_date: String,
    pub priority: u8,
    pub estimated_time: Option<u32>,
    pub completed: bool,
    pub created_at: String,
    pub updated_at: String,
    pub is_overdue: bool,
    pub is_due_soon: bool,
}

impl AssignmentView {
    pub fn new(assignment: &Assignment, now: DateTime<Utc>) -> Self {
        let status = AssignmentStatus::derive(assignment, now);
        Self {
            id: assignment.id.to_string(),
            title: assignment.title.clone(),
            course: assignment.course.clone(),
            notes: assignment.notes.clone(),
            due_date: assignment.due_date.format(DATE_FORMAT).to_string(),
            priority: assignment.priority.get(),
            estimated_time: assignment.estimated_time,
            completed: assignment.completed,
            created_at: assignment.created_at.to_rfc3339_opts(SecondsFormat::Micros, true),
            updated_at: assignment.updated_at.to_rfc3339_opts(SecondsFormat::Micros, true),
            is_overdue: status.is_overdue,
            is_due_soon: status.is_due_soon,
        }
    }
}
