use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Deserialize;
use sqlx::{QueryBuilder, Sqlite};

use crate::models::assignment::midnight;
use crate::models::view::DATE_FORMAT;

/// Interactive search never returns more than this many rows.
pub const SEARCH_LIMIT: i64 = 100;

/// Raw search form / query string. Everything is kept as text so that a bad
/// bound can be dropped instead of rejecting the whole request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub course: Option<String>,
    pub due_from: Option<String>,
    pub due_to: Option<String>,
    pub min_time: Option<String>,
    pub max_time: Option<String>,
    pub show_completed: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentFilter {
    pub text: Option<String>,
    pub course: Option<String>,
    pub due_from: Option<NaiveDateTime>,
    pub due_to: Option<NaiveDateTime>,
    pub min_time: Option<i64>,
    pub max_time: Option<i64>,
    pub include_completed: bool,
    pub limit: Option<i64>,
}

impl AssignmentFilter {
    /// Every record, completed ones included.
    pub fn all() -> Self {
        Self {
            include_completed: true,
            ..Default::default()
        }
    }

    pub fn from_params(params: &SearchParams) -> Self {
        Self {
            text: non_blank(params.q.as_deref()).map(str::to_string),
            course: non_blank(params.course.as_deref()).map(str::to_string),
            due_from: parse_day(params.due_from.as_deref()).map(midnight),
            due_to: parse_day(params.due_to.as_deref()).map(end_of_day),
            min_time: parse_minutes(params.min_time.as_deref()),
            max_time: parse_minutes(params.max_time.as_deref()),
            include_completed: parse_toggle(params.show_completed.as_deref()),
            limit: None,
        }
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Appends the `WHERE` clause. All values go through bind parameters.
    pub fn push_where(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        qb.push(" WHERE 1 = 1");

        if let Some(text) = &self.text {
            let needle = fold_case(text);
            qb.push(" AND (instr(title_folded, ")
                .push_bind(needle.clone())
                .push(") > 0 OR instr(notes_folded, ")
                .push_bind(needle)
                .push(") > 0)");
        }
        if let Some(course) = &self.course {
            qb.push(" AND course = ").push_bind(course.clone());
        }
        if let Some(from) = self.due_from {
            qb.push(" AND due_date >= ").push_bind(from);
        }
        if let Some(to) = self.due_to {
            qb.push(" AND due_date <= ").push_bind(to);
        }
        if let Some(min) = self.min_time {
            qb.push(" AND estimated_time >= ").push_bind(min);
        }
        if let Some(max) = self.max_time {
            qb.push(" AND estimated_time <= ").push_bind(max);
        }
        if !self.include_completed {
            qb.push(" AND completed = 0");
        }
    }

    /// Appends the list ordering and, when set, the row cap.
    pub fn push_order(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        qb.push(" ORDER BY due_date ASC, created_at DESC");
        if let Some(limit) = self.limit {
            qb.push(" LIMIT ").push_bind(limit);
        }
    }
}

/// Case folding for free-text search. SQLite's `lower()` only folds ASCII, so
/// the folded copies of title / notes are computed here and stored alongside.
pub fn fold_case(text: &str) -> String {
    text.to_lowercase()
}

fn non_blank(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

fn parse_day(raw: Option<&str>) -> Option<NaiveDate> {
    non_blank(raw).and_then(|s| NaiveDate::parse_from_str(s, DATE_FORMAT).ok())
}

fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    let last = NaiveTime::from_hms_micro_opt(23, 59, 59, 999_999).unwrap_or(NaiveTime::MIN);
    date.and_time(last)
}

fn parse_minutes(raw: Option<&str>) -> Option<i64> {
    non_blank(raw).and_then(|s| s.parse::<i64>().ok())
}

fn parse_toggle(raw: Option<&str>) -> bool {
    matches!(
        non_blank(raw).map(str::to_ascii_lowercase).as_deref(),
        Some("true" | "1" | "on" | "yes")
    )
}
