use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use sqlx::FromRow;
use thiserror::Error;
use uuid::Uuid;

pub const TITLE_MAX_LEN: usize = 200;
pub const COURSE_MAX_LEN: usize = 120;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("priority must be between 1 and 3, got {0}")]
pub struct PriorityOutOfRange(pub i64);

/// 優先度 (1 = 高, 3 = 低)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Priority(u8);

impl Priority {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 3;

    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority(2)
    }
}

impl TryFrom<i64> for Priority {
    type Error = PriorityOutOfRange;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if (Self::MIN as i64..=Self::MAX as i64).contains(&value) {
            Ok(Priority(value as u8))
        } else {
            Err(PriorityOutOfRange(value))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub id: Uuid,
    pub title: String,
    pub course: String,
    pub notes: String,
    pub due_date: NaiveDate,
    pub priority: Priority,
    pub estimated_time: Option<u32>,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A validated create payload. Defaults are already filled in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAssignment {
    pub title: String,
    pub course: String,
    pub notes: String,
    pub due_date: NaiveDate,
    pub priority: Priority,
    pub estimated_time: Option<u32>,
    pub completed: bool,
}

/// A validated partial update: `None` means "leave the stored value alone".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentChanges {
    pub title: Option<String>,
    pub course: Option<String>,
    pub notes: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub priority: Option<Priority>,
    pub estimated_time: Option<u32>,
    pub completed: Option<bool>,
}

impl AssignmentChanges {
    pub fn is_empty(&self) -> bool {
        *self == AssignmentChanges::default()
    }
}

impl Assignment {
    pub fn new(input: NewAssignment, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: input.title,
            course: input.course,
            notes: input.notes,
            due_date: input.due_date,
            priority: input.priority,
            estimated_time: input.estimated_time,
            completed: input.completed,
            created_at: now,
            updated_at: now,
        }
    }

    /// Merges the supplied fields and refreshes `updated_at`.
    pub fn apply(&mut self, changes: AssignmentChanges, now: DateTime<Utc>) {
        if let Some(title) = changes.title {
            self.title = title;
        }
        if let Some(course) = changes.course {
            self.course = course;
        }
        if let Some(notes) = changes.notes {
            self.notes = notes;
        }
        if let Some(due_date) = changes.due_date {
            self.due_date = due_date;
        }
        if let Some(priority) = changes.priority {
            self.priority = priority;
        }
        if let Some(estimated_time) = changes.estimated_time {
            self.estimated_time = Some(estimated_time);
        }
        if let Some(completed) = changes.completed {
            self.completed = completed;
        }
        self.touch(now);
    }

    pub fn toggle(&mut self, now: DateTime<Utc>) {
        self.completed = !self.completed;
        self.touch(now);
    }

    // updated_at must strictly advance, even within the clock's resolution
    fn touch(&mut self, now: DateTime<Utc>) {
        let floor = self.updated_at + Duration::microseconds(1);
        self.updated_at = now.max(floor);
    }

    /// The due date as stored: midnight of the due day.
    pub fn due_instant(&self) -> NaiveDateTime {
        midnight(self.due_date)
    }
}

pub fn midnight(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

/// Raw `assignments` table row.
#[derive(Debug, Clone, FromRow)]
pub struct AssignmentRow {
    pub id: String,
    pub title: String,
    pub course: String,
    pub notes: String,
    pub due_date: NaiveDateTime,
    pub priority: i64,
    pub estimated_time: Option<i64>,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn decode_error(column: &str, source: impl std::error::Error + Send + Sync + 'static) -> sqlx::Error {
    sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(source),
    }
}

impl TryFrom<AssignmentRow> for Assignment {
    type Error = sqlx::Error;

    fn try_from(row: AssignmentRow) -> Result<Self, Self::Error> {
        let id = Uuid::parse_str(&row.id).map_err(|e| decode_error("id", e))?;
        let priority = Priority::try_from(row.priority).map_err(|e| decode_error("priority", e))?;
        let estimated_time = row
            .estimated_time
            .map(u32::try_from)
            .transpose()
            .map_err(|e| decode_error("estimated_time", e))?;

        Ok(Assignment {
            id,
            title: row.title,
            course: row.course,
            notes: row.notes,
            due_date: row.due_date.date(),
            priority,
            estimated_time,
            completed: row.completed,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
