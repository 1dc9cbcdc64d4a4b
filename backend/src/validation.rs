use chrono::NaiveDate;
use serde::Deserialize;
use serde::de::IgnoredAny;

use crate::error::{AppError, FieldError};
use crate::models::assignment::{COURSE_MAX_LEN, TITLE_MAX_LEN};
use crate::models::view::DATE_FORMAT;
use crate::models::{AssignmentChanges, NewAssignment, Priority};

/// A text field. Anything that is not a string is kept as `Other` so the
/// mismatch can be reported against the field instead of failing the body.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TextInput {
    Text(String),
    Other(IgnoredAny),
}

impl From<&str> for TextInput {
    fn from(value: &str) -> Self {
        TextInput::Text(value.to_string())
    }
}

impl From<String> for TextInput {
    fn from(value: String) -> Self {
        TextInput::Text(value)
    }
}

/// A number as sent by either a JSON client or an HTML form.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum NumberInput {
    Int(i64),
    Text(String),
    Other(IgnoredAny),
}

/// A boolean as sent by either a JSON client or an HTML form.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FlagInput {
    Bool(bool),
    Text(String),
    Other(IgnoredAny),
}

/// Unvalidated create / update body. Every field may be missing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssignmentPayload {
    pub title: Option<TextInput>,
    pub course: Option<TextInput>,
    pub notes: Option<TextInput>,
    pub due_date: Option<TextInput>,
    pub priority: Option<NumberInput>,
    pub estimated_time: Option<NumberInput>,
    pub completed: Option<FlagInput>,
}

pub fn parse_date(field: &str, raw: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).map_err(|_| AppError::DateFormat {
        field: field.to_string(),
        value: raw.to_string(),
    })
}

/// Validates a create payload, filling in defaults for absent optional fields.
pub fn validate_new(payload: AssignmentPayload) -> Result<NewAssignment, AppError> {
    let due_raw = payload.due_date.map(|input| text_value("due_date", input)).transpose();
    let due_date = parse_due_date(&due_raw)?;

    let mut errors = Vec::new();

    let title = match payload.title {
        Some(input) => {
            check_text("title", input, &mut errors).and_then(|raw| check_title(&raw, &mut errors))
        }
        None => {
            errors.push(FieldError::new("title", "field required"));
            None
        }
    };
    match due_raw {
        Err(e) => errors.push(e),
        Ok(_) if due_date.is_none() => errors.push(FieldError::new("due_date", "field required")),
        Ok(_) => {}
    }
    let course = payload
        .course
        .and_then(|input| check_text("course", input, &mut errors))
        .and_then(|raw| check_course(&raw, &mut errors))
        .unwrap_or_default();
    let notes = payload
        .notes
        .and_then(|input| check_text("notes", input, &mut errors))
        .map(|raw| raw.trim().to_string())
        .unwrap_or_default();
    let priority = check_priority(payload.priority, &mut errors).unwrap_or_default();
    let estimated_time = check_estimated_time(payload.estimated_time, &mut errors);
    let completed = check_flag("completed", payload.completed, &mut errors).unwrap_or(false);

    match (title, due_date) {
        (Some(title), Some(due_date)) if errors.is_empty() => Ok(NewAssignment {
            title,
            course,
            notes,
            due_date,
            priority,
            estimated_time,
            completed,
        }),
        _ => Err(AppError::Validation(errors)),
    }
}

/// Validates a partial update. Only fields present in the payload are checked.
pub fn validate_changes(payload: AssignmentPayload) -> Result<AssignmentChanges, AppError> {
    let due_raw = payload.due_date.map(|input| text_value("due_date", input)).transpose();
    let due_date = parse_due_date(&due_raw)?;

    let mut errors = Vec::new();

    let title = payload
        .title
        .and_then(|input| check_text("title", input, &mut errors))
        .and_then(|raw| check_title(&raw, &mut errors));
    if let Err(e) = due_raw {
        errors.push(e);
    }
    let course = payload
        .course
        .and_then(|input| check_text("course", input, &mut errors))
        .and_then(|raw| check_course(&raw, &mut errors));
    let notes = payload
        .notes
        .and_then(|input| check_text("notes", input, &mut errors))
        .map(|raw| raw.trim().to_string());
    let priority = check_priority(payload.priority, &mut errors);
    let estimated_time = check_estimated_time(payload.estimated_time, &mut errors);
    let completed = check_flag("completed", payload.completed, &mut errors);

    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    Ok(AssignmentChanges {
        title,
        course,
        notes,
        due_date,
        priority,
        estimated_time,
        completed,
    })
}

// 型違いは Validation 側で報告するので、ここでは文字列の日付だけを見る
fn parse_due_date(raw: &Result<Option<String>, FieldError>) -> Result<Option<NaiveDate>, AppError> {
    match raw {
        Ok(raw) => non_blank(raw.as_deref())
            .map(|raw| parse_date("due_date", raw))
            .transpose(),
        Err(_) => Ok(None),
    }
}

fn non_blank(raw: Option<&str>) -> Option<&str> {
    raw.filter(|s| !s.trim().is_empty())
}

fn text_value(field: &str, input: TextInput) -> Result<String, FieldError> {
    match input {
        TextInput::Text(raw) => Ok(raw),
        TextInput::Other(_) => Err(FieldError::new(field, format!("{} must be a string", field))),
    }
}

fn check_text(field: &str, input: TextInput, errors: &mut Vec<FieldError>) -> Option<String> {
    match text_value(field, input) {
        Ok(raw) => Some(raw),
        Err(e) => {
            errors.push(e);
            None
        }
    }
}

fn check_title(raw: &str, errors: &mut Vec<FieldError>) -> Option<String> {
    let title = raw.trim();
    if title.is_empty() {
        errors.push(FieldError::new("title", "title cannot be empty"));
        return None;
    }
    if title.chars().count() > TITLE_MAX_LEN {
        errors.push(FieldError::new(
            "title",
            format!("title must be at most {} characters", TITLE_MAX_LEN),
        ));
        return None;
    }
    Some(title.to_string())
}

fn check_course(raw: &str, errors: &mut Vec<FieldError>) -> Option<String> {
    let course = raw.trim();
    if course.chars().count() > COURSE_MAX_LEN {
        errors.push(FieldError::new(
            "course",
            format!("course must be at most {} characters", COURSE_MAX_LEN),
        ));
        return None;
    }
    Some(course.to_string())
}

fn check_number(field: &str, input: Option<NumberInput>, errors: &mut Vec<FieldError>) -> Option<i64> {
    match input? {
        NumberInput::Int(value) => Some(value),
        NumberInput::Text(raw) => {
            let raw = raw.trim();
            if raw.is_empty() {
                return None;
            }
            match raw.parse::<i64>() {
                Ok(value) => Some(value),
                Err(_) => {
                    errors.push(FieldError::new(field, format!("{} must be an integer", field)));
                    None
                }
            }
        }
        NumberInput::Other(_) => {
            errors.push(FieldError::new(field, format!("{} must be an integer", field)));
            None
        }
    }
}

fn check_priority(input: Option<NumberInput>, errors: &mut Vec<FieldError>) -> Option<Priority> {
    let value = check_number("priority", input, errors)?;
    match Priority::try_from(value) {
        Ok(priority) => Some(priority),
        Err(e) => {
            errors.push(FieldError::new("priority", e.to_string()));
            None
        }
    }
}

fn check_estimated_time(input: Option<NumberInput>, errors: &mut Vec<FieldError>) -> Option<u32> {
    let value = check_number("estimated_time", input, errors)?;
    if value < 1 {
        errors.push(FieldError::new("estimated_time", "estimated_time must be at least 1"));
        return None;
    }
    match u32::try_from(value) {
        Ok(minutes) => Some(minutes),
        Err(_) => {
            errors.push(FieldError::new("estimated_time", "estimated_time is too large"));
            None
        }
    }
}

fn check_flag(field: &str, input: Option<FlagInput>, errors: &mut Vec<FieldError>) -> Option<bool> {
    match input? {
        FlagInput::Bool(value) => Some(value),
        FlagInput::Text(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "" => None,
            "true" | "on" | "1" | "yes" => Some(true),
            "false" | "off" | "0" | "no" => Some(false),
            _ => {
                errors.push(FieldError::new(field, format!("{} must be a boolean", field)));
                None
            }
        },
        FlagInput::Other(_) => {
            errors.push(FieldError::new(field, format!("{} must be a boolean", field)));
            None
        }
    }
}
