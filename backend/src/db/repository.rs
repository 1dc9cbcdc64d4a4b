use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use uuid::Uuid;

use crate::models::{Assignment, AssignmentRow};
use crate::query::{AssignmentFilter, fold_case};

const SELECT_ASSIGNMENTS: &str = "SELECT id, title, course, notes, due_date, priority, estimated_time, completed, created_at, updated_at FROM assignments";

fn into_assignments(rows: Vec<AssignmentRow>) -> Result<Vec<Assignment>, sqlx::Error> {
    rows.into_iter().map(Assignment::try_from).collect()
}

pub async fn fetch_assignments(
    db: &SqlitePool,
    filter: &AssignmentFilter,
) -> Result<Vec<Assignment>, sqlx::Error> {
    let mut qb = QueryBuilder::<Sqlite>::new(SELECT_ASSIGNMENTS);
    filter.push_where(&mut qb);
    filter.push_order(&mut qb);

    let rows = qb.build_query_as::<AssignmentRow>().fetch_all(db).await?;
    into_assignments(rows)
}

pub async fn fetch_courses(db: &SqlitePool) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        "SELECT DISTINCT course FROM assignments WHERE course != '' ORDER BY course ASC",
    )
    .fetch_all(db)
    .await
}

pub async fn find_assignment_by_id(
    db: &SqlitePool,
    id: Uuid,
) -> Result<Option<Assignment>, sqlx::Error> {
    let row = sqlx::query_as::<_, AssignmentRow>(&format!("{} WHERE id = ?", SELECT_ASSIGNMENTS))
        .bind(id.to_string())
        .fetch_optional(db)
        .await?;

    row.map(Assignment::try_from).transpose()
}

pub async fn insert_assignment(db: &SqlitePool, assignment: &Assignment) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO assignments
            (id, title, course, notes, due_date, priority, estimated_time,
            completed, created_at, updated_at, title_folded, notes_folded)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
        "#,
    )
    .bind(assignment.id.to_string())
    .bind(&assignment.title)
    .bind(&assignment.course)
    .bind(&assignment.notes)
    .bind(assignment.due_instant())
    .bind(assignment.priority.get() as i64)
    .bind(assignment.estimated_time.map(i64::from))
    .bind(assignment.completed)
    .bind(assignment.created_at)
    .bind(assignment.updated_at)
    .bind(fold_case(&assignment.title))
    .bind(fold_case(&assignment.notes))
    .execute(db)
    .await?;

    Ok(())
}

/// Overwrites every mutable column. Returns false when the row is gone.
pub async fn save_assignment(db: &SqlitePool, assignment: &Assignment) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE assignments
        SET title = ?1,
            course = ?2,
            notes = ?3,
            due_date = ?4,
            priority = ?5,
            estimated_time = ?6,
            completed = ?7,
            updated_at = ?8,
            title_folded = ?9,
            notes_folded = ?10
        WHERE id = ?11
        "#,
    )
    .bind(&assignment.title)
    .bind(&assignment.course)
    .bind(&assignment.notes)
    .bind(assignment.due_instant())
    .bind(assignment.priority.get() as i64)
    .bind(assignment.estimated_time.map(i64::from))
    .bind(assignment.completed)
    .bind(assignment.updated_at)
    .bind(fold_case(&assignment.title))
    .bind(fold_case(&assignment.notes))
    .bind(assignment.id.to_string())
    .execute(db)
    .await?
    .rows_affected();

    Ok(result > 0)
}

pub async fn delete_assignment(db: &SqlitePool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM assignments WHERE id = ?1")
        .bind(id.to_string())
        .execute(db)
        .await?
        .rows_affected();

    Ok(result > 0)
}
