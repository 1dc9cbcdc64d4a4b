mod payload;

use axum::Json;
use axum::extract::{Path, Query};
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Router, extract::State};

use crate::error::AppError;
use crate::export::{CSV_CONTENT_TYPE, CSV_FILENAME};
use crate::models::AssignmentView;
use crate::query::SearchParams;
use crate::services::{AssignmentService, SearchResults};
use crate::state::AppState;
use crate::status::DueGroup;
use crate::validation::AssignmentPayload;

pub use payload::Payload;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/assignments", get(list_assignments).post(create_assignment))
        .route("/api/assignments/grouped", get(list_grouped))
        .route("/api/assignments/search", get(search_assignments))
        .route("/api/assignments/export", get(export_assignments))
        .route(
            "/api/assignments/{id}",
            get(get_assignment).patch(update_assignment).delete(delete_assignment),
        )
        .route("/api/assignments/{id}/toggle", post(toggle_assignment))
}

fn service(state: &AppState) -> AssignmentService {
    AssignmentService::new(state.store.clone())
}

async fn list_assignments(State(state): State<AppState>) -> Result<Json<Vec<AssignmentView>>, AppError> {
    Ok(Json(service(&state).list().await?))
}

async fn list_grouped(State(state): State<AppState>) -> Result<Json<Vec<DueGroup>>, AppError> {
    Ok(Json(service(&state).list_grouped().await?))
}

async fn create_assignment(
    State(state): State<AppState>,
    Payload(req): Payload<AssignmentPayload>,
) -> Result<(StatusCode, Json<AssignmentView>), AppError> {
    let assignment = service(&state).create(req).await?;
    Ok((StatusCode::CREATED, Json(assignment)))
}

async fn get_assignment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AssignmentView>, AppError> {
    Ok(Json(service(&state).get(&id).await?))
}

async fn update_assignment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Payload(req): Payload<AssignmentPayload>,
) -> Result<Json<AssignmentView>, AppError> {
    Ok(Json(service(&state).update(&id, req).await?))
}

async fn toggle_assignment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AssignmentView>, AppError> {
    Ok(Json(service(&state).toggle(&id).await?))
}

async fn delete_assignment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    service(&state).delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn search_assignments(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResults>, AppError> {
    Ok(Json(service(&state).search(&params).await?))
}

async fn export_assignments(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<impl IntoResponse, AppError> {
    let csv = service(&state).export_csv(&params).await?;
    let disposition = format!("attachment; filename=\"{}\"", CSV_FILENAME);

    Ok((
        [
            (header::CONTENT_TYPE, CSV_CONTENT_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        csv,
    ))
}
