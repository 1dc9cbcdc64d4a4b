use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::db::AssignmentStore;
use crate::error::AppError;
use crate::export;
use crate::models::{Assignment, AssignmentView};
use crate::query::{AssignmentFilter, SEARCH_LIMIT, SearchParams};
use crate::status::{DueGroup, group_by_due_date};
use crate::validation::{AssignmentPayload, validate_changes, validate_new};

pub struct AssignmentService {
    store: Arc<dyn AssignmentStore>,
}

#[derive(Debug, Serialize)]
pub struct SearchResults {
    pub assignments: Vec<AssignmentView>,
    pub courses: Vec<String>,
}

pub fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::InvalidId(raw.to_string()))
}

fn views(assignments: &[Assignment]) -> Vec<AssignmentView> {
    let now = Utc::now();
    assignments
        .iter()
        .map(|a| AssignmentView::new(a, now))
        .collect()
}

impl AssignmentService {
    pub fn new(store: Arc<dyn AssignmentStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> Result<Vec<AssignmentView>, AppError> {
        let assignments = self.store.list(&AssignmentFilter::all()).await?;
        debug!("listing {} assignments", assignments.len());
        Ok(views(&assignments))
    }

    pub async fn list_grouped(&self) -> Result<Vec<DueGroup>, AppError> {
        Ok(group_by_due_date(self.list().await?))
    }

    pub async fn get(&self, id: &str) -> Result<AssignmentView, AppError> {
        let assignment = self.find(id).await?;
        Ok(AssignmentView::new(&assignment, Utc::now()))
    }

    pub async fn create(&self, payload: AssignmentPayload) -> Result<AssignmentView, AppError> {
        let input = validate_new(payload)?;
        let now = Utc::now();
        let assignment = Assignment::new(input, now);

        self.store.insert(&assignment).await?;
        info!("created assignment {} ({})", assignment.id, assignment.title);

        Ok(AssignmentView::new(&assignment, now))
    }

    pub async fn update(&self, id: &str, payload: AssignmentPayload) -> Result<AssignmentView, AppError> {
        let mut assignment = self.find(id).await?;
        let changes = validate_changes(payload)?;

        let now = Utc::now();
        assignment.apply(changes, now);
        self.persist(&assignment).await?;
        info!("updated assignment {}", assignment.id);

        Ok(AssignmentView::new(&assignment, now))
    }

    pub async fn toggle(&self, id: &str) -> Result<AssignmentView, AppError> {
        let mut assignment = self.find(id).await?;

        let now = Utc::now();
        assignment.toggle(now);
        self.persist(&assignment).await?;
        info!("assignment {} completed={}", assignment.id, assignment.completed);

        Ok(AssignmentView::new(&assignment, now))
    }

    /// Idempotent: deleting an unknown id is not an error.
    pub async fn delete(&self, id: &str) -> Result<bool, AppError> {
        let id = parse_id(id)?;
        let deleted = self.store.delete(id).await?;
        if deleted {
            info!("deleted assignment {}", id);
        } else {
            debug!("delete of unknown assignment {} ignored", id);
        }
        Ok(deleted)
    }

    pub async fn search(&self, params: &SearchParams) -> Result<SearchResults, AppError> {
        let filter = AssignmentFilter::from_params(params).with_limit(SEARCH_LIMIT);
        debug!("search filter: {:?}", filter);

        let assignments = self.store.list(&filter).await?;
        let courses = self.store.courses().await?;

        Ok(SearchResults {
            assignments: views(&assignments),
            courses,
        })
    }

    pub async fn export_csv(&self, params: &SearchParams) -> Result<String, AppError> {
        let filter = AssignmentFilter::from_params(params);
        let assignments = self.store.list(&filter).await?;
        info!("exporting {} assignments", assignments.len());
        Ok(export::to_csv(&assignments))
    }

    async fn find(&self, id: &str) -> Result<Assignment, AppError> {
        let id = parse_id(id)?;
        self.store.find(id).await?.ok_or(AppError::NotFound)
    }

    // 読み込みと保存の間に削除された場合は 404
    async fn persist(&self, assignment: &Assignment) -> Result<(), AppError> {
        if self.store.save(assignment).await? {
            Ok(())
        } else {
            Err(AppError::NotFound)
        }
    }
}
