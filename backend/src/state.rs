use std::sync::Arc;

use crate::db::AssignmentStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn AssignmentStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn AssignmentStore>) -> Self {
        Self { store }
    }
}
