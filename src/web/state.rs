use std::sync::Arc;

use crate::service::IssService;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<IssService>,
}
