use std::sync::Arc;

use axum::extract::FromRef;

use crate::{
    advisor::DifficultyAdvisor,
    config::Config,
    progress::registry::SessionRegistry,
    quiz::catalog::Catalog,
    storage::{AccountStore, DocumentStore},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub catalog: Arc<Catalog>,
    pub sessions: Arc<SessionRegistry>,
    pub accounts: Arc<dyn AccountStore>,
    pub documents: Arc<dyn DocumentStore>,
    pub advisor: Arc<dyn DifficultyAdvisor>,
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for Arc<Catalog> {
    fn from_ref(state: &AppState) -> Self {
        state.catalog.clone()
    }
}

impl FromRef<AppState> for Arc<SessionRegistry> {
    fn from_ref(state: &AppState) -> Self {
        state.sessions.clone()
    }
}

impl FromRef<AppState> for Arc<dyn DocumentStore> {
    fn from_ref(state: &AppState) -> Self {
        state.documents.clone()
    }
}

impl FromRef<AppState> for Arc<dyn DifficultyAdvisor> {
    fn from_ref(state: &AppState) -> Self {
        state.advisor.clone()
    }
}
