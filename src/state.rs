use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

use crate::config::Config;
use crate::markdown::FrontmatterCompiler;
use crate::models::PostRecord;

pub type RefreshBroadcaster = broadcast::Sender<()>;

pub struct AppState {
    pub config: Config,
    pub compiler: Arc<dyn FrontmatterCompiler>,
    /// Last successfully assembled collection, newest first.
    pub posts: RwLock<Vec<PostRecord>>,
    pub is_development: bool,
}

impl AppState {
    pub fn new(
        config: Config,
        compiler: Arc<dyn FrontmatterCompiler>,
        posts: Vec<PostRecord>,
    ) -> Self {
        let is_development = config.server.hot_reload;
        Self {
            config,
            compiler,
            posts: RwLock::new(posts),
            is_development,
        }
    }
}

#[derive(Clone)]
pub struct RouterState {
    pub app_state: Arc<AppState>,
    pub broadcaster: RefreshBroadcaster,
}

impl axum::extract::FromRef<RouterState> for Arc<AppState> {
    fn from_ref(state: &RouterState) -> Self {
        state.app_state.clone()
    }
}

impl axum::extract::FromRef<RouterState> for RefreshBroadcaster {
    fn from_ref(state: &RouterState) -> Self {
        state.broadcaster.clone()
    }
}
