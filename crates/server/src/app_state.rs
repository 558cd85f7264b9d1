use std::sync::Arc;

use scanner::RunManager;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) runs: Arc<RunManager>,
}
