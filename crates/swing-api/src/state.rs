//! Application state.

use std::sync::Arc;

use swing_ml_client::MlClient;
use swing_queue::JobQueue;
use swing_worker::JobExecutor;

use crate::config::ApiConfig;
use crate::storage::UploadStore;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub queue: Arc<JobQueue>,
    pub executor: Arc<JobExecutor>,
    /// Inference service probed by the readiness check, if configured.
    pub ml: Option<Arc<MlClient>>,
    pub uploads: UploadStore,
}

impl AppState {
    /// Create new application state.
    pub fn new(
        config: ApiConfig,
        queue: Arc<JobQueue>,
        executor: Arc<JobExecutor>,
        ml: Option<Arc<MlClient>>,
    ) -> Self {
        let uploads = UploadStore::new(config.upload_dir.clone());

        Self {
            config,
            queue,
            executor,
            ml,
            uploads,
        }
    }
}
