use std::sync::Arc;

use crate::config::Config;
use crate::jar::HttpCookieJar;
use crate::observability::Metrics;
use crate::storage::{CookieStorage, StorageOptions};

#[derive(Clone)]
pub struct AppState {
    pub options: Arc<StorageOptions>,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        let options = StorageOptions::from_settings(&config.storage);
        Self {
            options: Arc::new(options),
            metrics: Arc::new(Metrics::new()),
        }
    }

    /// Storage bound to one request's cookies, recording into the shared metrics
    pub fn storage_for(&self, jar: Arc<HttpCookieJar>) -> CookieStorage {
        CookieStorage::new(jar, self.options.as_ref().clone()).with_metrics(self.metrics.clone())
    }
}
