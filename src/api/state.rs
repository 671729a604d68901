use std::sync::Arc;

use crate::config::Config;
use crate::observability::Metrics;
use crate::sites::SiteRegistry;
use crate::tasks::{TaskBroker, TaskStore};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub sites: Arc<SiteRegistry>,
    pub store: Arc<TaskStore>,
    pub broker: Arc<TaskBroker>,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(
        config: Config,
        sites: Arc<SiteRegistry>,
        store: Arc<TaskStore>,
        broker: Arc<TaskBroker>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            sites,
            store,
            broker,
            metrics,
        }
    }
}
