use std::sync::Arc;
use std::time::Duration;

use crate::dashboards::d402_sales_panel::service::SalesPanelService;
use crate::dashboards::d402_sales_panel::session::SessionStore;

/// Shared handler state: the session registry and the cached query service
#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionStore,
    pub service: Arc<SalesPanelService>,
    pub session_max_idle: Duration,
}

impl AppState {
    pub fn new(service: Arc<SalesPanelService>, session_max_idle: Duration) -> Self {
        Self {
            sessions: SessionStore::new(),
            service,
            session_max_idle,
        }
    }
}
