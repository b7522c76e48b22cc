use std::sync::Arc;

use normform_sql::executor::Executor;

use crate::config::AppConfig;

/// Shared process state: one `mysql_async::Pool` (internally connection-scoped,
/// cheap to clone) behind the `Executor` trait object every handler dispatches
/// through.
#[derive(Clone)]
pub struct AppState {
    pub executor: Arc<dyn Executor>,
    pub config: Arc<AppConfig>,
}
