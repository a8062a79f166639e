//! HTTP endpoint handlers.

pub mod compare;
pub mod health;
pub mod lookup;
pub mod metrics_handler;
pub mod recommend;
pub mod risk;
pub mod session;

use std::sync::Arc;

use crate::catalog::PriceSource;
use crate::config::Config;
use crate::session::SessionStore;

/// Shared application state passed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub catalog: Arc<PriceSource>,
    pub sessions: Arc<SessionStore>,
}

#[cfg(test)]
pub(crate) fn test_state() -> AppState {
    use crate::config::{CatalogConfig, MetricsConfig, ServerConfig};

    let config = Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
            log_level: "info".to_string(),
            log_format: "text".to_string(),
        },
        catalog: CatalogConfig {
            city: "Surat".to_string(),
            data_file: None,
        },
        metrics: MetricsConfig {
            enabled: true,
            endpoint: "/metrics".to_string(),
        },
    };

    AppState {
        catalog: Arc::new(PriceSource::Builtin(crate::catalog::Catalog::builtin(
            &config.catalog.city,
        ))),
        sessions: Arc::new(SessionStore::new()),
        config: Arc::new(config),
    }
}

#[cfg(test)]
pub(crate) fn test_state_with_source(source: PriceSource) -> AppState {
    let mut state = test_state();
    state.catalog = Arc::new(source);
    state
}
