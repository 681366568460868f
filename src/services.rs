//! Shared service handles
//!
//! The HTTP client and the state store are constructed once and passed by
//! reference into the components that need them. [`Services::initialize`]
//! guards against duplicate construction; a second call returns the handle
//! built by the first.

use std::sync::{Arc, OnceLock};

use crate::config::AppConfig;
use crate::store::StateStore;

static SERVICES: OnceLock<Arc<Services>> = OnceLock::new();

/// Process-wide service handles.
#[derive(Debug)]
pub struct Services {
    pub config: AppConfig,
    pub http: reqwest::Client,
    pub store: StateStore,
}

impl Services {
    /// Construct a standalone handle. Tests and embedders use this directly
    /// to inject their own configuration.
    ///
    /// No request timeout is configured: a hung endpoint hangs the
    /// corresponding step.
    pub fn with_config(config: AppConfig) -> Self {
        let http = reqwest::Client::builder()
            .user_agent(concat!("courseforge/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("failed to construct HTTP client");
        let store = StateStore::new(config.state_path.clone());
        Self {
            config,
            http,
            store,
        }
    }

    /// Initialize the process-wide handle, once. Later calls return the
    /// existing handle and ignore their argument.
    pub fn initialize(config: AppConfig) -> Arc<Services> {
        SERVICES
            .get_or_init(|| Arc::new(Services::with_config(config)))
            .clone()
    }

    /// The process-wide handle, if [`Services::initialize`] has run.
    pub fn get() -> Option<Arc<Services>> {
        SERVICES.get().cloned()
    }
}
