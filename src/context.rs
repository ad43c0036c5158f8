// src/context.rs

//! Explicitly constructed application context.
//!
//! Holds the validated configuration and the API client, and hands out
//! collections and pollers wired to them. Everything that needs either is
//! given a context (or what it builds) instead of reaching for a global.

use std::sync::Arc;

use crate::api::{HistoryApi, HttpSettings, ReqwestHistoryApi};
use crate::collection::{ControlledFetchCollection, FetchFilter};
use crate::config::ConfigFile;
use crate::errors::Result;
use crate::poll::Poller;

#[derive(Clone)]
pub struct AppContext {
    config: Arc<ConfigFile>,
    api: Arc<dyn HistoryApi>,
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl AppContext {
    /// Build the production context with a `reqwest` client.
    pub fn from_config(config: ConfigFile) -> Result<Self> {
        let settings = HttpSettings {
            base_url: config.server.base_url.clone(),
            api_key: config.server.api_key.clone(),
            connect_timeout: config.server.connect_timeout,
            request_timeout: config.server.request_timeout,
        };
        let api = ReqwestHistoryApi::new(settings)?;
        Ok(Self::with_api(config, Arc::new(api)))
    }

    /// Build a context around any [`HistoryApi`].
    pub fn with_api(config: ConfigFile, api: Arc<dyn HistoryApi>) -> Self {
        Self {
            config: Arc::new(config),
            api,
        }
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    pub fn api(&self) -> Arc<dyn HistoryApi> {
        Arc::clone(&self.api)
    }

    /// Base filter for `history_id` with the configured `[filter]` applied.
    pub fn filter_for(&self, history_id: &str) -> FetchFilter {
        let mut filter = FetchFilter::new(history_id);
        filter.deleted = self.config.filter.deleted;
        filter.visible = self.config.filter.visible;
        filter
    }

    pub fn collection_for(&self, history_id: &str) -> ControlledFetchCollection {
        ControlledFetchCollection::with_page_size(
            self.api(),
            self.filter_for(history_id),
            self.config.page_size,
        )
    }

    pub fn poller_for(&self, collection: ControlledFetchCollection) -> Poller {
        Poller::new(collection, self.config.poll.clone())
    }
}
