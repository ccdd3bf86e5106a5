use std::sync::Arc;

use tracing::debug;

use crate::aliases::AliasTable;
use crate::config::PaddockConfig;
use crate::http_client::{HttpClient, ReqwestHttpClient};
use crate::CoreError;

/// Everything a pipeline component needs, built once and shared by reference.
#[derive(Clone)]
pub struct Context {
    pub config: PaddockConfig,
    pub aliases: AliasTable,
    pub http: Arc<dyn HttpClient>,
}

impl Context {
    /// Production context: environment configuration and a reqwest transport.
    pub fn from_env() -> Result<Self, CoreError> {
        Self::new(PaddockConfig::from_env(), Arc::new(ReqwestHttpClient::new()))
    }

    /// Loads the alias table named by `config` (or the bundled one).
    pub fn new(config: PaddockConfig, http: Arc<dyn HttpClient>) -> Result<Self, CoreError> {
        let aliases = match &config.alias_file {
            Some(path) => {
                debug!(path = %path.display(), "loading alias table override");
                AliasTable::load(path)?
            }
            None => AliasTable::bundled()?,
        };

        Ok(Self {
            config,
            aliases,
            http,
        })
    }

    pub fn with_aliases(mut self, aliases: AliasTable) -> Self {
        self.aliases = aliases;
        self
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("config", &self.config)
            .field("aliases", &self.aliases)
            .finish_non_exhaustive()
    }
}
