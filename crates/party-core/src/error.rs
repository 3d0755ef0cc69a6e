//! Errors at the fallible edges: configuration, catalog, and output files.
//! The simulation itself never fails.

use party_events::CatalogError;

use crate::config::ConfigError;

#[derive(Debug, thiserror::Error)]
pub enum PartyError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("snapshot encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}
