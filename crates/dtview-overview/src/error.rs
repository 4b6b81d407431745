//! Overview error types

use dtview_core::GraphError;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OverviewError {
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),
    #[error("Graph snapshot not stable after {0:?}")]
    Unstable(Duration),
    #[error("Graph source unavailable: {0}")]
    SourceUnavailable(String),
}
