//! Client-side synchronization: pull the price list on a fixed period and
//! share the latest good snapshot with every surface in the process.

use async_trait::async_trait;
use board::{PriceSnapshot, PricedItem};

mod cache;
mod client;
mod http;

pub use cache::{SnapshotCache, SyncState, SyncStatus};
pub use client::{SyncClient, SyncHandle, DEFAULT_POLL_PERIOD};
pub use http::HttpPriceSource;

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("server rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
}

impl SyncError {
    /// True when the server answered but refused the request.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }
}

impl From<hyper::Error> for SyncError {
    fn from(err: hyper::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;

/// Where snapshots come from and where replacements go.
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn fetch(&self) -> Result<PriceSnapshot>;

    /// Replaces the whole remote list and returns the authoritative result.
    async fn replace_all(&self, items: Vec<PricedItem>) -> Result<PriceSnapshot>;
}
