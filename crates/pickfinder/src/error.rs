use common::error::StoreError;
use thiserror::Error;

/// Why a search produced no result list at all.
#[derive(Debug, Error)]
pub enum FindError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("search cancelled")]
    Cancelled,
}

impl FindError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Store(e) => e.kind(),
            Self::Cancelled => "cancelled",
        }
    }
}
