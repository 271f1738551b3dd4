use thiserror::Error;

/// Failures surfaced by the tabular store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store query {op} failed: {source}")]
    Query {
        op: &'static str,
        #[source]
        source: rusqlite::Error,
    },
    #[error("store unavailable: {0}")]
    Connection(String),
    #[error("invalid {table} row: {detail}")]
    InvalidRow { table: &'static str, detail: String },
}

impl StoreError {
    pub fn invalid_row(table: &'static str, detail: impl Into<String>) -> Self {
        Self::InvalidRow {
            table,
            detail: detail.into(),
        }
    }

    /// Short label for the `kind` metric dimension.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Query { .. } => "query",
            Self::Connection(_) => "connection",
            Self::InvalidRow { .. } => "invalid_row",
        }
    }
}
