//! Framework-agnostic error taxonomy. Nothing downstream of this type
//! knows about HTTP status codes — that mapping lives entirely in the
//! HTTP surface, per the design's "the surface is the sole component
//! that generates HTTP status codes".

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<tqs_store::StoreError> for EngineError {
    fn from(err: tqs_store::StoreError) -> Self {
        match err {
            tqs_store::StoreError::Conflict => Self::Conflict("queue already exists".into()),
            other => Self::Internal(anyhow::anyhow!(other)),
        }
    }
}
