#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Malformed command grammar or a length/zero-bound violation. The
    /// message is the corrective text shown to the user.
    #[error("{0}")]
    Validation(String),

    /// Unknown playlist id or user reference.
    #[error("{0}")]
    NotFound(String),

    /// Playlist id already taken for the same user.
    #[error("{0}")]
    Duplicate(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Internal error")]
    Internal(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
