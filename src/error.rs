use thiserror::Error;

/// Errors surfaced at the edges of a practice session.
///
/// Configuration problems are rejected where settings are accepted, before a
/// value reaches the scheduler. An exhausted word pool is not an error at
/// runtime; `EmptyWordPool` is only raised when a session cannot be set up at all.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("unsupported prompt frequency: {0} bars (expected 4, 8 or 16)")]
    UnsupportedFrequency(u32),

    #[error("unsupported difficulty level: {0} (expected 1, 2 or 3)")]
    UnsupportedDifficulty(u8),

    #[error("unknown beat: {0}")]
    UnknownBeat(String),

    #[error("no words available for any difficulty")]
    EmptyWordPool,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Database(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_value() {
        assert_eq!(
            Error::UnsupportedFrequency(5).to_string(),
            "unsupported prompt frequency: 5 bars (expected 4, 8 or 16)"
        );
        assert_eq!(
            Error::InvalidArgument("bpm must be > 0, got 0".into()).to_string(),
            "invalid argument: bpm must be > 0, got 0"
        );
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
