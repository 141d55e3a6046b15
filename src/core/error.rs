use thiserror::Error;

#[derive(Error, Debug)]
pub enum SaveError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Writer for '{0}' is already closed")]
    WriterClosed(String),

    #[error("Previous background save still has {0} file(s) in flight")]
    FlushPending(usize),

    #[error("Decay error: {0}")]
    Decay(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Corrupt save file: {0}")]
    Corrupt(String),

    #[error("Lock error: {0}")]
    Lock(String),
}

pub type Result<T> = std::result::Result<T, SaveError>;

impl From<std::io::Error> for SaveError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for SaveError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::Lock(err.to_string())
    }
}
