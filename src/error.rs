/// Errors returned at the boundaries of the crate.
///
/// Only loading, storing and slicing key material can fail.
/// Circuits themselves never report noise, see `crate::verify` for that.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("field {field}: expected {expected}, found {found:?}")]
    Parse {
        field: usize,
        expected: &'static str,
        found: String,
    },
    #[error("file ended before field {field} ({expected})")]
    Truncated { field: usize, expected: &'static str },
    #[error("{0} packed bits cannot be addressed by a key set")]
    TooManyBits(usize),
    #[error("inconsistent key set: {0}")]
    Inconsistent(&'static str),
    #[error("snapshot encoding failed: {0}")]
    Encode(#[from] bincode::error::EncodeError),
    #[error("snapshot decoding failed: {0}")]
    Decode(#[from] bincode::error::DecodeError),
    #[error("requested {requested} packed bits but the key set only holds {available}")]
    NotEnoughBits { requested: usize, available: usize },
    #[error("no key set has been generated or loaded")]
    MissingKeySet,
}

pub type Result<T> = core::result::Result<T, Error>;
