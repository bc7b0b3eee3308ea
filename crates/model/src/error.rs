use crate::core::encoding::Encoding;
use thiserror::Error;

/// Raised when a value cannot be turned into the delimited text encoding.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FormatError {
    #[error("Character {ch:?} cannot be represented in {encoding}")]
    Unencodable { ch: char, encoding: Encoding },

    #[error("Unsupported text encoding: {0}")]
    UnsupportedEncoding(String),
}
