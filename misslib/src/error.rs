use std::fmt;
use thiserror::Error;

/// A directive which must appear in every cache specification
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum MissingField {
    BlockSize,
    Levels,
    WriteMissPolicy,
    ReplacementPolicy,
}

impl fmt::Display for MissingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            MissingField::BlockSize => "no block size specified",
            MissingField::Levels => "no cache levels specified",
            MissingField::WriteMissPolicy => "no write miss policy specified",
            MissingField::ReplacementPolicy => "no replacement policy specified",
        };
        f.write_str(msg)
    }
}

/// A malformed or underspecified cache specification
///
/// Line numbers are 1-based and refer to the textual specification. Errors raised while
/// validating an in-memory `CacheSpec` have no line to point at.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("line {line}: '{directive}' line should contain exactly {expected} tokens, has {found}")]
    FieldCount {
        line: usize,
        directive: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("line {line}: could not read {field} value '{value}'")]
    NotANumber {
        line: usize,
        field: &'static str,
        value: String,
    },
    #[error("line {line}: '{directive}' specified more than once")]
    Duplicate { line: usize, directive: &'static str },
    #[error("{field} must be a positive integer")]
    NotPositive { field: String },
    #[error("underspecified cache configuration: {}", join(.0, ", "))]
    Underspecified(Vec<MissingField>),
    #[error("invalid cache configuration: {}", join(.0, "; "))]
    Invalid(Vec<ConfigurationError>),
}

fn join<T: fmt::Display>(items: &[T], separator: &str) -> String {
    items
        .iter()
        .map(|item| item.to_string())
        .collect::<Vec<_>>()
        .join(separator)
}

/// The first token of a specification line is not a known directive
#[derive(Debug, Clone, Eq, PartialEq, Error)]
#[error("line {line}: unexpected keyword '{keyword}'")]
pub struct UnrecognizedDirectiveError {
    pub line: usize,
    pub keyword: String,
}

/// Anything that can go wrong while reading a textual cache specification
#[derive(Debug, Error)]
pub enum SpecError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    UnrecognizedDirective(#[from] UnrecognizedDirectiveError),
    #[error("couldn't read the cache specification: {0}")]
    Io(#[from] std::io::Error),
}

/// A reference record which is not exactly four whitespace separated integers
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum MalformedRecordError {
    #[error("line {line}: expected 4 fields, found {found}")]
    FieldCount { line: usize, found: usize },
    #[error("line {line}: {field} field '{value}' is not an integer")]
    NotANumber {
        line: usize,
        field: &'static str,
        value: String,
    },
}

impl MalformedRecordError {
    /// The 1-based line of the reference stream the record came from
    pub fn line(&self) -> usize {
        match self {
            MalformedRecordError::FieldCount { line, .. } => *line,
            MalformedRecordError::NotANumber { line, .. } => *line,
        }
    }
}

/// Anything that aborts a classification run
#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error(transparent)]
    MalformedRecord(#[from] MalformedRecordError),
    #[error("couldn't read the reference stream: {0}")]
    Io(#[from] std::io::Error),
}
