use thiserror::Error;

/// Errors surfaced by the autocomplete core.
#[derive(Debug, Error)]
pub enum AutocompleteError {
    #[error("query {query:?} is shorter than {min_len} characters")]
    InvalidQuery { query: String, min_len: usize },

    #[error("autocomplete lock poisoned by a panicking writer")]
    Poisoned,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("config serialize error: {0}")]
    ConfigWrite(#[from] toml::ser::Error),
}

pub type Result<T> = std::result::Result<T, AutocompleteError>;
