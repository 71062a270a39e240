use thiserror::Error;

#[derive(Error, Debug)]
pub enum TreeError {
    #[error("Empty path: nothing to assign")]
    EmptyPath,

    #[error("Path conflict at '{segment}' in {path:?}: cannot descend into a {found}")]
    PathConflict {
        path: Vec<String>,
        segment: String,
        found: &'static str,
    },

    #[error("Index '{segment}' in {path:?} out of range: array of {len}, max growth {max_growth}")]
    IndexOutOfRange {
        path: Vec<String>,
        segment: String,
        len: usize,
        max_growth: usize,
    },

    #[error("config error: {message}")]
    Config { message: String },
}

pub type TreeResult<T> = Result<T, TreeError>;

pub(crate) fn config_err(e: impl std::fmt::Display) -> TreeError {
    TreeError::Config {
        message: e.to_string(),
    }
}
