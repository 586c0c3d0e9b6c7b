use thiserror::Error;

pub type Result<T> = std::result::Result<T, GraphError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    /// A hit line could not be parsed; `line` is 1-based
    #[error("Input format error at line {line}: {message}")]
    InputFormat { line: usize, message: String },

    /// A layout or community strategy failed or returned a malformed result
    #[error("{stage} failed for subgraph {subgraph}: {message}")]
    DelegatedService {
        stage: &'static str,
        subgraph: usize,
        message: String,
    },

    #[error("Invalid option: {0}")]
    InvalidOption(String),

    #[error("Graph assembly error: {0}")]
    Assembly(String),
}

impl GraphError {
    pub fn input_format(line: usize, message: impl Into<String>) -> Self {
        GraphError::InputFormat {
            line,
            message: message.into(),
        }
    }
}
