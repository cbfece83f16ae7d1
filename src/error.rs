use thiserror::Error;

pub type BuilderResult<T> = Result<T, BuilderError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BuilderError {
    #[error("Unknown element type '{0}'")]
    UnknownElementType(String),

    #[error("Invalid column count {0}: a layout needs at least one column")]
    InvalidColumnCount(usize),

    #[error("Layouts cannot be placed inside a layout column")]
    NestedLayout,

    #[error("Element at index {0} is not a layout")]
    NotALayout(usize),

    #[error("Variable path is empty")]
    EmptyVariablePath,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Deserialization error: {0}")]
    Deserialize(String),

    #[error("Image upload failed: {0}")]
    Upload(String),

    #[error("DOM error: {0}")]
    Dom(String),
}

impl From<serde_json::Error> for BuilderError {
    fn from(err: serde_json::Error) -> Self {
        BuilderError::Deserialize(err.to_string())
    }
}
