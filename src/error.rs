use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("Malformed record: {message}")]
    MalformedRecord { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Failed to read input collection {path}: {message}")]
    ReadFailed { path: String, message: String },

    #[error("IO error: {message}")]
    IoError { message: String },

    #[error("DataFusion error: {0}")]
    DataFusionError(#[from] datafusion::error::DataFusionError),

    #[error("Arrow error: {0}")]
    ArrowError(#[from] datafusion::arrow::error::ArrowError),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Object store error: {0}")]
    ObjectStoreError(#[from] object_store::Error),
}

impl From<std::io::Error> for EtlError {
    fn from(err: std::io::Error) -> Self {
        EtlError::IoError {
            message: err.to_string(),
        }
    }
}
