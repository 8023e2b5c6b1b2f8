use thiserror::Error;

pub type DrawResult<T> = Result<T, DrawError>;

#[derive(Debug, Error)]
pub enum DrawError {
    #[error("invalid position '{0}'")]
    InvalidPosition(String),

    #[error("no active style")]
    NoActiveStyle,

    #[error("style '{0}' not found")]
    StyleNotFound(String),

    #[error("attribute '{0}' is not set")]
    MissingAttribute(&'static str),

    #[error("attribute '{field}' has an invalid value: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("mask is {mask_width}x{mask_height}, image is {width}x{height}")]
    MaskSize {
        mask_width: u32,
        mask_height: u32,
        width: u32,
        height: u32,
    },

    #[error("invalid pixel array: {0}")]
    InvalidArray(String),

    #[error("raster error: {0}")]
    Raster(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
