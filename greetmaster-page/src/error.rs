use thiserror::Error;

pub type PageResult<T> = Result<T, PageError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PageError {
    #[error("Unknown page encoding '{label}'")]
    UnknownEncoding { label: String },

    #[error("Invalid field data: {0}")]
    FieldData(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl From<base64::DecodeError> for PageError {
    fn from(err: base64::DecodeError) -> Self {
        PageError::FieldData(err.to_string())
    }
}

impl From<std::string::FromUtf8Error> for PageError {
    fn from(err: std::string::FromUtf8Error) -> Self {
        PageError::FieldData(err.to_string())
    }
}
