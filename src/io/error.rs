use crate::model::error::Error as RecordError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O operation failed: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("failed to serialize TOML: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("failed to read {context}: {details}")]
    Parse { context: String, details: String },

    #[error("no kind named '{0}' in the catalog")]
    UnknownKind(String),

    #[error("failed to convert attribute value: {0}")]
    Conversion(String),

    #[error(transparent)]
    Record(#[from] RecordError),
}

impl From<super::util::ConversionError> for Error {
    fn from(e: super::util::ConversionError) -> Self {
        Error::Conversion(e.to_string())
    }
}

impl Error {
    pub fn parse(context: impl Into<String>, details: impl Into<String>) -> Self {
        Self::Parse {
            context: context.into(),
            details: details.into(),
        }
    }
}
