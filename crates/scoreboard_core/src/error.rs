use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    InvalidParameter(String),
    UnknownSide(String),
    UnknownPeriod(String),
    UnknownCommand(String),
    ValidationError(String),
    SerializationError(String),
    DeserializationError(String),
    ParseError(String),
    IoError(String),
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CoreError::InvalidParameter(msg) => write!(f, "Invalid parameter: {}", msg),
            CoreError::UnknownSide(side) => write!(f, "Unknown side: {}", side),
            CoreError::UnknownPeriod(period) => write!(f, "Unknown period: {}", period),
            CoreError::UnknownCommand(cmd) => write!(f, "Unknown command: {}", cmd),
            CoreError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            CoreError::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            CoreError::DeserializationError(msg) => write!(f, "Deserialization error: {}", msg),
            CoreError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            CoreError::IoError(msg) => write!(f, "IO error: {}", msg),
        }
    }
}

impl std::error::Error for CoreError {}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_data() || err.is_syntax() || err.is_eof() {
            CoreError::DeserializationError(err.to_string())
        } else {
            CoreError::SerializationError(err.to_string())
        }
    }
}

impl From<serde_yaml::Error> for CoreError {
    fn from(err: serde_yaml::Error) -> Self {
        CoreError::ParseError(err.to_string())
    }
}

impl From<std::io::Error> for CoreError {
    fn from(err: std::io::Error) -> Self {
        CoreError::IoError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
