use std::error;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum CoreError {
    UnknownDataset(std::string::String),
    InvalidValue(std::string::String, std::string::String),
    InvalidSettings(std::string::String),
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CoreError::UnknownDataset(name) => write!(f, "Unknown dataset: {}", name),
            CoreError::InvalidValue(field, value) => {
                write!(f, "Invalid value for {}: {:?}", field, value)
            }
            CoreError::InvalidSettings(msg) => write!(f, "Invalid settings: {}", msg),
        }
    }
}

impl error::Error for CoreError {}
