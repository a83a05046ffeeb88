use std::fmt;

#[derive(Debug)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (overlapping tax sets, bad field index, etc.).
    ConfigValidation(String),
    /// Mapping resource could not be parsed.
    MappingParse(String),
    /// Amount text that does not follow any accepted decimal convention.
    AmountParse { value: String },
    /// IO error (file read, etc.).
    Io(String),
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::MappingParse(msg) => write!(f, "mapping parse error: {msg}"),
            Self::AmountParse { value } => write!(f, "cannot parse amount '{value}'"),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for ReconError {}
