use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum IoError {
    /// Reading or writing a file failed.
    File { path: PathBuf, message: String },
    /// An external tool is not on PATH.
    ToolMissing { tool: String },
    /// An external tool ran but reported failure.
    ToolFailed { tool: String, status: i32, stderr: String },
    /// The word-box document is not well-formed.
    Xml(String),
    /// CSV write error.
    Csv(String),
    /// JSON serialization error.
    Json(String),
}

impl IoError {
    pub fn file(path: &Path, err: impl fmt::Display) -> Self {
        Self::File { path: path.to_path_buf(), message: err.to_string() }
    }
}

impl fmt::Display for IoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File { path, message } => write!(f, "{}: {message}", path.display()),
            Self::ToolMissing { tool } => write!(f, "{tool} not found on PATH"),
            Self::ToolFailed { tool, status, stderr } => {
                write!(f, "{tool} failed (exit {status}): {stderr}")
            }
            Self::Xml(msg) => write!(f, "word-box parse error: {msg}"),
            Self::Csv(msg) => write!(f, "CSV error: {msg}"),
            Self::Json(msg) => write!(f, "JSON error: {msg}"),
        }
    }
}

impl std::error::Error for IoError {}
