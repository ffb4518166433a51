// ABOUTME: Error taxonomy for session storage and session commands.
// ABOUTME: Invalid names, malformed session files, vanished files, and raw I/O failures.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors raised by the session store, codec, and commands.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The session name cannot exist as a file in the sessions directory.
    #[error("Invalid Session Name: {name} ({reason})")]
    InvalidName { name: String, reason: String },

    /// The session file is not valid JSON or lacks required keys.
    #[error("Malformed session file {}: {reason}", .path.display())]
    MalformedSession { path: PathBuf, reason: String },

    /// The session file vanished between enumeration and use.
    #[error("Session file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SessionError {
    /// Classify an I/O error for `path`, promoting `NotFound` to its own variant.
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound(path.to_path_buf())
        } else {
            Self::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }

    pub fn invalid_name(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidName {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    pub fn malformed(path: &Path, reason: impl Into<String>) -> Self {
        Self::MalformedSession {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }
}

pub type Result<T, E = SessionError> = std::result::Result<T, E>;
