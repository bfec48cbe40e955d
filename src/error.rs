//! Unified error type.

use std::fmt;

/// The error type returned by allium's fallible operations.
///
/// Application-level failures are responses written to the sink, and binding
/// failures surface through [`BindError`](crate::BindError); this type covers
/// infrastructure: binding the listen socket and accepting connections.
#[derive(Debug)]
pub struct Error(std::io::Error);

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "io: {}", self.0)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self(e)
    }
}
