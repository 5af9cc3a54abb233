// Copyright 2020-2025 Martin Pool.

// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.

//! Errors from parsing paths or operating on them, independent of backend.

use std::error::Error as StdError;
use std::fmt;
use std::io;
use std::path::Path as StdPath;

use derive_more::Display;

/// An error from a path operation, as a generalization of IO errors.
#[derive(Debug)]
pub struct Error {
    /// What type of generally known error?
    pub kind: ErrorKind,
    /// The affected path, if known.
    pub path: Option<String>,
    /// The underlying error: for example an IO, S3, or HTTP error, or a
    /// description of what was wrong with an argument.
    pub source: Option<Box<dyn StdError + Send + Sync>>,
}

/// General categories of errors.
#[derive(Debug, Display, PartialEq, Eq, Clone, Copy)]
pub enum ErrorKind {
    #[display(fmt = "Not found")]
    NotFound,

    #[display(fmt = "Already exists")]
    AlreadyExists,

    #[display(fmt = "Not a directory")]
    NotADirectory,

    #[display(fmt = "Permission denied")]
    PermissionDenied,

    #[display(fmt = "Invalid argument")]
    InvalidArgument,

    #[display(fmt = "Not supported")]
    Unsupported,

    /// Paths of different kinds were compared.
    #[display(fmt = "Incompatible path kinds")]
    KindMismatch,

    #[display(fmt = "Other error")]
    Other,
}

impl From<io::ErrorKind> for ErrorKind {
    fn from(kind: io::ErrorKind) -> Self {
        match kind {
            io::ErrorKind::NotFound => ErrorKind::NotFound,
            io::ErrorKind::AlreadyExists => ErrorKind::AlreadyExists,
            io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied,
            io::ErrorKind::InvalidInput => ErrorKind::InvalidArgument,
            io::ErrorKind::Unsupported => ErrorKind::Unsupported,
            _ => ErrorKind::Other,
        }
    }
}

impl Error {
    pub fn new(kind: ErrorKind, path: impl ToString) -> Error {
        Error {
            kind,
            path: Some(path.to_string()),
            source: None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// An argument was malformed, with a description of why.
    pub fn invalid_argument(path: impl ToString, message: impl Into<String>) -> Error {
        let message: String = message.into();
        Error {
            kind: ErrorKind::InvalidArgument,
            path: Some(path.to_string()),
            source: Some(message.into()),
        }
    }

    /// The named operation is never available on this kind of path.
    pub fn unsupported(path: impl ToString, operation: &str) -> Error {
        Error {
            kind: ErrorKind::Unsupported,
            path: Some(path.to_string()),
            source: Some(format!("{operation}() is not supported on this path").into()),
        }
    }

    pub(crate) fn io_error(path: &StdPath, source: io::Error) -> Error {
        Error {
            kind: source.kind().into(),
            path: Some(path.to_string_lossy().into_owned()),
            source: Some(Box::new(source)),
        }
    }

    /// Attach a source error.
    #[must_use]
    pub fn with_source(self, source: impl Into<Box<dyn StdError + Send + Sync>>) -> Error {
        Error {
            source: Some(source.into()),
            ..self
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == ErrorKind::NotFound
    }

    pub fn is_already_exists(&self) -> bool {
        self.kind == ErrorKind::AlreadyExists
    }

    /// The path where this error occurred, if known.
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }
}

impl From<io::Error> for Error {
    fn from(source: io::Error) -> Error {
        Error {
            kind: source.kind().into(),
            path: None,
            source: Some(Box::new(source)),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(ref path) = self.path {
            write!(f, ": {path}")?;
        }
        if let Some(source) = &self.source {
            write!(f, ": {source}")?;
        }
        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source.as_ref().map(|s| &**s as _)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
