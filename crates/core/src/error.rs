//! Error kinds raised by the engine, its selections and the request builder.

use std::fmt;

use thiserror::Error;

/// Direction of a history hop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Back,
    Forward,
}

impl Direction {
    fn history_kind(&self) -> &'static str {
        match self {
            Direction::Back => "historical",
            Direction::Forward => "future",
        }
    }
}

fn plural(count: &usize) -> &'static str {
    if *count > 1 {
        "s"
    } else {
        ""
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Back => write!(f, "back"),
            Direction::Forward => write!(f, "forward"),
        }
    }
}

/// Errors surfaced by [`Engine`](crate::Engine) and [`Selection`](crate::Selection).
///
/// None of these poison the engine: after any of them the session can keep
/// navigating from the state it had before the failing call.
#[derive(Debug, Error)]
pub enum Error {
    /// Unparsable URI, unsupported scheme, relative URI without a base, or a
    /// transport failure that produced no response at all.
    #[error("invalid URI '{uri}': {reason}")]
    InvalidUri {
        uri: String,
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("the method '{0}' is not supported")]
    UnsupportedMethod(String),

    #[error(
        "Can't navigate {direction} {requested} step{plural}, as there's only {available} \"{kind}\" requests to navigate to.",
        plural = plural(.requested),
        kind = .direction.history_kind()
    )]
    OutOfRange {
        direction: Direction,
        requested: usize,
        available: usize,
    },

    #[error("{0}")]
    InvalidOperation(String),

    #[error("the index {index} is out of range; there are only {count} 'option' elements")]
    IndexOutOfRange { index: usize, count: usize },

    #[error("{0}")]
    InvalidArgument(String),
}

impl Error {
    pub(crate) fn invalid_uri(uri: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidUri {
            uri: uri.into(),
            reason: reason.into(),
            source: None,
        }
    }

    pub(crate) fn invalid_operation(message: impl Into<String>) -> Self {
        Error::InvalidOperation(message.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
