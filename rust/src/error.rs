// Fetch error taxonomy and the report categories the batch logs under.

use std::fmt;

use thiserror::Error;

/// Reasons a single retrieval can fail.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Could not connect to the portal.
    #[error("connection error: {0}")]
    Connect(String),
    /// The request or body read exceeded its timeout.
    #[error("timeout: {0}")]
    Timeout(String),
    /// The portal answered with a non-success status.
    #[error("HTTP {status} for {url}")]
    HttpStatus { status: u16, url: String },
    /// Any other transport-level failure.
    #[error("request error: {0}")]
    Request(String),
    /// Local filesystem failure while writing the document.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// The operator asked the batch to stop.
    #[error("interrupted")]
    Interrupted,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FetchError {
    /// Network-class failures worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Connect(_) | Self::Timeout(_) | Self::HttpStatus { .. } | Self::Request(_)
        )
    }

    pub fn category(&self) -> ReportCategory {
        match self {
            Self::Connect(_) => ReportCategory::ConnectionError,
            Self::Timeout(_) => ReportCategory::Timeout,
            Self::HttpStatus { .. } => ReportCategory::HttpError,
            Self::Request(_) => ReportCategory::RequestError,
            Self::Interrupted => ReportCategory::Interrupt,
            Self::Io(_) | Self::Other(_) => ReportCategory::UnknownError,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout(e.to_string())
        } else if e.is_connect() {
            Self::Connect(e.to_string())
        } else if let Some(status) = e.status() {
            Self::HttpStatus {
                status: status.as_u16(),
                url: e.url().map(|u| u.to_string()).unwrap_or_default(),
            }
        } else {
            Self::Request(e.to_string())
        }
    }
}

/// Tag attached to every reported batch event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportCategory {
    BadId,
    ConnectionError,
    Timeout,
    HttpError,
    RequestError,
    Interrupt,
    UnknownError,
}

impl ReportCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BadId => "bad-id",
            Self::ConnectionError => "connection-error",
            Self::Timeout => "timeout",
            Self::HttpError => "http-error",
            Self::RequestError => "request-error",
            Self::Interrupt => "interrupt",
            Self::UnknownError => "unknown-error",
        }
    }
}

impl fmt::Display for ReportCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
