// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Library error type.
//!
//! Malformed records are never errors: they are dropped from aggregates
//! while parsing. Everything here is something a caller can act on.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Upstream store unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Permission denied for '{0}'")]
    PermissionDenied(String),

    #[error("'{0}' not found")]
    NotFound(String),

    #[error("Invalid month '{0}', expected YYYY-MM")]
    InvalidMonth(String),

    #[error("Invalid page {0}, pages start at 1")]
    InvalidPage(usize),

    #[error("Database operation failed: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// The request URL may carry the auth token in its query, so only its path
/// survives into the error text.
impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        let path = e.url().map(|u| u.path().to_string()).unwrap_or_default();
        match e.status() {
            Some(s) if s.as_u16() == 401 || s.as_u16() == 403 => Error::PermissionDenied(path),
            _ => Error::UpstreamUnavailable(format!("{} ({})", e.without_url(), path)),
        }
    }
}
