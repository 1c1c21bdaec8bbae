use std::io;

use thiserror::Error;

/// Failures raised by the collaborator adapters.
///
/// The sequencing and tracking math is total and never returns these.
#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Unexpected status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Not authenticated")]
    NotAuthenticated,
    #[error("No route found: {0}")]
    NoRoute(String),
    #[error("Geolocation unavailable: {0}")]
    Geolocation(String),
    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
