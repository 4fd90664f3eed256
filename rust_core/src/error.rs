//! Error taxonomy for the ticker's external collaborators
//!
//! None of these are fatal: the scheduler logs them and carries on, and the
//! next poll cycle retries the same operation.

use thiserror::Error;

/// Price feed unreachable or returned something unusable
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("price feed request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("price feed returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed price feed response: {0}")]
    Malformed(String),
}

/// Display unreachable or rejected a command
#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("device request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("device rejected {command}: {status} {body}")]
    Rejected {
        command: String,
        status: u16,
        body: String,
    },

    #[error("invalid device endpoint: {0}")]
    InvalidEndpoint(String),
}

/// Alert delivery failed
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("invalid mail address: {0}")]
    Address(String),

    #[error("failed to build alert message: {0}")]
    Message(String),

    #[error("mail transport error: {0}")]
    Transport(String),
}
