//! Error types for the collector
//!
//! Startup errors are fatal and stop the process before any pipeline stage
//! runs. Every other error is scoped to one entity (a ladder tier, a player, a
//! match id) and is reported without aborting sibling work.

use crate::keys::KeyError;
use crate::patch::PatchParseError;
use thiserror::Error;

/// Outcome of a single API request that did not produce a payload
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network failure or timeout; retried up to the configured count
    #[error("Transport error after {attempts} attempt(s): {message}")]
    Transport { attempts: u32, message: String },

    /// HTTP 403: the key is invalid or lacks access to the endpoint
    #[error("Forbidden (403) for {path}: API key is invalid or lacks access to this endpoint")]
    Auth { path: String },

    /// Body did not match the expected shape
    #[error("Failed to decode response from {path}: {message}")]
    Decode { path: String, message: String },

    /// Any other non-200 status
    #[error("HTTP {status} from {path}")]
    SoftHttp { status: u16, path: String },

    /// The run was cancelled before the request completed
    #[error("Request cancelled")]
    Cancelled,
}

impl FetchError {
    pub fn is_auth(&self) -> bool {
        matches!(self, FetchError::Auth { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, FetchError::Cancelled)
    }
}

/// Failure turning a fetched match into statistic keys
#[derive(Debug, Error)]
pub enum DeriveError {
    #[error(transparent)]
    Patch(#[from] PatchParseError),

    #[error(transparent)]
    Key(#[from] KeyError),
}

/// Failure ingesting one match id
#[derive(Debug, Error)]
pub enum IngestError {
    /// Match payload could not be fetched; the id stays unmarked
    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// Payload fetched and marked, but keys could not be derived
    #[error("Derivation failed: {0}")]
    Derive(#[from] DeriveError),

    /// Store operation failed
    #[error("Persistence failed: {0}")]
    Persistence(#[from] tftstat_common::Error),
}

/// Fatal conditions detected before any pipeline starts
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("API key is empty")]
    MissingApiKey,

    #[error("No regions configured")]
    NoRegions,

    #[error("Region lookup failed: {0}")]
    UnknownRegion(#[source] tftstat_common::Error),

    #[error("API key rejected for region {region}")]
    Unauthorized {
        region: String,
        #[source]
        source: FetchError,
    },

    #[error("API key validation failed for region {region}")]
    Validation {
        region: String,
        #[source]
        source: FetchError,
    },
}
