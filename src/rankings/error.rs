/**
 * ============================================================================
 * ERROR MODULE
 * ============================================================================
 *
 * PURPOSE: Error taxonomy of the rankings client
 *
 * - Configuration, Validation: raised synchronously to the host
 * - Network, RemoteRejection: only inside dispatched tasks, logged and dropped
 *
 * ============================================================================
 */

use std::path::PathBuf;

use crate::rankings::types::RequestKind;

pub type Result<T> = std::result::Result<T, RankingsError>;

#[derive(Debug, thiserror::Error)]
pub enum RankingsError {
    /// The settings document could not be read, parsed or written
    #[error("Failed to {action} settings file {path}: {message}")]
    Configuration {
        action: &'static str,
        path: PathBuf,
        message: String,
    },

    /// Namespace rejected by `with_namespace`
    #[error("Please do not use white-spaces in your plugin name: {0:?}")]
    Validation(String),

    /// Connection refused, DNS failure, I/O error mid-transfer
    #[error("{0}")]
    Network(String),

    /// Collector answered with a status of 400 or above
    #[error("{} (status {status}): {body}", .kind.failure_message())]
    RemoteRejection {
        kind: RequestKind,
        status: u16,
        body: String,
    },
}

impl RankingsError {
    pub(crate) fn configuration(
        action: &'static str,
        path: impl Into<PathBuf>,
        err: impl std::fmt::Display,
    ) -> Self {
        RankingsError::Configuration {
            action,
            path: path.into(),
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for RankingsError {
    fn from(err: reqwest::Error) -> Self {
        RankingsError::Network(err.to_string())
    }
}
