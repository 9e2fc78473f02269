//! Error types for the client library.

use korifi_common::KubeConfigError;
use thiserror::Error;

/// Errors that can occur when building a client or talking to the Korifi API.
///
/// Every error is terminal for the operation in progress: nothing is retried
/// and there is no fallback credential source.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ClientError {
    /// The kubeconfig is missing, unreadable, or malformed.
    #[error("Failed to load kubeconfig: {0}")]
    ConfigLoad(#[from] KubeConfigError),

    /// No kubeconfig user with the configured name.
    #[error("No credentials found for user '{0}'")]
    CredentialNotFound(String),

    /// The user exists but lacks certificate or key material.
    #[error("Credentials for user '{name}' have no {missing}")]
    CredentialIncomplete {
        /// Name of the incomplete user entry.
        name: String,
        /// Which half of the identity is absent.
        missing: &'static str,
    },

    /// Failure inside the request pipeline, passed through as received.
    ///
    /// Covers connection, TLS, and timeout failures as well as errors raised
    /// by middleware.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest_middleware::Error),

    /// HTTP client construction or response body failure.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The API answered with a status other than 200.
    #[error("Remote API error (HTTP {status}): {message}")]
    RemoteApi {
        /// HTTP status code.
        status: u16,
        /// Response body, or the canonical reason when the body is empty.
        message: String,
    },

    /// The API answered 200 with a body that isn't the expected document.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Client configuration issue.
    ///
    /// Invalid API URL or a token that can't be carried in a header.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Result type alias using `ClientError`.
pub type Result<T> = std::result::Result<T, ClientError>;

impl ClientError {
    /// Check if this error comes from credential extraction.
    pub const fn is_credential_error(&self) -> bool {
        matches!(
            self,
            Self::CredentialNotFound(_) | Self::CredentialIncomplete { .. }
        )
    }

    /// Check if the remote API rejected the request or answered with garbage.
    pub const fn is_remote_api_error(&self) -> bool {
        matches!(self, Self::RemoteApi { .. } | Self::InvalidResponse(_))
    }

    /// HTTP status of a [`ClientError::RemoteApi`] error.
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::RemoteApi { status, .. } => Some(*status),
            _ => None,
        }
    }
}
