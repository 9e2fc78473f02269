//! Error types for kubeconfig loading.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while locating or reading a kubeconfig.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum KubeConfigError {
    /// The kubeconfig file does not exist.
    #[error("kubeconfig not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The kubeconfig, or a file it references, could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// Path of the file that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The document is not a valid kubeconfig.
    ///
    /// Also covers `*-data` fields that are not valid base64.
    #[error("malformed kubeconfig: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// No explicit path, no `KUBECONFIG`, and no home directory to fall back on.
    #[error("cannot determine kubeconfig location: no home directory")]
    NoHomeDir,
}
