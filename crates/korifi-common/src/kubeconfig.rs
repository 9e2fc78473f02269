//! Kubeconfig document model and loader.
//!
//! Only the parts of a kubeconfig needed to find a client identity are
//! modelled: contexts (to resolve the current user) and users (certificate
//! and key material). Everything else in the document is ignored.
//!
//! ## Example Document
//!
//! ```yaml
//! apiVersion: v1
//! kind: Config
//! current-context: kind-korifi
//! contexts:
//! - name: kind-korifi
//!   context:
//!     cluster: kind-korifi
//!     user: kind-korifi
//! users:
//! - name: kind-korifi
//!   user:
//!     client-certificate-data: LS0tLS1CRUdJTi...
//!     client-key-data: LS0tLS1CRUdJTi...
//! ```
//!
//! `*-data` fields are base64 in the file and are decoded to raw bytes on
//! load. When a `*-data` field is absent, the file-reference form
//! (`client-certificate`, `client-key`) is read instead, relative to the
//! kubeconfig's own directory.
//!
//! ## Location
//!
//! [`default_path`] follows the usual client convention: the first entry of
//! `$KUBECONFIG`, otherwise `~/.kube/config`.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use base64::Engine;
use base64::alphabet;
use base64::engine::{GeneralPurpose, GeneralPurposeConfig};
use log::debug;
use serde::{Deserialize, Deserializer};

use crate::auth::{AuthEntry, AuthEntryCollection};
use crate::error::KubeConfigError;

/// Environment variable holding a list of kubeconfig paths.
pub const KUBECONFIG_ENV: &str = "KUBECONFIG";

// Kubernetes client loaders accept non-canonical trailing bits in `*-data`
const DATA_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_allow_trailing_bits(true),
);

/// A parsed kubeconfig document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct KubeConfig {
    /// Name of the context in use.
    #[serde(default)]
    pub current_context: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub contexts: Vec<NamedContext>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub users: Vec<NamedAuthInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NamedContext {
    pub name: String,
    #[serde(default)]
    pub context: Context,
}

/// Binds a cluster to a user.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Context {
    #[serde(default)]
    pub cluster: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub namespace: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NamedAuthInfo {
    pub name: String,
    #[serde(default)]
    pub user: AuthInfo,
}

/// Client credentials of a kubeconfig user.
///
/// Other authentication methods (tokens, exec plugins, ...) are ignored.
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AuthInfo {
    /// Decoded `client-certificate-data`.
    #[serde(default, deserialize_with = "base64_bytes")]
    pub client_certificate_data: Option<Vec<u8>>,
    /// Decoded `client-key-data`.
    #[serde(default, deserialize_with = "base64_bytes")]
    pub client_key_data: Option<Vec<u8>>,
    /// Path to a certificate file, used when `client-certificate-data` is absent.
    #[serde(default)]
    pub client_certificate: Option<PathBuf>,
    /// Path to a key file, used when `client-key-data` is absent.
    #[serde(default)]
    pub client_key: Option<PathBuf>,
}

impl std::fmt::Debug for AuthInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthInfo")
            .field(
                "client_certificate_data",
                &self.client_certificate_data.as_ref().map(Vec::len),
            )
            .field(
                "client_key_data",
                &self.client_key_data.as_ref().map(|_| "[REDACTED]"),
            )
            .field("client_certificate", &self.client_certificate)
            .field("client_key", &self.client_key)
            .finish()
    }
}

impl KubeConfig {
    /// Loads a kubeconfig file and resolves its file references.
    ///
    /// An empty file yields an empty configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file doesn't exist or can't be read
    /// - The YAML is malformed or a `*-data` field isn't valid base64
    /// - A referenced certificate or key file can't be read
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, KubeConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                KubeConfigError::NotFound(path.to_path_buf())
            } else {
                KubeConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;

        let mut config = Self::from_yaml_str(&contents)?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        config.resolve_file_references(base_dir)?;

        debug!(
            "Loaded kubeconfig from {} ({} users, {} contexts)",
            path.display(),
            config.users.len(),
            config.contexts.len()
        );
        Ok(config)
    }

    /// Parses a kubeconfig document held in memory.
    ///
    /// File references are left unresolved.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is malformed.
    pub fn from_yaml_str(contents: &str) -> Result<Self, KubeConfigError> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(contents)?)
    }

    /// Reads `client-certificate` / `client-key` files for users lacking inline data.
    ///
    /// Relative paths are resolved against `base_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if a referenced file can't be read.
    pub fn resolve_file_references(&mut self, base_dir: &Path) -> Result<(), KubeConfigError> {
        for named in &mut self.users {
            let user = &mut named.user;
            if user.client_certificate_data.is_none()
                && let Some(file) = &user.client_certificate
            {
                user.client_certificate_data = Some(read_referenced(base_dir, file)?);
            }
            if user.client_key_data.is_none()
                && let Some(file) = &user.client_key
            {
                user.client_key_data = Some(read_referenced(base_dir, file)?);
            }
        }
        Ok(())
    }

    /// The user bound to the current context, if any.
    #[must_use]
    pub fn current_user(&self) -> Option<&str> {
        let current = self.current_context.as_deref()?;
        self.contexts
            .iter()
            .find(|ctx| ctx.name == current)
            .and_then(|ctx| ctx.context.user.as_deref())
    }

    /// Collects every user into an [`AuthEntryCollection`].
    ///
    /// Missing material becomes an empty byte string; completeness is checked
    /// by whoever consumes the entry.
    #[must_use]
    pub fn auth_entries(&self) -> AuthEntryCollection {
        self.users
            .iter()
            .map(|named| {
                let user = &named.user;
                AuthEntry::builder()
                    .name(named.name.clone())
                    .client_certificate(user.client_certificate_data.clone().unwrap_or_default())
                    .client_key(user.client_key_data.clone().unwrap_or_default())
                    .build()
            })
            .collect()
    }
}

/// Resolves the kubeconfig location from the environment.
///
/// # Errors
///
/// Returns [`KubeConfigError::NoHomeDir`] when `$KUBECONFIG` is unset and the
/// home directory can't be determined.
pub fn default_path() -> Result<PathBuf, KubeConfigError> {
    resolve_path(None, std::env::var_os(KUBECONFIG_ENV), dirs::home_dir())
}

/// Picks a kubeconfig path: explicit path, else the first non-empty entry of
/// `kubeconfig_env`, else `<home>/.kube/config`.
///
/// # Errors
///
/// Returns [`KubeConfigError::NoHomeDir`] when every source is missing.
pub fn resolve_path(
    explicit: Option<&Path>,
    kubeconfig_env: Option<OsString>,
    home: Option<PathBuf>,
) -> Result<PathBuf, KubeConfigError> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }

    if let Some(first) = kubeconfig_env
        .as_deref()
        .and_then(|paths| std::env::split_paths(paths).find(|p| !p.as_os_str().is_empty()))
    {
        return Ok(first);
    }

    home.map(|home| home.join(".kube").join("config"))
        .ok_or(KubeConfigError::NoHomeDir)
}

fn read_referenced(base_dir: &Path, file: &Path) -> Result<Vec<u8>, KubeConfigError> {
    let path = base_dir.join(file);
    fs::read(&path).map_err(|source| KubeConfigError::Io { path, source })
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn base64_bytes<'de, D>(deserializer: D) -> Result<Option<Vec<u8>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)?
        .map(|encoded| {
            DATA_ENGINE
                .decode(encoded.trim())
                .map_err(|e| serde::de::Error::custom(format!("invalid base64 data: {e}")))
        })
        .transpose()
}
