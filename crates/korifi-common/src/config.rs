use std::path::PathBuf;

/// Kubeconfig user created by `kind` for a cluster named `korifi`.
pub const DEFAULT_USER: &str = "kind-korifi";

/// Where a local Korifi installation serves its API.
pub const DEFAULT_API_URL: &str = "https://localhost";

/// Configuration for a Korifi client.
///
/// Every field has a default, so the usual starting point is
/// [`ClientConfig::default`] followed by `with_*` calls.
///
/// TLS peer verification is on unless explicitly disabled with
/// [`ClientConfig::with_insecure_skip_tls_verify`].
///
/// # Examples
///
/// ```
/// use korifi_common::ClientConfig;
///
/// let config = ClientConfig::new("https://api.korifi.example")
///     .with_user("cf-admin")
///     .with_timeout_seconds(30);
///
/// assert_eq!(config.user, "cf-admin");
/// assert!(!config.insecure_skip_tls_verify);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Name of the kubeconfig user whose certificate authenticates requests.
    pub user: String,
    /// Base URL of the Korifi API.
    pub api_url: String,
    /// Explicit kubeconfig path. `None` means `$KUBECONFIG`, then `~/.kube/config`.
    pub kubeconfig: Option<PathBuf>,
    /// Skip verification of the server's certificate chain and host name.
    pub insecure_skip_tls_verify: bool,
    /// Extra PEM-encoded root certificates to trust.
    pub ca_certificate: Option<Vec<u8>>,
    /// Total request timeout in seconds. `None` means no timeout; zero is
    /// rejected when the client is built.
    pub timeout_seconds: Option<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user: DEFAULT_USER.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            kubeconfig: None,
            insecure_skip_tls_verify: false,
            ca_certificate: None,
            timeout_seconds: None,
        }
    }
}

impl ClientConfig {
    /// Creates a configuration for the given API URL with all other defaults.
    #[must_use]
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    #[must_use]
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    #[must_use]
    pub fn with_kubeconfig(mut self, path: impl Into<PathBuf>) -> Self {
        self.kubeconfig = Some(path.into());
        self
    }

    /// Disables (or re-enables) TLS peer verification.
    ///
    /// Only meant for local development clusters with self-signed
    /// certificates. Prefer [`ClientConfig::with_ca_certificate`].
    #[must_use]
    pub const fn with_insecure_skip_tls_verify(mut self, insecure: bool) -> Self {
        self.insecure_skip_tls_verify = insecure;
        self
    }

    /// Trusts the root certificates in the given PEM bundle.
    #[must_use]
    pub fn with_ca_certificate(mut self, pem: impl Into<Vec<u8>>) -> Self {
        self.ca_certificate = Some(pem.into());
        self
    }

    #[must_use]
    pub const fn with_timeout_seconds(mut self, seconds: u64) -> Self {
        self.timeout_seconds = Some(seconds);
        self
    }
}
