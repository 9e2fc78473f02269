//! Korifi API client assembly.
//!
//! [`KorifiClient`] combines three pieces:
//!
//! - an inner `reqwest::Client` carrying the TLS and timeout settings,
//! - the [`ClientCertAuth`] middleware holding the derived token,
//! - the base URL of the Korifi API.
//!
//! # Examples
//!
//! ```no_run
//! use korifi_client::KorifiClient;
//! use korifi_common::ClientConfig;
//!
//! # async fn example() -> anyhow::Result<()> {
//! // Reads ~/.kube/config (or $KUBECONFIG) and authenticates as `kind-korifi`
//! let client = KorifiClient::from_kubeconfig(ClientConfig::default())?;
//!
//! let info = client.get_info().await?;
//! println!("{} {}", info.name, info.version);
//! # Ok(())
//! # }
//! ```
//!
//! # TLS
//!
//! Server certificates are verified by default. A development cluster with a
//! self-signed certificate is best handled by trusting its CA through
//! [`ClientConfig::with_ca_certificate`]; disabling verification with
//! [`ClientConfig::with_insecure_skip_tls_verify`] is possible but sends the
//! private-key-bearing token to any server that answers.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info, warn};
use reqwest::StatusCode;
use reqwest::header::ACCEPT;
use reqwest_middleware::ClientWithMiddleware;
use url::Url;

use korifi_common::kubeconfig;
use korifi_common::{AuthEntryCollection, ClientConfig, InfoV3Response, KubeConfig};

use crate::credentials::extract_token;
use crate::error::{ClientError, Result};
use crate::middleware::ClientCertAuth;

/// Path of the platform information endpoint, relative to the API URL.
pub const INFO_ENDPOINT: &str = "v3/info";

/// Client for the Korifi API.
///
/// Every request sent through [`KorifiClient::http`] or the typed helpers
/// carries the `ClientCert` authorization header. The client is cheaply
/// cloneable and can be shared across tasks.
#[derive(Clone)]
pub struct KorifiClient {
    client: ClientWithMiddleware,
    base_url: Url,
    config: Arc<ClientConfig>,
}

// Custom Debug implementation to keep the middleware stack out of logs
impl std::fmt::Debug for KorifiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KorifiClient")
            .field("base_url", &self.base_url.as_str())
            .field("user", &self.config.user)
            .field(
                "insecure_skip_tls_verify",
                &self.config.insecure_skip_tls_verify,
            )
            .finish_non_exhaustive()
    }
}

impl KorifiClient {
    /// Creates a client authenticating as `config.user` from `entries`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `config.api_url` isn't an absolute http(s) URL
    /// - The CA bundle can't be parsed or the HTTP client fails to build
    /// - The user is missing from `entries` or lacks a certificate or key
    pub fn new(config: ClientConfig, entries: &AuthEntryCollection) -> Result<Self> {
        let base_url = parse_base_url(&config.api_url)?;
        let transport = build_transport(&config)?;

        let token = extract_token(entries, &config.user)?;
        let client = reqwest_middleware::ClientBuilder::new(transport)
            .with(ClientCertAuth::new(&token)?)
            .build();

        info!(
            "Korifi client ready for {} as user '{}'",
            base_url, config.user
        );

        Ok(Self {
            client,
            base_url,
            config: Arc::new(config),
        })
    }

    /// Creates a client from the kubeconfig named by the configuration.
    ///
    /// Uses `config.kubeconfig` when set, otherwise the first entry of
    /// `$KUBECONFIG`, otherwise `~/.kube/config`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::ConfigLoad`] if the kubeconfig can't be located
    /// or loaded, and any error of [`KorifiClient::new`].
    pub fn from_kubeconfig(config: ClientConfig) -> Result<Self> {
        let path = match &config.kubeconfig {
            Some(path) => path.clone(),
            None => kubeconfig::default_path()?,
        };
        let kubeconfig = KubeConfig::from_file(&path)?;
        Self::new(config, &kubeconfig.auth_entries())
    }

    /// Get the client's configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The authenticated HTTP client, for endpoints without a typed helper.
    pub const fn http(&self) -> &ClientWithMiddleware {
        &self.client
    }

    /// The API base URL, always ending in `/`.
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolves an API path such as `v3/apps` against the base URL.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Configuration`] if the result isn't a valid URL.
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ClientError::Configuration(format!("Invalid endpoint '{path}': {e}")))
    }

    /// Fetches platform information from `GET /v3/info`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The request fails in transit ([`ClientError::Transport`])
    /// - The API answers with a status other than 200 ([`ClientError::RemoteApi`])
    /// - The body isn't an info document ([`ClientError::InvalidResponse`])
    pub async fn get_info(&self) -> Result<InfoV3Response> {
        let url = self.endpoint(INFO_ENDPOINT)?;
        debug!("GET {url}");

        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_else(|e| {
                debug!("Failed to read error body for status {status}: {e}");
                String::new()
            });
            let message = if body.trim().is_empty() {
                status.canonical_reason().unwrap_or("unknown status").to_string()
            } else {
                body
            };
            error!("Info request failed with status {status}: {message}");
            return Err(ClientError::RemoteApi {
                status: status.as_u16(),
                message,
            });
        }

        response.json::<InfoV3Response>().await.map_err(|e| {
            if e.is_decode() {
                ClientError::InvalidResponse(format!("failed to decode info document: {e}"))
            } else {
                ClientError::Network(e)
            }
        })
    }
}

/// Builds the inner transport from the TLS and timeout settings.
fn build_transport(config: &ClientConfig) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder();

    if config.insecure_skip_tls_verify {
        warn!("TLS peer verification is disabled; server certificates will not be checked");
        builder = builder.danger_accept_invalid_certs(true);
    }

    if let Some(pem) = &config.ca_certificate {
        let certificates = reqwest::Certificate::from_pem_bundle(pem)?;
        if certificates.is_empty() {
            return Err(ClientError::Configuration(
                "CA bundle contains no PEM certificates".to_string(),
            ));
        }
        debug!("Trusting {} additional CA certificate(s)", certificates.len());
        for certificate in certificates {
            builder = builder.add_root_certificate(certificate);
        }
    }

    if let Some(timeout) = config.timeout_seconds {
        if timeout == 0 {
            return Err(ClientError::Configuration(
                "timeout must be at least one second".to_string(),
            ));
        }
        builder = builder.timeout(Duration::from_secs(timeout));
    }

    Ok(builder.build()?)
}

fn parse_base_url(api_url: &str) -> Result<Url> {
    let mut url = Url::parse(api_url)
        .map_err(|e| ClientError::Configuration(format!("Invalid API URL '{api_url}': {e}")))?;

    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        return Err(ClientError::Configuration(format!(
            "API URL must be an absolute http(s) URL: {api_url}"
        )));
    }

    // Url::join replaces the last segment unless the path ends with '/'
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]

    use std::fs;

    use super::*;
    use korifi_common::AuthEntry;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    // Self-signed P-256 CA, CN=korifi-test-ca
    const TEST_CA_PEM: &[u8] = b"-----BEGIN CERTIFICATE-----
MIIBiTCCAS+gAwIBAgIUd1CS+VW6VhecXo1NkXM3waZyJCIwCgYIKoZIzj0EAwIw
GTEXMBUGA1UEAwwOa29yaWZpLXRlc3QtY2EwIBcNMjYxMDE3MDYwMTUwWhgPMjEy
NjA5MjMwNjAxNTBaMBkxFzAVBgNVBAMMDmtvcmlmaS10ZXN0LWNhMFkwEwYHKoZI
zj0CAQYIKoZIzj0DAQcDQgAEFrqJRmru7XIfa1t/q+1X+FG6otYCvfk8J8qQmZuI
EeFAowVjf3dkrH5WpW2LYiTGZ/GBNABZbPbsCMfhNeeiBqNTMFEwHQYDVR0OBBYE
FJbCeZtyDXmDRqSmgg0cZvAGCBqBMB8GA1UdIwQYMBaAFJbCeZtyDXmDRqSmgg0c
ZvAGCBqBMA8GA1UdEwEB/wQFMAMBAf8wCgYIKoZIzj0EAwIDSAAwRQIhAK4ZhoQ+
lpzBVmQccEEFLfDk9r+CgDd6usZcIVdJzmb7AiBuCu4FUODA/+1MIHGAjhUEdOyW
NLHvA06UaacedKJRIQ==
-----END CERTIFICATE-----
";

    fn kind_entries() -> AuthEntryCollection {
        std::iter::once(
            AuthEntry::builder()
                .name("kind-korifi")
                .client_certificate(vec![0x00])
                .client_key(vec![0x04])
                .build(),
        )
        .collect()
    }

    fn create_test_client(base_url: &str) -> KorifiClient {
        KorifiClient::new(ClientConfig::new(base_url), &kind_entries()).unwrap()
    }

    #[tokio::test]
    async fn test_get_info_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v3/info"))
            .and(header("authorization", "ClientCert AAQ="))
            .and(header("accept", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "name": "korifi",
                "version": "v0.13.0",
                "build": "",
                "custom": {}
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server.uri());
        let info = client.get_info().await.unwrap();

        assert_eq!(
            info,
            InfoV3Response {
                name: "korifi".to_string(),
                version: "v0.13.0".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_get_info_server_error_not_retried() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v3/info"))
            .respond_with(ResponseTemplate::new(500).set_body_string("internal failure"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server.uri());
        let err = client.get_info().await.unwrap_err();

        assert!(err.is_remote_api_error());
        assert!(matches!(
            err,
            ClientError::RemoteApi { status: 500, ref message } if message == "internal failure"
        ));
    }

    #[tokio::test]
    async fn test_get_info_empty_error_body_uses_reason() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server.uri());
        let err = client.get_info().await.unwrap_err();

        assert_eq!(err.status(), Some(401));
        assert!(err.to_string().contains("Unauthorized"));
    }

    #[tokio::test]
    async fn test_get_info_non_200_success_is_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server.uri());
        let err = client.get_info().await.unwrap_err();
        assert_eq!(err.status(), Some(204));
    }

    #[tokio::test]
    async fn test_get_info_malformed_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server.uri());
        let err = client.get_info().await.unwrap_err();
        assert!(matches!(err, ClientError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_get_info_connection_refused() {
        // Bind then drop to get a port with nothing listening
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = create_test_client(&format!("http://{addr}"));
        let err = client.get_info().await.unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)));
    }

    #[tokio::test]
    async fn test_api_url_with_path_prefix() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/korifi/v3/info"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "name": "korifi",
                "version": "dev"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&format!("{}/korifi", mock_server.uri()));
        let info = client.get_info().await.unwrap();
        assert_eq!(info.version, "dev");
    }

    #[test]
    fn test_missing_user_fails_construction() {
        let config = ClientConfig::default().with_user("nobody");
        let err = KorifiClient::new(config, &kind_entries()).unwrap_err();
        assert!(matches!(err, ClientError::CredentialNotFound(ref name) if name == "nobody"));
    }

    #[test]
    fn test_empty_entries_fail_construction() {
        let err = KorifiClient::new(ClientConfig::default(), &AuthEntryCollection::new())
            .unwrap_err();
        assert!(err.is_credential_error());
    }

    #[test]
    fn test_invalid_api_url() {
        for bad in ["not a url", "ftp://example.com", "mailto:someone@example.com"] {
            let err = KorifiClient::new(ClientConfig::new(bad), &kind_entries()).unwrap_err();
            assert!(
                matches!(err, ClientError::Configuration(_)),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_endpoint_resolution() {
        let client = create_test_client("https://api.example/prefix");
        assert_eq!(client.base_url().as_str(), "https://api.example/prefix/");
        assert_eq!(
            client.endpoint("/v3/apps").unwrap().as_str(),
            "https://api.example/prefix/v3/apps"
        );
        assert_eq!(
            client.endpoint(INFO_ENDPOINT).unwrap().as_str(),
            "https://api.example/prefix/v3/info"
        );
    }

    #[test]
    fn test_insecure_transport_builds() {
        let config = ClientConfig::default()
            .with_insecure_skip_tls_verify(true)
            .with_timeout_seconds(5);
        let client = KorifiClient::new(config, &kind_entries()).unwrap();
        assert!(client.config().insecure_skip_tls_verify);
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = ClientConfig::default().with_timeout_seconds(0);
        let err = KorifiClient::new(config, &kind_entries()).unwrap_err();
        assert!(matches!(err, ClientError::Configuration(_)));
    }

    #[test]
    fn test_ca_bundle_without_certificates_rejected() {
        let config =
            ClientConfig::default().with_ca_certificate(b"this is not a pem file".to_vec());
        let err = KorifiClient::new(config, &kind_entries()).unwrap_err();
        assert!(matches!(
            err,
            ClientError::Configuration(ref message) if message.contains("no PEM certificates")
        ));
    }

    #[test]
    fn test_ca_bundle_with_certificate_builds() {
        let config = ClientConfig::default().with_ca_certificate(TEST_CA_PEM.to_vec());
        let client = KorifiClient::new(config, &kind_entries()).unwrap();
        assert!(client.config().ca_certificate.is_some());
    }

    #[tokio::test]
    async fn test_get_info_unreadable_error_body_uses_reason() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        // Promises more body than it sends, then hangs up
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await.unwrap();
            socket
                .write_all(
                    b"HTTP/1.1 500 Internal Server Error\r\ncontent-length: 100\r\n\r\nshort",
                )
                .await
                .unwrap();
        });

        let client = create_test_client(&format!("http://{addr}"));
        let err = client.get_info().await.unwrap_err();

        assert!(matches!(
            err,
            ClientError::RemoteApi { status: 500, ref message } if message == "Internal Server Error"
        ));
    }

    #[test]
    fn test_debug_hides_token() {
        let client = create_test_client("https://localhost");
        let debug = format!("{client:?}");
        assert!(debug.contains("kind-korifi"));
        assert!(!debug.contains("AAQ="));
    }

    #[test]
    fn test_from_kubeconfig_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config");
        fs::write(
            &path,
            "users:\n- name: kind-korifi\n  user:\n    client-certificate-data: AA==\n    client-key-data: BB==\n",
        )
        .unwrap();

        let client =
            KorifiClient::from_kubeconfig(ClientConfig::default().with_kubeconfig(&path)).unwrap();
        assert_eq!(client.config().user, "kind-korifi");
    }

    #[test]
    fn test_from_kubeconfig_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = ClientConfig::default().with_kubeconfig(dir.path().join("absent"));

        let err = KorifiClient::from_kubeconfig(config).unwrap_err();
        assert!(matches!(err, ClientError::ConfigLoad(_)));
    }

    #[test]
    fn test_from_kubeconfig_incomplete_user() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config");
        fs::write(
            &path,
            "users:\n- name: kind-korifi\n  user:\n    client-certificate-data: AA==\n",
        )
        .unwrap();

        let err = KorifiClient::from_kubeconfig(ClientConfig::default().with_kubeconfig(&path))
            .unwrap_err();
        assert!(matches!(
            err,
            ClientError::CredentialIncomplete {
                missing: "client key",
                ..
            }
        ));
    }
}
