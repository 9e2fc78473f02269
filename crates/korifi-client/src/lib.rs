//! # korifi-client
//!
//! HTTP client for the Korifi API, authenticated with a kubeconfig client
//! certificate.
//!
//! The client identity of a kubeconfig user is turned into a single token,
//! `base64(certificate || key)`, and sent on every request as
//! `Authorization: ClientCert <token>`. The crate is split into:
//! - [`credentials`]: token derivation from a named user entry
//! - [`middleware`]: the `reqwest_middleware` layer injecting the header
//! - [`client`]: assembly of the transport, the middleware, and the API URL
//!
//! ## Example
//!
//! ```no_run
//! use korifi_client::KorifiClient;
//! use korifi_common::ClientConfig;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = ClientConfig::new("https://localhost")
//!     .with_user("kind-korifi")
//!     .with_ca_certificate(std::fs::read("korifi-ca.pem")?);
//!
//! let client = KorifiClient::from_kubeconfig(config)?;
//! let info = client.get_info().await?;
//! println!("Korifi {} {}", info.name, info.version);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod credentials;
pub mod error;
pub mod middleware;

pub use client::KorifiClient;
pub use credentials::{AUTH_SCHEME, DerivedToken, extract_token};
pub use error::{ClientError, Result};
pub use middleware::ClientCertAuth;
