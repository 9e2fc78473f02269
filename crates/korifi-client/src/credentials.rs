//! Client-certificate token derivation.
//!
//! Korifi accepts a kubeconfig client identity at the application layer: the
//! PEM certificate and PEM key are concatenated, base64-encoded, and sent as
//! `Authorization: ClientCert <token>`. This is a protocol choice of the
//! Korifi API, not a substitute for a mutual-TLS handshake in general. The
//! private key travels inside the header, so the token must only ever be sent
//! to a server you trust over TLS.

use std::fmt;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use korifi_common::AuthEntryCollection;
use secrecy::{ExposeSecret, SecretString};

use crate::error::{ClientError, Result};

/// Authorization scheme understood by the Korifi API.
pub const AUTH_SCHEME: &str = "ClientCert";

/// Opaque credential derived from a client certificate and key.
///
/// Holds `base64(certificate || key)`. The value is computed once and never
/// refreshed; cloning is cheap and shares the same secret.
#[derive(Clone)]
pub struct DerivedToken(Arc<SecretString>);

impl DerivedToken {
    /// Derives the token from raw certificate and key bytes.
    ///
    /// The certificate comes first, the key second, with no separator.
    #[must_use]
    pub fn from_parts(certificate: &[u8], key: &[u8]) -> Self {
        let mut material = Vec::with_capacity(certificate.len() + key.len());
        material.extend_from_slice(certificate);
        material.extend_from_slice(key);
        Self(Arc::new(SecretString::new(STANDARD.encode(material).into())))
    }

    /// The encoded token.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    /// The full `Authorization` header value, `ClientCert <token>`.
    #[must_use]
    pub fn authorization_value(&self) -> String {
        format!("{AUTH_SCHEME} {}", self.expose())
    }
}

impl fmt::Debug for DerivedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DerivedToken([REDACTED])")
    }
}

/// Derives the authentication token for the user named `name`.
///
/// # Errors
///
/// - [`ClientError::CredentialNotFound`] if no entry has that name
/// - [`ClientError::CredentialIncomplete`] if the entry lacks a certificate or key
pub fn extract_token(entries: &AuthEntryCollection, name: &str) -> Result<DerivedToken> {
    let entry = entries
        .get(name)
        .ok_or_else(|| ClientError::CredentialNotFound(name.to_string()))?;

    if let Some(missing) = entry.missing_material() {
        return Err(ClientError::CredentialIncomplete {
            name: name.to_string(),
            missing,
        });
    }

    Ok(DerivedToken::from_parts(
        &entry.client_certificate,
        &entry.client_key,
    ))
}
