//! Request middleware that authenticates every outgoing request.
//!
//! [`ClientCertAuth`] sits in a `reqwest_middleware` stack in front of the
//! actual HTTP transport. For each request it sets
//! `Authorization: ClientCert <token>` and hands the request on; whatever
//! the rest of the stack returns, response or error, comes back untouched.
//!
//! ```no_run
//! use korifi_client::{ClientCertAuth, DerivedToken};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let token = DerivedToken::from_parts(b"cert-pem", b"key-pem");
//! let client = reqwest_middleware::ClientBuilder::new(reqwest::Client::new())
//!     .with(ClientCertAuth::new(&token)?)
//!     .build();
//!
//! let _response = client.get("https://localhost/v3/info").send().await?;
//! # Ok(())
//! # }
//! ```

use std::fmt;

use async_trait::async_trait;
use http::Extensions;
use log::debug;
use reqwest::header::{AUTHORIZATION, HeaderValue};
use reqwest::{Request, Response};
use reqwest_middleware::{Middleware, Next};

use crate::credentials::DerivedToken;
use crate::error::{ClientError, Result};

/// Middleware injecting a client-certificate `Authorization` header.
///
/// The header value is computed once at construction and shared by every
/// request, so the middleware can serve concurrent requests without locking.
#[derive(Clone)]
pub struct ClientCertAuth {
    header_value: HeaderValue,
}

impl ClientCertAuth {
    /// Creates the middleware for a derived token.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Configuration`] if the token can't be carried in
    /// a header value.
    pub fn new(token: &DerivedToken) -> Result<Self> {
        let mut header_value = HeaderValue::from_str(&token.authorization_value())
            .map_err(|e| ClientError::Configuration(format!("invalid authorization token: {e}")))?;
        header_value.set_sensitive(true);
        Ok(Self { header_value })
    }

    /// Sets the `Authorization` header, replacing any value already present.
    #[must_use]
    pub fn authorize(&self, mut request: Request) -> Request {
        request
            .headers_mut()
            .insert(AUTHORIZATION, self.header_value.clone());
        request
    }

    /// Returns an authorized copy of a borrowed request.
    ///
    /// The copy keeps the method, URL, headers, timeout, version, and body of
    /// `request`; `request` itself is left as it was. Returns `None` when the
    /// body is a stream and can't be cloned.
    #[must_use]
    pub fn authorized_copy(&self, request: &Request) -> Option<Request> {
        request.try_clone().map(|copy| self.authorize(copy))
    }
}

impl fmt::Debug for ClientCertAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCertAuth")
            .field("header_value", &"[REDACTED]")
            .finish()
    }
}

#[async_trait]
impl Middleware for ClientCertAuth {
    async fn handle(
        &self,
        req: Request,
        extensions: &mut Extensions,
        next: Next<'_>,
    ) -> reqwest_middleware::Result<Response> {
        // The request arrives by value, so the caller keeps no handle to it;
        // timeout and extensions travel with it unchanged.
        debug!("Authorizing {} {}", req.method(), req.url());
        next.run(self.authorize(req), extensions).await
    }
}
