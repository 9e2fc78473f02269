use std::collections::HashMap;
use std::collections::hash_map;
use std::fmt;

use typed_builder::TypedBuilder;

/// A named client identity: certificate and private key material.
///
/// Entries are sourced from the `users` section of a kubeconfig and are never
/// modified by this workspace. An entry is only usable when both the
/// certificate and the key are non-empty; see [`AuthEntry::is_complete`].
///
/// # Example
///
/// ```
/// use korifi_common::AuthEntry;
///
/// let entry = AuthEntry::builder()
///     .name("kind-korifi")
///     .client_certificate(b"cert".to_vec())
///     .client_key(b"key".to_vec())
///     .build();
///
/// assert!(entry.is_complete());
/// ```
#[derive(Clone, PartialEq, Eq, TypedBuilder)]
pub struct AuthEntry {
    /// Name of the identity (the kubeconfig user name).
    #[builder(setter(into))]
    pub name: String,
    /// Raw client certificate bytes (usually PEM).
    #[builder(default, setter(into))]
    pub client_certificate: Vec<u8>,
    /// Raw client private key bytes (usually PEM).
    #[builder(default, setter(into))]
    pub client_key: Vec<u8>,
}

impl AuthEntry {
    /// Returns `true` when both certificate and key material are present.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.missing_material().is_none()
    }

    /// Names the first missing half of the identity, if any.
    #[must_use]
    pub fn missing_material(&self) -> Option<&'static str> {
        if self.client_certificate.is_empty() {
            Some("client certificate")
        } else if self.client_key.is_empty() {
            Some("client key")
        } else {
            None
        }
    }
}

// Key material must never end up in logs
impl fmt::Debug for AuthEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthEntry")
            .field("name", &self.name)
            .field(
                "client_certificate",
                &format_args!("{} bytes", self.client_certificate.len()),
            )
            .field("client_key", &"[REDACTED]")
            .finish()
    }
}

/// Client identities indexed by name.
///
/// Names are unique; inserting an entry with an existing name replaces it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthEntryCollection {
    entries: HashMap<String, AuthEntry>,
}

impl AuthEntryCollection {
    /// Creates an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entry, returning the one it replaced.
    pub fn insert(&mut self, entry: AuthEntry) -> Option<AuthEntry> {
        self.entries.insert(entry.name.clone(), entry)
    }

    /// Looks up an entry by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&AuthEntry> {
        self.entries.get(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over entry names in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl FromIterator<AuthEntry> for AuthEntryCollection {
    fn from_iter<I: IntoIterator<Item = AuthEntry>>(iter: I) -> Self {
        let mut collection = Self::new();
        for entry in iter {
            collection.insert(entry);
        }
        collection
    }
}

impl<'a> IntoIterator for &'a AuthEntryCollection {
    type Item = &'a AuthEntry;
    type IntoIter = hash_map::Values<'a, String, AuthEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.values()
    }
}
