use serde::{Deserialize, Serialize};

/// Response body of `GET /v3/info`.
///
/// Unknown fields in the document are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfoV3Response {
    /// Platform name, e.g. `"korifi"`.
    pub name: String,
    /// Platform version.
    pub version: String,
}
