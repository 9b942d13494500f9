//! WARC-Record-ID generation

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Length of a record identifier in `<urn:uuid:...>` form
pub const RECORD_ID_LEN: usize = 47;

/// A WARC record identifier in `<urn:uuid:xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx>` form
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId(String);

impl RecordId {
    /// Generate a fresh random (v4) identifier.
    pub fn generate() -> Self {
        Self::from_uuid(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(format!("<urn:uuid:{}>", uuid.hyphenated()))
    }

    /// Parse an identifier in URN form.
    ///
    /// Returns `None` unless `value` is `<urn:uuid:` + a hyphenated UUID + `>`.
    pub fn parse(value: &str) -> Option<Self> {
        let inner = value.strip_prefix("<urn:uuid:")?.strip_suffix('>')?;
        let uuid = Uuid::try_parse(inner).ok()?;
        Some(Self::from_uuid(uuid))
    }

    /// The identifier as written to WARC headers.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RecordId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
