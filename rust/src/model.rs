// Core value types shared by the fetcher and the batch coordinator.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Numeric token identifying one document on the portal.
///
/// Kept as the raw digit string so leading zeros survive as cache keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Accept a non-empty run of ASCII digits.
    pub fn parse(token: &str) -> Option<Self> {
        if !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit()) {
            Some(Self(token.to_string()))
        } else {
            None
        }
    }

    /// Extract the identifier from the segment after the last `=` of a record URL.
    pub fn from_url(url: &str) -> Option<Self> {
        let token = url.rsplit('=').next().unwrap_or(url);
        Self::parse(token)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One queued item: the record id plus the landing page it lives on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievalTarget {
    id: RecordId,
    url: String,
}

impl RetrievalTarget {
    pub fn new(id: RecordId, url: impl Into<String>) -> Self {
        Self {
            id,
            url: url.into(),
        }
    }

    pub fn id(&self) -> &RecordId {
        &self.id
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Field name/value pairs submitted back to the portal to trigger the download.
///
/// Insertion order is preserved; re-inserting a name overwrites it in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormPayload {
    fields: Vec<(String, String)>,
}

impl FormPayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name, value)),
        }
    }

    /// Set `field` to its own name, which selects the server-side action for that control.
    pub fn activate(&mut self, field: &str) {
        self.insert(field, field);
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Terminal result of a successful retrieval attempt.
///
/// Failures travel as the `Err` arm of the fetcher's `Result`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The document was written to this path.
    Saved(PathBuf),
    /// The portal has no document for this record.
    Unavailable,
}

impl FetchOutcome {
    /// Value recorded in the cache for this outcome.
    pub fn cache_value(&self) -> Option<PathBuf> {
        match self {
            Self::Saved(path) => Some(path.clone()),
            Self::Unavailable => None,
        }
    }
}
