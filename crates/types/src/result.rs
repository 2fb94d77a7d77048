//! Result records handed back to field accessors.

use serde::Serialize;
use serde_json::Value;

/// Body of a successful upstream reply.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    /// Decoded JSON document.
    Json(Value),
    /// Raw text, e.g. CSV with a header row.
    Text(String),
}

impl Payload {
    /// Borrow the text payload, if this is one.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Json(_) => None,
        }
    }
}

/// A page of time-series data plus its pagination cursors.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyResult {
    pub data: Payload,
    /// Continuation URL for the next page, absent on the last page.
    pub next_page: Option<String>,
    /// URL of the first page of the same query.
    pub first_page: Option<String>,
}

impl ProxyResult {
    /// A result without pagination cursors.
    #[must_use]
    pub fn unpaged(data: Payload) -> Self {
        Self {
            data,
            next_page: None,
            first_page: None,
        }
    }

    /// `true` when another page can be fetched with [`Self::next_page`].
    #[must_use]
    pub fn has_more(&self) -> bool {
        self.next_page.is_some()
    }
}
