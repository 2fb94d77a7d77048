//! `Link` response header parsing.
//!
//! The time-series service paginates by returning absolute continuation URLs
//! in a header such as
//! `<https://…&continuationToken=abc>; rel="next", <https://…>; rel="first"`.

use std::collections::BTreeMap;

/// Pagination relations found in a `Link` header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageLinks {
    relations: BTreeMap<String, String>,
}

impl PageLinks {
    /// Parse a `Link` header value. Never fails: malformed entries are
    /// skipped and a missing header yields no links.
    #[must_use]
    pub fn parse(header: Option<&str>) -> Self {
        let mut relations = BTreeMap::new();
        let Some(mut rest) = header else {
            return Self { relations };
        };

        while let Some(open) = rest.find('<') {
            let after_open = &rest[open + 1..];
            let Some(close) = after_open.find('>') else {
                break;
            };
            let url = &after_open[..close];
            // Unterminated entry: resume at the `<` that opens the next one.
            if let Some(inner) = url.find('<') {
                rest = &after_open[inner..];
                continue;
            }
            let tail = &after_open[close + 1..];
            let params_end = entry_end(tail);
            let params = &tail[..params_end];
            rest = &tail[params_end..];

            if url.is_empty() || url.chars().any(char::is_whitespace) {
                continue;
            }
            for rel in rel_names(params) {
                relations
                    .entry(rel.to_string())
                    .or_insert_with(|| url.to_string());
            }
        }

        Self { relations }
    }

    /// URL of the next page, if any.
    #[must_use]
    pub fn next(&self) -> Option<&str> {
        self.get("next")
    }

    /// URL of the first page, if any.
    #[must_use]
    pub fn first(&self) -> Option<&str> {
        self.get("first")
    }

    /// URL for an arbitrary relation name.
    #[must_use]
    pub fn get(&self, rel: &str) -> Option<&str> {
        self.relations.get(rel).map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }

    /// Consume into `(next, first)`.
    #[must_use]
    pub fn into_cursors(mut self) -> (Option<String>, Option<String>) {
        (
            self.relations.remove("next"),
            self.relations.remove("first"),
        )
    }
}

/// Offset of the next entry's `<`, ignoring any inside quoted strings.
fn entry_end(params: &str) -> usize {
    let mut quoted = false;
    for (i, c) in params.char_indices() {
        match c {
            '"' => quoted = !quoted,
            '<' if !quoted => return i,
            _ => {}
        }
    }
    params.len()
}

/// Splits on `;` and `,` outside quoted strings.
fn split_params(params: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut quoted = false;
    let mut start = 0;
    for (i, c) in params.char_indices() {
        match c {
            '"' => quoted = !quoted,
            ';' | ',' if !quoted => {
                parts.push(&params[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&params[start..]);
    parts
}

/// Relation names from the `;`-separated parameters following one URL.
fn rel_names(params: &str) -> Vec<&str> {
    for param in split_params(params) {
        let Some((name, value)) = param.split_once('=') else {
            continue;
        };
        if !name.trim().eq_ignore_ascii_case("rel") {
            continue;
        }
        let value = value.trim();
        let value = value
            .strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
            .unwrap_or(value);
        return value.split_whitespace().collect();
    }
    Vec::new()
}
