//! Offset pagination for list endpoints.
//!
//! The API answers list calls with an envelope carrying `next` / `previous`
//! tokens and a `totalcount`. A token is the relative URL of the adjacent
//! page (for example `/v1/195900/patients?limit=10&offset=50`); an empty or
//! missing token means there is no page in that direction.

use serde::Deserialize;
use url::form_urlencoded;

/// Page window requested by the caller. Zero values are not sent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PaginationOptions {
    pub limit: u64,
    pub offset: u64,
}

impl PaginationOptions {
    pub fn new(limit: u64, offset: u64) -> Self {
        Self { limit, offset }
    }
}

/// Raw page envelope fields, flattened into each list response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaginationEnvelope {
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    #[serde(default, rename = "totalcount", deserialize_with = "crate::nullable::null_default")]
    pub total_count: u64,
}

/// A token pointing at an adjacent page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageCursor {
    /// The token exactly as the API sent it.
    pub token: String,
    pub offset: Option<u64>,
    pub limit: Option<u64>,
}

impl PageCursor {
    /// Parses `limit` / `offset` out of the token's query section. The token
    /// may be a full relative URL or a bare query string.
    pub fn parse(token: &str) -> Self {
        let query = match token.trim().split_once('?') {
            Some((_, q)) => q,
            None => token,
        };
        let mut offset = None;
        let mut limit = None;
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "offset" => offset = value.parse().ok(),
                "limit" => limit = value.parse().ok(),
                _ => {}
            }
        }
        Self {
            token: token.to_string(),
            offset,
            limit,
        }
    }

    /// Options that request the page this cursor points at. `default_limit`
    /// applies when the token does not carry its own limit.
    pub fn options(&self, default_limit: u64) -> PaginationOptions {
        PaginationOptions {
            limit: self.limit.unwrap_or(default_limit),
            offset: self.offset.unwrap_or(0),
        }
    }
}

/// Normalized pagination state of a list result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaginationResult {
    pub total_count: u64,
    pub next: Option<PageCursor>,
    pub previous: Option<PageCursor>,
}

impl PaginationResult {
    pub fn from_envelope(next: Option<&str>, previous: Option<&str>, total_count: u64) -> Self {
        Self {
            total_count,
            next: cursor(next),
            previous: cursor(previous),
        }
    }

    pub fn has_more(&self) -> bool {
        self.next.is_some()
    }
}

impl From<&PaginationEnvelope> for PaginationResult {
    fn from(envelope: &PaginationEnvelope) -> Self {
        PaginationResult::from_envelope(
            envelope.next.as_deref(),
            envelope.previous.as_deref(),
            envelope.total_count,
        )
    }
}

fn cursor(token: Option<&str>) -> Option<PageCursor> {
    token
        .filter(|t| !t.trim().is_empty())
        .map(PageCursor::parse)
}
