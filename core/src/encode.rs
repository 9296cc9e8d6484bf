//! Options-to-wire encoding shared by every endpoint.
//!
//! # Design
//! `Params` is a field-descriptor list: each builder call names a wire key,
//! applies the presence rule for that kind of value, and formats it. Options
//! structs implement `ToParams` with one chain of calls, so the omission rules
//! live here and nowhere else. The same encoding serves query strings and
//! `application/x-www-form-urlencoded` bodies.
//!
//! `FormReader` produces the same bytes as `Params::encode` for a form with a
//! base64 field, but pulls the raw bytes from a reader instead of requiring
//! them in memory up front.

use std::collections::VecDeque;
use std::io::{self, Read};

use base64::engine::general_purpose::{GeneralPurpose, STANDARD};
use base64::Engine;
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use url::form_urlencoded;

use crate::error::ApiError;
use crate::pagination::PaginationOptions;

/// `MM/DD/YYYY`
pub const DATE_FORMAT: &str = "%m/%d/%Y";
/// `MM/DD/YYYY HH:MM:SS`
pub const DATETIME_FORMAT: &str = "%m/%d/%Y %H:%M:%S";

static BASE64: GeneralPurpose = STANDARD;

/// Raw bytes read from a streamed field per refill. A multiple of 3, so each
/// chunk encodes without padding and the pieces concatenate exactly.
const STREAM_CHUNK: usize = 3 * 1024;

/// Types that encode themselves as query or form parameters.
pub trait ToParams {
    fn to_params(&self) -> Result<Params, ApiError>;
}

/// Ordered list of wire key/value pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    pairs: Vec<(&'static str, String)>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Always emitted.
    pub fn text(mut self, key: &'static str, value: &str) -> Self {
        self.pairs.push((key, value.to_string()));
        self
    }

    /// Emitted when `Some`, even if the string is empty.
    pub fn opt_text(self, key: &'static str, value: Option<&str>) -> Self {
        match value {
            Some(v) => self.text(key, v),
            None => self,
        }
    }

    /// Emitted when the string is non-empty.
    pub fn non_empty(self, key: &'static str, value: &str) -> Self {
        if value.is_empty() {
            self
        } else {
            self.text(key, value)
        }
    }

    /// `"true"` when set; false is never sent.
    pub fn flag(self, key: &'static str, value: bool) -> Self {
        if value {
            self.text(key, "true")
        } else {
            self
        }
    }

    /// Explicit `"true"` / `"false"` when `Some`.
    pub fn opt_bool(self, key: &'static str, value: Option<bool>) -> Self {
        match value {
            Some(true) => self.text(key, "true"),
            Some(false) => self.text(key, "false"),
            None => self,
        }
    }

    /// Zero is not a valid identifier and is omitted.
    pub fn id(self, key: &'static str, value: u64) -> Self {
        if value == 0 {
            self
        } else {
            self.text(key, &value.to_string())
        }
    }

    pub fn date(self, key: &'static str, value: Option<NaiveDate>) -> Self {
        match value {
            Some(d) => self.text(key, &d.format(DATE_FORMAT).to_string()),
            None => self,
        }
    }

    pub fn datetime(self, key: &'static str, value: Option<NaiveDateTime>) -> Self {
        match value {
            Some(dt) => self.text(key, &dt.format(DATETIME_FORMAT).to_string()),
            None => self,
        }
    }

    /// One field holding the elements joined by a tab.
    pub fn list(self, key: &'static str, value: Option<&[String]>) -> Self {
        match value {
            Some(items) => self.text(key, &items.join("\t")),
            None => self,
        }
    }

    /// One field holding the JSON encoding of `value`.
    pub fn json<T: Serialize + ?Sized>(self, key: &'static str, value: &T) -> Result<Self, ApiError> {
        let encoded =
            serde_json::to_string(value).map_err(|e| ApiError::SerializationError(e.to_string()))?;
        Ok(self.text(key, &encoded))
    }

    /// One field holding the standard base64 encoding of `data`.
    pub fn base64(self, key: &'static str, data: &[u8]) -> Self {
        let encoded = BASE64.encode(data);
        self.text(key, &encoded)
    }

    pub fn pagination(self, value: Option<&PaginationOptions>) -> Self {
        match value {
            Some(p) => self.id("limit", p.limit).id("offset", p.offset),
            None => self,
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.pairs.iter().map(|(k, _)| *k)
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// `application/x-www-form-urlencoded` serialization, in insertion order.
    pub fn encode(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (k, v) in &self.pairs {
            serializer.append_pair(k, v);
        }
        serializer.finish()
    }
}

enum Part<'a> {
    Bytes(Vec<u8>),
    Base64(Box<dyn Read + 'a>),
}

/// Streaming `application/x-www-form-urlencoded` body.
///
/// Text fields are escaped up front. Reader fields are base64-encoded and
/// form-escaped chunk by chunk as the body is read.
pub struct FormReader<'a> {
    parts: VecDeque<Part<'a>>,
    fields: usize,
    buf: Vec<u8>,
    pos: usize,
    raw: Vec<u8>,
    encoded: String,
}

impl<'a> FormReader<'a> {
    pub fn new() -> Self {
        Self {
            parts: VecDeque::new(),
            fields: 0,
            buf: Vec::new(),
            pos: 0,
            raw: vec![0u8; STREAM_CHUNK],
            encoded: String::new(),
        }
    }

    fn push_key(&mut self, key: &str) {
        let mut head = String::new();
        if self.fields > 0 {
            head.push('&');
        }
        head.extend(form_urlencoded::byte_serialize(key.as_bytes()));
        head.push('=');
        self.parts.push_back(Part::Bytes(head.into_bytes()));
        self.fields += 1;
    }

    pub fn add(mut self, key: &str, value: &str) -> Self {
        self.push_key(key);
        let escaped: String = form_urlencoded::byte_serialize(value.as_bytes()).collect();
        self.parts.push_back(Part::Bytes(escaped.into_bytes()));
        self
    }

    /// Adds a field whose value is the base64 encoding of everything `reader` yields.
    pub fn add_reader<R: Read + 'a>(mut self, key: &str, reader: R) -> Self {
        self.push_key(key);
        self.parts.push_back(Part::Base64(Box::new(reader)));
        self
    }

    /// Refills `buf` from the next part. Returns false once every part is drained.
    fn refill(&mut self) -> io::Result<bool> {
        loop {
            let Some(part) = self.parts.front_mut() else {
                return Ok(false);
            };
            match part {
                Part::Bytes(bytes) => {
                    self.buf = std::mem::take(bytes);
                    self.pos = 0;
                    self.parts.pop_front();
                    if !self.buf.is_empty() {
                        return Ok(true);
                    }
                }
                Part::Base64(reader) => {
                    // Only the final chunk may be short, so padding lands at the end.
                    let n = read_full(reader, &mut self.raw)?;
                    if n == 0 {
                        self.parts.pop_front();
                        continue;
                    }
                    self.encoded.clear();
                    BASE64.encode_string(&self.raw[..n], &mut self.encoded);
                    self.buf.clear();
                    self.buf.extend(
                        form_urlencoded::byte_serialize(self.encoded.as_bytes()).flat_map(str::bytes),
                    );
                    self.pos = 0;
                    return Ok(true);
                }
            }
        }
    }
}

impl Default for FormReader<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl Read for FormReader<'_> {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        if out.is_empty() {
            return Ok(0);
        }
        if self.pos >= self.buf.len() && !self.refill()? {
            return Ok(0);
        }
        let available = &self.buf[self.pos..];
        let n = available.len().min(out.len());
        out[..n].copy_from_slice(&available[..n]);
        self.pos += n;
        Ok(n)
    }
}

/// Reads until `buf` is full or the reader is exhausted.
fn read_full<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
