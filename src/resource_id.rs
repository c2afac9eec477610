//! Composite resource identifiers.
//!
//! Terraform keeps a single string `id` per resource, but the RQL search
//! resource needs three values back on every read (search type, query text
//! and the server-issued search id). The parts are packed into one opaque
//! token:
//!
//! ```text
//! base64url( 0x01 | count:u64be | (len:u64be | bytes)* )
//! ```
//!
//! The frame is self-delimiting, so decoding rejects truncated tokens,
//! trailing garbage and foreign strings instead of returning wrong parts.

use std::fmt;
use std::str::FromStr;

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use thiserror::Error;

const FRAME_VERSION: u8 = 1;
const LEN_WIDTH: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
    /// Token was not produced by [`encode`]. Callers usually treat the
    /// resource as gone.
    #[error("malformed resource identifier: {reason}")]
    Malformed { reason: &'static str },

    #[error("resource identifier has {found} parts, expected {expected}")]
    ArityMismatch { expected: usize, found: usize },
}

impl IdError {
    fn malformed(reason: &'static str) -> Self {
        IdError::Malformed { reason }
    }
}

pub fn encode_bytes<P: AsRef<[u8]>>(parts: &[P]) -> String {
    let payload_len: usize = parts.iter().map(|p| LEN_WIDTH + p.as_ref().len()).sum();
    let mut frame = Vec::with_capacity(1 + LEN_WIDTH + payload_len);

    frame.push(FRAME_VERSION);
    frame.extend_from_slice(&(parts.len() as u64).to_be_bytes());
    for part in parts {
        let bytes = part.as_ref();
        frame.extend_from_slice(&(bytes.len() as u64).to_be_bytes());
        frame.extend_from_slice(bytes);
    }

    URL_SAFE_NO_PAD.encode(frame)
}

pub fn decode_bytes(token: &str) -> Result<Vec<Vec<u8>>, IdError> {
    let frame = URL_SAFE_NO_PAD
        .decode(token)
        .map_err(|_| IdError::malformed("not base64url"))?;
    let mut reader = FrameReader { buf: &frame };

    let version = reader.take(1)?[0];
    if version != FRAME_VERSION {
        return Err(IdError::malformed("unknown frame version"));
    }

    let count = reader.take_len()?;
    // NOTE: Every part needs at least a length prefix, which bounds a forged count
    if count > reader.buf.len() / LEN_WIDTH {
        return Err(IdError::malformed("part count exceeds token size"));
    }

    let mut parts = Vec::with_capacity(count);
    for _ in 0..count {
        let len = reader.take_len()?;
        parts.push(reader.take(len)?.to_vec());
    }

    if !reader.buf.is_empty() {
        return Err(IdError::malformed("trailing bytes"));
    }

    Ok(parts)
}

pub fn encode<S: AsRef<str>>(parts: &[S]) -> String {
    let bytes: Vec<&[u8]> = parts.iter().map(|p| p.as_ref().as_bytes()).collect();
    encode_bytes(bytes.as_slice())
}

pub fn decode(token: &str) -> Result<Vec<String>, IdError> {
    decode_bytes(token)?
        .into_iter()
        .map(|part| String::from_utf8(part).map_err(|_| IdError::malformed("part is not UTF-8")))
        .collect()
}

struct FrameReader<'a> {
    buf: &'a [u8],
}

impl<'a> FrameReader<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8], IdError> {
        if self.buf.len() < n {
            return Err(IdError::malformed("truncated"));
        }
        let (head, rest) = self.buf.split_at(n);
        self.buf = rest;
        Ok(head)
    }

    fn take_len(&mut self) -> Result<usize, IdError> {
        let mut raw = [0u8; LEN_WIDTH];
        raw.copy_from_slice(self.take(LEN_WIDTH)?);
        usize::try_from(u64::from_be_bytes(raw)).map_err(|_| IdError::malformed("length overflow"))
    }
}

/// Ordered key parts behind a resource id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompositeId {
    parts: Vec<String>,
}

impl CompositeId {
    pub fn new<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            parts: parts.into_iter().map(Into::into).collect(),
        }
    }

    pub fn parts(&self) -> &[String] {
        &self.parts
    }

    pub fn into_parts(self) -> Vec<String> {
        self.parts
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn encode(&self) -> String {
        encode(self.parts.as_slice())
    }

    pub fn decode(token: &str) -> Result<Self, IdError> {
        Ok(Self {
            parts: decode(token)?,
        })
    }

    /// Decodes a token the caller expects to hold exactly `N` parts.
    pub fn decode_exact<const N: usize>(token: &str) -> Result<[String; N], IdError> {
        let parts = decode(token)?;
        let found = parts.len();
        <[String; N]>::try_from(parts).map_err(|_| IdError::ArityMismatch { expected: N, found })
    }
}

impl fmt::Display for CompositeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for CompositeId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}
