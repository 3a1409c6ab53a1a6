//! Stateless HTTP 1.x response parsing primitives.
//!
//! Every function here operates on a bounded byte span and reports either a byte-offset
//! result or "need more data" — it never blocks and never retains state. This is what lets
//! the client state machine call the same function repeatedly as bytes trickle in, with all
//! resumption data living on the connection itself.

use http::StatusCode;

use crate::error::HttpError;

/// Index of the first `\r\n` in `buf`, or `None` if no full line is buffered yet.
pub fn find_line_end(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\r\n")
}

/// Index of the first `\r\n\r\n` in `buf`, or `None` if the header block terminator has not
/// been buffered yet.
pub fn find_headers_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}

/// A parsed response status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub version: String,
    pub status: StatusCode,
    pub reason: String,
}

/// Parse a status line (without its trailing CRLF) into version, status code, and reason
/// phrase.
///
/// Validation is strict: the status code must be a registered code and the reason phrase
/// must match the phrase registered for it.
pub fn parse_status_line(line: &[u8]) -> Result<StatusLine, HttpError> {
    let line = std::str::from_utf8(line)
        .map_err(|_| HttpError::Parse("status line is not valid utf-8".to_string()))?;
    let mut fields = line.splitn(3, ' ');
    let version = fields
        .next()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| HttpError::Parse(format!("status line missing version: {line:?}")))?;
    let code = fields
        .next()
        .ok_or_else(|| HttpError::Parse(format!("status line missing status code: {line:?}")))?;
    let reason = fields
        .next()
        .ok_or_else(|| HttpError::Parse(format!("status line missing reason phrase: {line:?}")))?;

    let status = code
        .parse::<u16>()
        .ok()
        .and_then(|c| StatusCode::from_u16(c).ok())
        .ok_or_else(|| HttpError::Parse(format!("bad status code {code:?}")))?;
    match status.canonical_reason() {
        Some(canonical) if canonical == reason => {}
        _ => {
            return Err(HttpError::Parse(format!(
                "reason phrase {reason:?} does not match status {status}"
            )))
        }
    }

    Ok(StatusLine {
        version: version.to_string(),
        status,
        reason: reason.to_string(),
    })
}

/// An ordered collection of header key/value pairs.
///
/// Insertion order is preserved and duplicate keys are allowed; lookups return the first
/// match, comparing names case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}
impl Headers {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, name: String, value: String) {
        self.entries.push((name, value));
    }

    /// Value of the first header whose name matches `name` case-insensitively.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

/// Parse a header block into a [`Headers`] collection.
///
/// The block is sliced into CRLF-terminated lines, each split on its first `:` with
/// surrounding whitespace trimmed from both key and value. An empty line stops parsing.
/// A line with no colon fails the whole block.
pub fn parse_headers(block: &[u8]) -> Result<Headers, HttpError> {
    let mut headers = Headers::new();
    let mut rest = block;
    loop {
        let line_end = match find_line_end(rest) {
            Some(x) => x,
            // a trailing fragment without CRLF is treated the same as end-of-block
            None => break,
        };
        if line_end == 0 {
            break;
        }
        let line = String::from_utf8_lossy(&rest[..line_end]);
        let (key, value) = line
            .split_once(':')
            .ok_or_else(|| HttpError::Parse(format!("header line missing colon: {line:?}")))?;
        headers.push(key.trim().to_string(), value.trim().to_string());
        rest = &rest[line_end + 2..];
    }
    Ok(headers)
}

/// Result of [`decode_chunk_size_line`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkSizeLine {
    /// No full chunk-size line is buffered yet.
    NeedMore,
    /// A chunk-size line was decoded. `consumed` covers the line and its CRLF; `size` of 0
    /// signals the terminal chunk.
    Complete { size: usize, consumed: usize },
}

/// Decode one chunk-size line from the front of `buf`.
///
/// Any `;`-introduced chunk extension (or stray whitespace) is stripped before the
/// remaining hex digits are parsed as the chunk byte count.
pub fn decode_chunk_size_line(buf: &[u8]) -> Result<ChunkSizeLine, HttpError> {
    let line_end = match find_line_end(buf) {
        Some(x) => x,
        None => return Ok(ChunkSizeLine::NeedMore),
    };
    let line = &buf[..line_end];
    let digits_end = line
        .iter()
        .position(|b| matches!(b, b';' | b' ' | b'\t'))
        .unwrap_or(line.len());
    let digits = &line[..digits_end];
    if digits.is_empty() {
        return Err(HttpError::Parse("empty chunk size line".to_string()));
    }
    let digits = std::str::from_utf8(digits)
        .map_err(|_| HttpError::Parse("chunk size line is not valid utf-8".to_string()))?;
    let size = usize::from_str_radix(digits, 16)
        .map_err(|_| HttpError::Parse(format!("bad chunk size {digits:?}")))?;
    Ok(ChunkSizeLine::Complete {
        size,
        consumed: line_end + 2,
    })
}
