//! Byte-to-text decoding and the "is there anything here" check

use std::borrow::Cow;

use crate::app::models::diagnostics::{DiagnosticKind, Diagnostics};
use crate::constants::DELIMITER_CANDIDATES;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Share of control characters above which decoded text is taken as binary
const BINARY_CONTROL_RATIO: f64 = 0.1;

/// Result of decoding one buffer
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded<'a> {
    Utf8(&'a str),
    /// Invalid UTF-8 read as Latin-1
    Latin1 { text: String, valid_up_to: usize },
    /// Invalid UTF-8 that is not text under Latin-1 either
    Binary { valid_up_to: usize },
}

impl<'a> Decoded<'a> {
    /// Diagnostic message for a fallback or a rejection
    pub fn failure_message(&self) -> Option<String> {
        match self {
            Decoded::Utf8(_) => None,
            Decoded::Latin1 { valid_up_to, .. } => Some(format!(
                "invalid UTF-8 at byte {valid_up_to}; decoded as Latin-1"
            )),
            Decoded::Binary { valid_up_to } => Some(format!(
                "invalid UTF-8 at byte {valid_up_to} and content is not text under Latin-1 either"
            )),
        }
    }

    pub fn into_text(self) -> Option<Cow<'a, str>> {
        match self {
            Decoded::Utf8(text) => Some(Cow::Borrowed(text)),
            Decoded::Latin1 { text, .. } => Some(Cow::Owned(text)),
            Decoded::Binary { .. } => None,
        }
    }
}

/// Decode `bytes` as UTF-8, falling back to Latin-1, without recording anything
pub fn decode_bytes(bytes: &[u8]) -> Decoded<'_> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

    match std::str::from_utf8(bytes) {
        Ok(text) => Decoded::Utf8(text),
        Err(err) => {
            let text = latin1(bytes);
            if looks_binary(&text) {
                Decoded::Binary {
                    valid_up_to: err.valid_up_to(),
                }
            } else {
                Decoded::Latin1 {
                    text,
                    valid_up_to: err.valid_up_to(),
                }
            }
        }
    }
}

/// Decode `bytes` as UTF-8, falling back to Latin-1.
///
/// Returns `None` when even the fallback yields something that is plainly not
/// text; a `DecodeFailure` diagnostic is recorded whenever the fallback runs.
pub fn decode<'a>(bytes: &'a [u8], line: Option<usize>, diagnostics: &mut Diagnostics) -> Option<Cow<'a, str>> {
    let decoded = decode_bytes(bytes);
    if let Some(message) = decoded.failure_message() {
        diagnostics.record(DiagnosticKind::DecodeFailure, line, message);
    }
    decoded.into_text()
}

fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

fn looks_binary(text: &str) -> bool {
    let total = text.chars().count();
    if total == 0 {
        return false;
    }
    let control = text
        .chars()
        .filter(|c| c.is_control() && !matches!(c, '\t' | '\r' | '\n'))
        .count();
    control as f64 / total as f64 > BINARY_CONTROL_RATIO
}

/// Whether decoded content is worth parsing.
///
/// Short content still counts when it splits into at least three fields on
/// some candidate delimiter, since a single truncated row can be recovered.
pub fn is_meaningful(text: &str, min_len: usize) -> bool {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return false;
    }
    if trimmed.len() >= min_len {
        return true;
    }
    DELIMITER_CANDIDATES
        .iter()
        .any(|&d| trimmed.split(d).count() >= 3)
}
