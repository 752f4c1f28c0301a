//! Source encoding detection.
//!
//! Python source files may declare their encoding in a comment on the first
//! or second line (`# -*- coding: latin-1 -*-`) or start with a UTF-8
//! byte-order mark. [`detect_encoding`] honors both, validates the choice by
//! decoding a prefix of the bytes and then the rest, and falls back to
//! Latin-1 whenever anything goes wrong. Latin-1 maps every byte to a
//! character, so the detector never fails and its result always decodes the
//! whole buffer, whatever the limit.

use std::borrow::Cow;

use anyhow::bail;
use tracing::debug;

use crate::parser::patterns::{BLANK_OR_COMMENT_RE, CODING_RE};
use crate::Result;

const UTF8_BOM: &[u8] = b"\xef\xbb\xbf";

/// A text codec usable for both decoding and re-encoding a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    /// UTF-8 with a leading byte-order mark, stripped on decode and
    /// restored on encode
    Utf8Sig,
    /// ISO-8859-1: every byte is a valid character
    Latin1,
    Ascii,
    /// Any other encoding known to the WHATWG label registry
    Other(&'static encoding_rs::Encoding),
}

impl TextEncoding {
    /// Canonical name of the encoding
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Utf8Sig => "utf-8-sig",
            TextEncoding::Latin1 => "latin-1",
            TextEncoding::Ascii => "ascii",
            TextEncoding::Other(encoding) => encoding.name(),
        }
    }

    /// Resolve an encoding name as written in a source declaration
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let normal = normalize_name(name);
        match normal.as_str() {
            "utf-8" => Some(TextEncoding::Utf8),
            "latin-1" => Some(TextEncoding::Latin1),
            "ascii" => Some(TextEncoding::Ascii),
            _ => encoding_rs::Encoding::for_label(normal.as_bytes()).map(|encoding| {
                if encoding == encoding_rs::UTF_8 {
                    TextEncoding::Utf8
                } else {
                    TextEncoding::Other(encoding)
                }
            }),
        }
    }

    /// Decode bytes, failing on malformed input
    pub fn decode(&self, bytes: &[u8]) -> Result<String> {
        match self {
            TextEncoding::Utf8 => Ok(std::str::from_utf8(bytes)?.to_string()),
            TextEncoding::Utf8Sig => {
                let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
                Ok(std::str::from_utf8(bytes)?.to_string())
            }
            TextEncoding::Latin1 => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
            TextEncoding::Ascii => match bytes.iter().position(|b| !b.is_ascii()) {
                Some(pos) => bail!("byte 0x{:02x} at position {pos} is not ascii", bytes[pos]),
                None => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
            },
            TextEncoding::Other(encoding) => {
                match encoding.decode_without_bom_handling_and_without_replacement(bytes) {
                    Some(text) => Ok(text.into_owned()),
                    None => bail!("invalid {} byte sequence", encoding.name()),
                }
            }
        }
    }

    /// Encode text for writing back to disk
    pub fn encode(&self, text: &str) -> Result<Vec<u8>> {
        match self {
            TextEncoding::Utf8 => Ok(text.as_bytes().to_vec()),
            TextEncoding::Utf8Sig => {
                let mut bytes = UTF8_BOM.to_vec();
                bytes.extend_from_slice(text.as_bytes());
                Ok(bytes)
            }
            TextEncoding::Latin1 => text
                .chars()
                .map(|c| {
                    u8::try_from(u32::from(c))
                        .map_err(|_| anyhow::anyhow!("character {c:?} cannot be encoded as latin-1"))
                })
                .collect(),
            TextEncoding::Ascii => match text.chars().find(|c| !c.is_ascii()) {
                Some(c) => bail!("character {c:?} cannot be encoded as ascii"),
                None => Ok(text.as_bytes().to_vec()),
            },
            TextEncoding::Other(encoding) => {
                let (bytes, used, had_errors) = encoding.encode(text);
                if had_errors || used != *encoding {
                    bail!("text cannot be encoded as {}", encoding.name());
                }
                Ok(match bytes {
                    Cow::Borrowed(b) => b.to_vec(),
                    Cow::Owned(b) => b,
                })
            }
        }
    }
}

/// Normalize declared names the way the Python tokenizer does
fn normalize_name(name: &str) -> String {
    let enc = name.trim().to_ascii_lowercase().replace('_', "-");
    if enc == "utf-8" || enc.starts_with("utf-8-") {
        return "utf-8".to_string();
    }
    for latin in ["latin-1", "iso-8859-1", "iso-latin-1"] {
        if enc == latin || enc.starts_with(&format!("{latin}-")) {
            return "latin-1".to_string();
        }
    }
    if enc == "us-ascii" {
        return "ascii".to_string();
    }
    enc
}

/// Determine the encoding of Python source bytes
///
/// `limit` bounds the prefix decoded first (`None` is the whole buffer); a
/// sequence cut by the limit rejects the candidate. A candidate that passes
/// is then checked against the remaining bytes, so the result always decodes
/// all of `bytes`. Never fails: any problem yields [`TextEncoding::Latin1`].
#[must_use]
pub fn detect_encoding(bytes: &[u8], limit: Option<usize>) -> TextEncoding {
    match declared_encoding(bytes) {
        Ok(encoding) => {
            let end = limit.map_or(bytes.len(), |n| n.min(bytes.len()));
            let checked = encoding.decode(&bytes[..end]).and_then(|_| {
                if end < bytes.len() {
                    encoding.decode(bytes)?;
                }
                Ok(())
            });
            match checked {
                Ok(()) => encoding,
                Err(e) => {
                    debug!("{} does not decode the input ({e}), using latin-1", encoding.name());
                    TextEncoding::Latin1
                }
            }
        }
        Err(e) => {
            debug!("encoding detection failed ({e}), using latin-1");
            TextEncoding::Latin1
        }
    }
}

/// Read the BOM and encoding declaration, without validating the body
fn declared_encoding(bytes: &[u8]) -> Result<TextEncoding> {
    let has_bom = bytes.starts_with(UTF8_BOM);
    let body = if has_bom { &bytes[UTF8_BOM.len()..] } else { bytes };
    let default = if has_bom {
        TextEncoding::Utf8Sig
    } else {
        TextEncoding::Utf8
    };

    let mut lines = body.split_inclusive(|&b| b == b'\n');
    let Some(first) = lines.next() else {
        return Ok(default);
    };

    let declared = match find_cookie(first, has_bom)? {
        Some(encoding) => Some(encoding),
        None => {
            let first_is_blank = std::str::from_utf8(first)
                .is_ok_and(|line| BLANK_OR_COMMENT_RE.is_match(line));
            match lines.next() {
                Some(second) if first_is_blank => find_cookie(second, has_bom)?,
                _ => None,
            }
        }
    };

    Ok(declared.unwrap_or(default))
}

/// Look for a `coding[:=]` declaration on one line
fn find_cookie(line: &[u8], has_bom: bool) -> Result<Option<TextEncoding>> {
    if !line.is_ascii() {
        return Ok(None);
    }
    let Ok(text) = std::str::from_utf8(line) else {
        return Ok(None);
    };
    let Some(caps) = CODING_RE.captures(text) else {
        return Ok(None);
    };
    let name = &caps[1];
    let Some(encoding) = TextEncoding::from_name(name) else {
        bail!("unknown encoding: {name}");
    };
    if has_bom {
        if encoding != TextEncoding::Utf8 {
            bail!("encoding problem: {name} with BOM");
        }
        return Ok(Some(TextEncoding::Utf8Sig));
    }
    Ok(Some(encoding))
}
