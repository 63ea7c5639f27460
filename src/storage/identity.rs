//! User identities and their storage directory names
//!
//! `encode_identity` is a pure, total function from an identity string to a single
//! directory name. Its output only contains `[A-Za-z0-9_-]`, so it can never be `.`,
//! `..`, contain a separator, or look absolute. `_` acts as an escape character:
//!
//! | input       | output                     |
//! |-------------|----------------------------|
//! | `[A-Za-z0-9-]` | unchanged               |
//! | `_`         | `__`                       |
//! | `@`         | `_at_`                     |
//! | `.`         | `_dot_`                    |
//! | other char  | `_x<hex code point>_`      |
//! | empty input | `_`                        |
//!
//! Every escape starts with `_` and ends at the next `_`, so an encoded name splits
//! into tokens in exactly one way and [`decode_identity`] recovers the input. Distinct
//! identities therefore never share a directory.
//!
//! Escapes can push an encoded name past the filesystem's name limit. Such names are
//! split by [`root_dir_components`] into nested directories whose non-final parts end
//! in `+`, a character the encoding never emits. A short root therefore never equals,
//! contains, or sits inside a long one.

use std::fmt;
use std::path::PathBuf;

/// Directory name used for the empty identity; no other input encodes to a lone `_`.
const EMPTY_IDENTITY_DIR: &str = "_";

/// Longest directory name most filesystems accept, in bytes.
pub const MAX_DIR_NAME: usize = 255;

/// Size of each part when a long encoded name is split.
const CHUNK_LEN: usize = 200;

/// Marks a part that continues in a nested directory.
const CONTINUATION: char = '+';

/// A verified user identity (the email handed over by the identity provider).
///
/// Only ever used as a namespace key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity(String);

impl Identity {
    pub fn new(identity: impl Into<String>) -> Self {
        Self(identity.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name of this identity's directory under the storage root
    pub fn root_dir_name(&self) -> String {
        encode_identity(&self.0)
    }

    /// Relative location of this identity's root under the storage root
    pub fn root_dir(&self) -> PathBuf {
        root_dir_components(&self.root_dir_name()).iter().collect()
    }
}

/// Splits an encoded name into directory names no longer than [`MAX_DIR_NAME`].
pub fn root_dir_components(encoded: &str) -> Vec<String> {
    if encoded.len() <= MAX_DIR_NAME {
        return vec![encoded.to_string()];
    }

    // Encoded names are ASCII, so byte chunks are valid strings
    let chunks: Vec<&[u8]> = encoded.as_bytes().chunks(CHUNK_LEN).collect();
    let last = chunks.len() - 1;
    chunks
        .iter()
        .enumerate()
        .map(|(index, chunk)| {
            let mut part = String::from_utf8_lossy(chunk).into_owned();
            if index != last {
                part.push(CONTINUATION);
            }
            part
        })
        .collect()
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Encodes an identity into a directory name.
pub fn encode_identity(identity: &str) -> String {
    if identity.is_empty() {
        return EMPTY_IDENTITY_DIR.to_string();
    }

    let mut encoded = String::with_capacity(identity.len() + 8);
    for c in identity.chars() {
        match c {
            c if c.is_ascii_alphanumeric() || c == '-' => encoded.push(c),
            '_' => encoded.push_str("__"),
            '@' => encoded.push_str("_at_"),
            '.' => encoded.push_str("_dot_"),
            other => encoded.push_str(&format!("_x{:x}_", other as u32)),
        }
    }
    encoded
}

/// Inverse of [`encode_identity`]. Returns `None` for names it cannot have produced.
pub fn decode_identity(encoded: &str) -> Option<String> {
    if encoded == EMPTY_IDENTITY_DIR {
        return Some(String::new());
    }
    if encoded.is_empty() {
        return None;
    }

    let mut decoded = String::with_capacity(encoded.len());
    let mut chars = encoded.chars();
    while let Some(c) = chars.next() {
        if c != '_' {
            if !(c.is_ascii_alphanumeric() || c == '-') {
                return None;
            }
            decoded.push(c);
            continue;
        }

        let mut token = String::new();
        loop {
            match chars.next()? {
                '_' => break,
                t => token.push(t),
            }
        }

        match token.as_str() {
            "" => decoded.push('_'),
            "at" => decoded.push('@'),
            "dot" => decoded.push('.'),
            hex if hex.len() > 1 && hex.starts_with('x') => {
                let code_point = u32::from_str_radix(&hex[1..], 16).ok()?;
                decoded.push(char::from_u32(code_point)?);
            }
            _ => return None,
        }
    }
    Some(decoded)
}
