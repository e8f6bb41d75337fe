//! `contents.json` format handling
//!
//! Despite the name, `contents.json` is a binary file. It records the key of
//! every entry of one pack level (the root pack or a single subpack) and is
//! itself encrypted under the master key.
//!
//! ## Layout
//!
//! | Offset  | Size | Field                                       |
//! |---------|------|---------------------------------------------|
//! | `0x00`  | 4    | version, always zero                        |
//! | `0x04`  | 4    | magic `FC B9 CF 9B`                         |
//! | `0x08`  | 8    | zero padding                                |
//! | `0x10`  | 1    | content id length                           |
//! | `0x11`  | n    | content id (UTF-8)                          |
//! |         |      | zero padding up to `0x100`                  |
//! | `0x100` | ..   | AES-256-CFB8 encrypted JSON, to end of file |
//!
//! The JSON payload is `{"content":[{"path":"...","key":"..."|null}, ...]}`.

use std::io::{Cursor, Read, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};

use crate::crypto::{decrypt_cfb8, encrypt_cfb8};
use crate::error::{Error, Result};

/// Name of the contents file at every pack level
pub const CONTENTS_FILE: &str = "contents.json";

/// Format version written to new contents files
pub const CONTENTS_VERSION: u32 = 0;

/// Magic identifying a contents file
pub const CONTENTS_MAGIC: [u8; 4] = [0xFC, 0xB9, 0xCF, 0x9B];

/// Offset of the content id length byte
pub const CONTENT_ID_OFFSET: usize = 0x10;

/// Offset of the encrypted JSON payload
pub const PAYLOAD_OFFSET: usize = 0x100;

/// One file of a pack level and the key it was encrypted with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentEntry {
    /// Path relative to the pack level the contents file belongs to
    pub path: String,
    /// Entry key, `None` for files stored verbatim
    #[serde(default)]
    pub key: Option<String>,
}

impl ContentEntry {
    /// An entry copied without encryption
    pub fn plain(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            key: None,
        }
    }

    /// An entry encrypted with `key`
    pub fn encrypted(path: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            key: Some(key.into()),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct Content {
    content: Vec<ContentEntry>,
}

/// The unencrypted part of a contents file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentsHeader {
    pub version: u32,
    pub content_id: String,
}

/// Serialize and encrypt a contents file
///
/// # Arguments
/// * `content_id` - Identifier of the owning pack, stored in clear
/// * `master_key` - 32-character key the JSON payload is encrypted with
/// * `entries` - Every entry of this pack level
pub fn serialize_contents(
    content_id: &str,
    master_key: &str,
    entries: &[ContentEntry],
) -> Result<Vec<u8>> {
    let id = content_id.as_bytes();
    // The length byte and the id must end strictly before the payload
    if CONTENT_ID_OFFSET + 1 + id.len() >= PAYLOAD_OFFSET {
        return Err(Error::ContentIdTooLong(id.len()));
    }

    let json = serde_json::to_vec(&Content {
        content: entries.to_vec(),
    })?;
    let payload = encrypt_cfb8(&json, master_key)?;

    let mut out = Vec::with_capacity(PAYLOAD_OFFSET + payload.len());
    out.write_u32::<BigEndian>(CONTENTS_VERSION)?;
    out.write_all(&CONTENTS_MAGIC)?;
    out.resize(CONTENT_ID_OFFSET, 0);
    out.write_u8(id.len() as u8)?;
    out.write_all(id)?;
    out.resize(PAYLOAD_OFFSET, 0);
    out.write_all(&payload)?;

    Ok(out)
}

/// Parse the unencrypted header of a contents file
///
/// No key is needed, so this works on any pack.
pub fn read_header(data: &[u8]) -> Result<ContentsHeader> {
    if data.len() < PAYLOAD_OFFSET {
        return Err(Error::InvalidContentsHeader(format!(
            "file is {} bytes, expected at least {}",
            data.len(),
            PAYLOAD_OFFSET
        )));
    }

    let mut cursor = Cursor::new(data);
    let version = cursor.read_u32::<BigEndian>()?;
    let mut magic = [0u8; 4];
    cursor.read_exact(&mut magic)?;
    if magic != CONTENTS_MAGIC {
        return Err(Error::InvalidContentsHeader(format!(
            "bad magic {:02X?}",
            magic
        )));
    }

    cursor.set_position(CONTENT_ID_OFFSET as u64);
    let id_len = cursor.read_u8()? as usize;
    let id_end = CONTENT_ID_OFFSET + 1 + id_len;
    if id_end > PAYLOAD_OFFSET {
        return Err(Error::InvalidContentsHeader(format!(
            "content id length {} overruns the header",
            id_len
        )));
    }
    let content_id = std::str::from_utf8(&data[CONTENT_ID_OFFSET + 1..id_end])
        .map_err(|e| Error::InvalidContentsHeader(format!("content id is not UTF-8: {}", e)))?
        .to_string();

    Ok(ContentsHeader {
        version,
        content_id,
    })
}

/// Decrypt and parse a contents file
///
/// The header is validated before anything is decrypted. A wrong master key
/// cannot be detected by the cipher itself, it shows up as a JSON failure and
/// is reported as [`Error::ContentsDecode`].
///
/// # Arguments
/// * `name` - Archive path of the contents file, used in errors
/// * `data` - Raw contents file bytes
/// * `master_key` - 32-character key the payload was encrypted with
pub fn deserialize_contents(name: &str, data: &[u8], master_key: &str) -> Result<Vec<ContentEntry>> {
    read_header(data)?;

    let json = decrypt_cfb8(&data[PAYLOAD_OFFSET..], master_key)?;
    let content: Content = serde_json::from_slice(&json).map_err(|e| Error::ContentsDecode {
        path: name.to_string(),
        reason: e.to_string(),
    })?;

    Ok(content.content)
}
