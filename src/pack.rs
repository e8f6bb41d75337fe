//! Pack file reading
//!
//! Resource packs are plain ZIP archives. This module indexes the entries of a
//! pack in central directory order and reads their contents on demand.
//!
//! The pack identity lives in `manifest.json` at the pack root:
//!
//! ```json
//! { "format_version": 2, "header": { "uuid": "...", "name": "..." } }
//! ```

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use serde::Deserialize;
use zip::ZipArchive;

use crate::error::{Error, Result};

/// Name of the pack identity file
pub const PACK_MANIFEST: &str = "manifest.json";

/// Metadata of a single archive entry
///
/// This is what gets carried from the reading side to the writing side when
/// an entry is copied or replaced, independent of the zip crate's own types.
#[derive(Debug, Clone)]
pub struct EntryMeta {
    /// Slash separated path within the archive, directories end with `/`
    pub path: String,
    /// Whether the entry is a directory
    pub is_dir: bool,
    /// Uncompressed size in bytes
    pub size: u64,
    /// Modification time, if the archive recorded a valid one
    pub last_modified: Option<zip::DateTime>,
    /// Unix mode bits, if the archive was created on a unix system
    pub unix_mode: Option<u32>,
}

impl EntryMeta {
    /// Metadata for a new file entry
    pub fn file(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            is_dir: false,
            size: 0,
            last_modified: None,
            unix_mode: None,
        }
    }

    /// Metadata for a new directory entry
    pub fn directory(path: impl Into<String>) -> Self {
        let mut path = path.into();
        if !path.ends_with('/') {
            path.push('/');
        }
        Self {
            path,
            is_dir: true,
            size: 0,
            last_modified: None,
            unix_mode: None,
        }
    }

    /// Last path segment
    pub fn file_name(&self) -> &str {
        self.path
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default()
    }
}

#[derive(Deserialize)]
struct PackManifest {
    header: Option<PackManifestHeader>,
}

#[derive(Deserialize)]
struct PackManifestHeader {
    uuid: Option<String>,
}

/// A pack archive reader
pub struct PackReader<R> {
    archive: ZipArchive<R>,
    entries: Vec<EntryMeta>,
    index: HashMap<String, usize>,
}

impl PackReader<BufReader<File>> {
    /// Open a pack file for reading
    ///
    /// # Example
    /// ```no_run
    /// use packcrypt::PackReader;
    /// let pack = PackReader::open("MyPack.mcpack")?;
    /// # Ok::<(), packcrypt::Error>(())
    /// ```
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::new(BufReader::new(file))
    }
}

impl<R: Read + Seek> PackReader<R> {
    /// Index the entries of a ZIP archive
    pub fn new(reader: R) -> Result<Self> {
        let mut archive = ZipArchive::new(reader)?;

        let mut entries = Vec::with_capacity(archive.len());
        let mut index = HashMap::with_capacity(archive.len());
        for i in 0..archive.len() {
            let file = archive.by_index_raw(i)?;
            let meta = EntryMeta {
                path: file.name().to_string(),
                is_dir: file.is_dir(),
                size: file.size(),
                last_modified: file.last_modified(),
                unix_mode: file.unix_mode(),
            };
            // First occurrence wins for duplicated names
            index.entry(meta.path.clone()).or_insert(i);
            entries.push(meta);
        }

        Ok(Self {
            archive,
            entries,
            index,
        })
    }

    /// All entries in archive order
    pub fn entries(&self) -> &[EntryMeta] {
        &self.entries
    }

    /// Get the number of entries in the archive
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the archive is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up an entry by its exact path
    pub fn get(&self, path: &str) -> Option<&EntryMeta> {
        self.index.get(path).map(|&i| &self.entries[i])
    }

    /// Check if an entry with this exact path exists
    pub fn contains(&self, path: &str) -> bool {
        self.index.contains_key(path)
    }

    /// Read the decompressed contents of an entry
    pub fn read(&mut self, path: &str) -> Result<Vec<u8>> {
        let i = *self
            .index
            .get(path)
            .ok_or_else(|| Error::EntryMissing(path.to_string()))?;

        let mut file = self.archive.by_index(i)?;
        let mut data = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut data)?;
        Ok(data)
    }

    /// Read the content id (`header.uuid`) from the pack identity file
    pub fn content_id(&mut self) -> Result<String> {
        if !self.contains(PACK_MANIFEST) {
            return Err(Error::ManifestMissing(PACK_MANIFEST.to_string()));
        }
        let data = self.read(PACK_MANIFEST)?;
        let data = data.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(&data[..]);

        let manifest: PackManifest = serde_json::from_slice(data)
            .map_err(|e| Error::InvalidPackManifest(format!("{}: {}", PACK_MANIFEST, e)))?;

        manifest
            .header
            .and_then(|h| h.uuid)
            .ok_or_else(|| Error::InvalidPackManifest(format!("{} has no header.uuid", PACK_MANIFEST)))
    }
}
