//! Pack file writing
//!
//! Output packs are written strictly in sequence: an entry is opened, filled
//! and closed before the next one starts. File entries are always stored with
//! the deflate method, so replaced content never inherits stale sizes or
//! checksums from the entry it was copied from.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::Path;

use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::Result;
use crate::pack::EntryMeta;

/// Payloads at or above this size need ZIP64 headers
const ZIP64_THRESHOLD: u64 = 0xFFFF_FFFF;

/// Options for writing packs
#[derive(Debug, Clone, Default)]
pub struct PackWriteOptions {
    /// Deflate level (0-9), `None` for the zip crate default
    pub deflate_level: Option<i64>,
}

/// Append-only pack writer
pub struct PackWriter<W: Write + Seek> {
    zip: ZipWriter<W>,
    written: HashSet<String>,
    options: PackWriteOptions,
}

impl PackWriter<BufWriter<File>> {
    /// Create a new pack file for writing
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::create_with_options(path, PackWriteOptions::default())
    }

    /// Create a new pack file with custom options
    pub fn create_with_options<P: AsRef<Path>>(path: P, options: PackWriteOptions) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self::with_options(BufWriter::new(file), options))
    }
}

impl<W: Write + Seek> PackWriter<W> {
    /// Write a pack into any seekable sink
    pub fn new(inner: W) -> Self {
        Self::with_options(inner, PackWriteOptions::default())
    }

    /// Write a pack into any seekable sink with custom options
    pub fn with_options(inner: W, options: PackWriteOptions) -> Self {
        Self {
            zip: ZipWriter::new(inner),
            written: HashSet::new(),
            options,
        }
    }

    /// Check if an entry with this path was already written
    pub fn contains(&self, path: &str) -> bool {
        self.written.contains(path)
    }

    /// Add an empty directory entry
    ///
    /// Returns `false` if the path was already written.
    pub fn add_directory(&mut self, meta: &EntryMeta) -> Result<bool> {
        let mut path = meta.path.clone();
        if !path.ends_with('/') {
            path.push('/');
        }
        if !self.written.insert(path.clone()) {
            debug!("Skipping duplicate directory: {}", path);
            return Ok(false);
        }

        let options = self.entry_options(meta, 0);
        self.zip.add_directory(path.as_str(), options)?;
        Ok(true)
    }

    /// Add a file entry with the given content
    ///
    /// Timestamp and permissions come from `meta`; the compression method is
    /// always deflate. Returns `false` if the path was already written.
    pub fn add_file(&mut self, meta: &EntryMeta, data: &[u8]) -> Result<bool> {
        if !self.written.insert(meta.path.clone()) {
            debug!("Skipping duplicate file: {}", meta.path);
            return Ok(false);
        }

        let options = self.entry_options(meta, data.len() as u64);
        self.zip.start_file(meta.path.as_str(), options)?;
        self.zip.write_all(data)?;
        Ok(true)
    }

    /// Finalize the archive and return the underlying sink
    pub fn finish(self) -> Result<W> {
        let mut inner = self.zip.finish()?;
        inner.flush()?;
        Ok(inner)
    }

    fn entry_options(&self, meta: &EntryMeta, len: u64) -> SimpleFileOptions {
        let mut options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(self.options.deflate_level)
            .large_file(len >= ZIP64_THRESHOLD);

        if let Some(time) = meta.last_modified {
            options = options.last_modified_time(time);
        }
        if let Some(mode) = meta.unix_mode {
            options = options.unix_permissions(mode);
        }
        options
    }
}
