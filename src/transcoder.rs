//! Pack encryption and decryption
//!
//! Encryption walks the input pack once. Every file gets its own random key,
//! the identity file and icons are stored verbatim, and each
//! `subpacks/<name>/` directory is handled as a nested pack with its own
//! `contents.json`. Subpacks reuse the master key and the content id of the
//! root pack.
//!
//! Decryption reads the root `contents.json` first and restores every entry it
//! lists, then does the same for every subpack. Problems with a single entry
//! are recorded in the [`PackReport`] and skipped.

use std::collections::{BTreeSet, HashSet};
use std::fs::{self, File};
use std::io::{BufWriter, Read, Seek, Write};
use std::path::Path;

use rayon::prelude::*;
use tracing::{debug, error, info, warn};

use crate::contents::{deserialize_contents, serialize_contents, ContentEntry, CONTENTS_FILE};
use crate::crypto::{check_key, decrypt_cfb8, encrypt_cfb8, generate_key, KEY_LENGTH};
use crate::error::{Error, Result};
use crate::pack::{EntryMeta, PackReader, PACK_MANIFEST};
use crate::pack_writer::{PackWriteOptions, PackWriter};
use crate::utils::{is_excluded, is_subpack_root, subpack_root_of, EXCLUDED_FILES};

/// Files enciphered together per batch in parallel mode
const PARALLEL_BATCH: usize = 64;

/// Options for encrypting/decrypting packs
#[derive(Debug, Clone, Default)]
pub struct PackOptions {
    /// Encrypt file batches on the rayon thread pool
    pub parallel: bool,
    /// Deflate level (0-9) for the output pack
    pub deflate_level: Option<i64>,
}

/// Outcome of a pack operation
#[derive(Debug, Default)]
pub struct PackReport {
    /// Files written as ciphertext
    pub encrypted: usize,
    /// Files restored from ciphertext
    pub decrypted: usize,
    /// Files copied verbatim
    pub copied: usize,
    /// Directory entries written
    pub directories: usize,
    /// Subpacks processed
    pub subpacks: usize,
    /// Entries or subpacks left out, with the reason
    pub skipped: Vec<(String, Error)>,
}

impl PackReport {
    /// True when nothing was skipped
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }

    fn skip(&mut self, path: String, reason: Error) {
        warn!("Skipping {}: {}", path, reason);
        self.skipped.push((path, reason));
    }
}

/// Drives the archive walk for one operation
pub struct PackTranscoder {
    options: PackOptions,
}

impl PackTranscoder {
    pub fn new(options: PackOptions) -> Self {
        Self { options }
    }

    fn batch_size(&self) -> usize {
        if self.options.parallel {
            PARALLEL_BATCH
        } else {
            1
        }
    }

    /// Encrypt every entry of `reader` into `writer`
    ///
    /// The caller still has to [`PackWriter::finish`] the output.
    pub fn encrypt<R: Read + Seek, W: Write + Seek>(
        &self,
        reader: &mut PackReader<R>,
        writer: &mut PackWriter<W>,
        master_key: &str,
    ) -> Result<PackReport> {
        check_key(master_key)?;
        let content_id = reader.content_id()?;
        info!("ContentId: {}", content_id);

        let mut report = PackReport::default();
        let mut contents = Vec::new();
        let mut pending = Vec::new();
        let mut seen_subpacks = BTreeSet::new();
        let mut implied_subpacks = BTreeSet::new();

        for meta in reader.entries().to_vec() {
            if meta.is_dir {
                if writer.add_directory(&meta)? {
                    report.directories += 1;
                }
                if is_subpack_root(&meta.path) && seen_subpacks.insert(meta.path.clone()) {
                    self.encrypt_subpack(reader, writer, &meta.path, master_key, &content_id, &mut report)?;
                }
                continue;
            }

            // Subpack files are handled by encrypt_subpack()
            if let Some(root) = subpack_root_of(&meta.path) {
                implied_subpacks.insert(root.to_string());
                continue;
            }

            if meta.path == CONTENTS_FILE {
                warn!("Dropping existing {}, the pack may already be encrypted", CONTENTS_FILE);
                continue;
            }

            if is_excluded(&meta.path) {
                info!("Excluded file: {}, copy directly", meta.path);
                let data = reader.read(&meta.path)?;
                if writer.add_file(&meta, &data)? {
                    report.copied += 1;
                    contents.push(ContentEntry::plain(meta.path.as_str()));
                }
                continue;
            }

            pending.push(meta);
            if pending.len() >= self.batch_size() {
                contents.extend(self.encrypt_batch(reader, writer, &pending, "", &mut report)?);
                pending.clear();
            }
        }
        contents.extend(self.encrypt_batch(reader, writer, &pending, "", &mut report)?);

        // Archives without explicit directory entries still have subpacks
        for root in implied_subpacks.difference(&seen_subpacks) {
            writer.add_directory(&EntryMeta::directory(root.as_str()))?;
            report.directories += 1;
            self.encrypt_subpack(reader, writer, root, master_key, &content_id, &mut report)?;
        }

        let data = serialize_contents(&content_id, master_key, &contents)?;
        writer.add_file(&EntryMeta::file(CONTENTS_FILE), &data)?;
        info!("Successfully created {}", CONTENTS_FILE);

        Ok(report)
    }

    fn encrypt_subpack<R: Read + Seek, W: Write + Seek>(
        &self,
        reader: &mut PackReader<R>,
        writer: &mut PackWriter<W>,
        prefix: &str,
        master_key: &str,
        content_id: &str,
        report: &mut PackReport,
    ) -> Result<()> {
        info!("Encrypting subpack: {}", prefix);
        let contents_path = format!("{}{}", prefix, CONTENTS_FILE);

        let members: Vec<EntryMeta> = reader
            .entries()
            .iter()
            .filter(|m| !m.is_dir && m.path.starts_with(prefix))
            .filter(|m| {
                if m.path == contents_path {
                    warn!("Dropping existing {}", contents_path);
                    return false;
                }
                true
            })
            .cloned()
            .collect();

        let mut contents = Vec::with_capacity(members.len());
        for batch in members.chunks(self.batch_size()) {
            contents.extend(self.encrypt_batch(reader, writer, batch, prefix, report)?);
        }

        let data = serialize_contents(content_id, master_key, &contents)?;
        writer.add_file(&EntryMeta::file(contents_path), &data)?;
        report.subpacks += 1;
        Ok(())
    }

    /// Encrypt a batch of files under fresh keys
    ///
    /// Reads and writes stay on the calling thread in batch order; only the
    /// cipher work moves to rayon. Recorded paths have `prefix` stripped.
    fn encrypt_batch<R: Read + Seek, W: Write + Seek>(
        &self,
        reader: &mut PackReader<R>,
        writer: &mut PackWriter<W>,
        batch: &[EntryMeta],
        prefix: &str,
        report: &mut PackReport,
    ) -> Result<Vec<ContentEntry>> {
        if batch.is_empty() {
            return Ok(Vec::new());
        }

        let mut plain = Vec::with_capacity(batch.len());
        for meta in batch {
            plain.push(reader.read(&meta.path)?);
        }

        let sealed = if self.options.parallel {
            plain
                .par_iter()
                .map(|data| seal(data))
                .collect::<Result<Vec<_>>>()?
        } else {
            plain
                .iter()
                .map(|data| seal(data))
                .collect::<Result<Vec<_>>>()?
        };

        let mut contents = Vec::with_capacity(batch.len());
        for (meta, (key, data)) in batch.iter().zip(sealed) {
            if !writer.add_file(meta, &data)? {
                continue;
            }
            info!("Encrypted file: {}", meta.path);
            debug!("File: {}, entryKey: {}", meta.path, key);
            contents.push(ContentEntry::encrypted(&meta.path[prefix.len()..], key));
            report.encrypted += 1;
        }
        Ok(contents)
    }

    /// Decrypt every entry listed by the contents files of `reader`
    ///
    /// The caller still has to [`PackWriter::finish`] the output.
    pub fn decrypt<R: Read + Seek, W: Write + Seek>(
        &self,
        reader: &mut PackReader<R>,
        writer: &mut PackWriter<W>,
        master_key: &str,
    ) -> Result<PackReport> {
        check_key(master_key)?;
        let contents = read_contents(reader, CONTENTS_FILE, master_key)?;

        let mut report = PackReport::default();
        for meta in reader.entries().iter().filter(|m| m.is_dir) {
            if writer.add_directory(meta)? {
                report.directories += 1;
            }
        }

        self.restore_level(reader, writer, "", &contents, &mut report)?;

        // Files written verbatim by any encryptor, listed or not
        for name in EXCLUDED_FILES {
            if !reader.contains(name) || writer.contains(name) {
                continue;
            }
            info!("Copying file: {}", name);
            let meta = reader
                .get(name)
                .cloned()
                .unwrap_or_else(|| EntryMeta::file(name));
            let data = reader.read(name)?;
            if writer.add_file(&meta, &data)? {
                report.copied += 1;
            }
        }

        for root in subpack_roots(reader) {
            info!("Decrypting subpack: {}", root);
            let contents_path = format!("{}{}", root, CONTENTS_FILE);
            match read_contents(reader, &contents_path, master_key) {
                Ok(contents) => {
                    self.restore_level(reader, writer, &root, &contents, &mut report)?;
                    report.subpacks += 1;
                }
                Err(
                    e @ (Error::NotEncrypted(_)
                    | Error::ContentsDecode { .. }
                    | Error::InvalidContentsHeader(_)),
                ) => {
                    error!("Failed to decrypt subpack {}: {}", root, e);
                    report.skipped.push((root, e));
                }
                Err(e) => return Err(e),
            }
        }

        info!("Decrypted {} files", report.decrypted);
        Ok(report)
    }

    fn restore_level<R: Read + Seek, W: Write + Seek>(
        &self,
        reader: &mut PackReader<R>,
        writer: &mut PackWriter<W>,
        prefix: &str,
        contents: &[ContentEntry],
        report: &mut PackReport,
    ) -> Result<()> {
        for entry in contents {
            let path = format!("{}{}", prefix, entry.path);
            let meta = match reader.get(&path) {
                Some(meta) if !meta.is_dir => meta.clone(),
                _ => {
                    report.skip(path.clone(), Error::EntryMissing(path));
                    continue;
                }
            };

            match &entry.key {
                None => {
                    info!("Copying file: {}", path);
                    let data = reader.read(&path)?;
                    if writer.add_file(&meta, &data)? {
                        report.copied += 1;
                    }
                }
                Some(key) if key.len() != KEY_LENGTH => {
                    let length = key.len();
                    report.skip(path.clone(), Error::InvalidKeyLength { path, length });
                }
                Some(key) => {
                    info!("Decrypting file: {}", path);
                    let data = reader.read(&path)?;
                    let plain = decrypt_cfb8(&data, key)?;
                    if writer.add_file(&meta, &plain)? {
                        report.decrypted += 1;
                    }
                }
            }
        }
        Ok(())
    }
}

fn seal(data: &[u8]) -> Result<(String, Vec<u8>)> {
    let key = generate_key();
    let encrypted = encrypt_cfb8(data, &key)?;
    Ok((key, encrypted))
}

fn read_contents<R: Read + Seek>(
    reader: &mut PackReader<R>,
    path: &str,
    master_key: &str,
) -> Result<Vec<ContentEntry>> {
    if !reader.contains(path) {
        return Err(Error::NotEncrypted(path.to_string()));
    }
    let data = reader.read(path)?;
    let contents = deserialize_contents(path, &data, master_key)?;
    debug!("Decrypted {}: {} entries", path, contents.len());
    Ok(contents)
}

/// Subpack roots in archive order, from directory entries and from
/// `subpacks/<name>/contents.json` files
fn subpack_roots<R: Read + Seek>(reader: &PackReader<R>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut roots = Vec::new();
    for meta in reader.entries() {
        let root = if meta.is_dir {
            is_subpack_root(&meta.path).then_some(meta.path.as_str())
        } else {
            subpack_root_of(&meta.path)
                .filter(|root| meta.path.strip_prefix(*root) == Some(CONTENTS_FILE))
        };
        if let Some(root) = root {
            if seen.insert(root.to_string()) {
                roots.push(root.to_string());
            }
        }
    }
    roots
}

/// Validate the arguments of a path based operation
///
/// Runs before any I/O: the key must be 32 ASCII characters, the input must
/// be an existing file and the output must not be the input.
pub fn check_args(input: &Path, output: &Path, master_key: &str) -> Result<()> {
    check_key(master_key)?;

    if !input.is_file() {
        return Err(Error::InvalidArgument(format!(
            "input file does not exist: {}",
            input.display()
        )));
    }

    let same = match (fs::canonicalize(input), fs::canonicalize(output)) {
        (Ok(a), Ok(b)) => a == b,
        _ => input == output,
    };
    if same {
        return Err(Error::InvalidArgument(
            "input and output file cannot be the same".to_string(),
        ));
    }

    Ok(())
}

/// Run `op` against a fresh output pack, removing the output on failure
fn with_output<F>(output: &Path, options: &PackOptions, op: F) -> Result<PackReport>
where
    F: FnOnce(&mut PackWriter<BufWriter<File>>) -> Result<PackReport>,
{
    let write_options = PackWriteOptions {
        deflate_level: options.deflate_level,
    };
    let mut writer = PackWriter::create_with_options(output, write_options)?;

    let result = match op(&mut writer) {
        Ok(report) => writer.finish().map(|_| report),
        Err(e) => {
            drop(writer);
            Err(e)
        }
    };

    if result.is_err() {
        match fs::remove_file(output) {
            Ok(()) => debug!("Removed incomplete output {}", output.display()),
            Err(e) => warn!("Failed to remove incomplete output {}: {}", output.display(), e),
        }
    }
    result
}

/// Encrypt the pack at `input` into a new pack at `output`
///
/// # Example
/// ```no_run
/// use std::path::Path;
/// use packcrypt::{encrypt_pack, generate_key, PackOptions};
///
/// let key = generate_key();
/// let report = encrypt_pack(
///     Path::new("MyPack.mcpack"),
///     Path::new("MyPack_encrypted.mcpack"),
///     &key,
///     &PackOptions::default(),
/// )?;
/// println!("{} files encrypted, key {}", report.encrypted, key);
/// # Ok::<(), packcrypt::Error>(())
/// ```
pub fn encrypt_pack(
    input: &Path,
    output: &Path,
    master_key: &str,
    options: &PackOptions,
) -> Result<PackReport> {
    check_args(input, output, master_key)?;

    let mut reader = PackReader::open(input)?;
    if !reader.contains(PACK_MANIFEST) {
        return Err(Error::ManifestMissing(PACK_MANIFEST.to_string()));
    }

    let transcoder = PackTranscoder::new(options.clone());
    let report = with_output(output, options, |writer| {
        transcoder.encrypt(&mut reader, writer, master_key)
    })?;
    info!("Encryption finished. Output file: {}", output.display());
    Ok(report)
}

/// Decrypt the pack at `input` into a new pack at `output`
pub fn decrypt_pack(
    input: &Path,
    output: &Path,
    master_key: &str,
    options: &PackOptions,
) -> Result<PackReport> {
    check_args(input, output, master_key)?;

    let mut reader = PackReader::open(input)?;
    if !reader.contains(CONTENTS_FILE) {
        error!("Cannot find {}, it seems that this pack is not encrypted", CONTENTS_FILE);
        return Err(Error::NotEncrypted(CONTENTS_FILE.to_string()));
    }

    let transcoder = PackTranscoder::new(options.clone());
    let report = with_output(output, options, |writer| {
        transcoder.decrypt(&mut reader, writer, master_key)
    })?;
    info!("Decryption finished. Output file: {}", output.display());
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pack::PackReader;
    use std::io::Cursor;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    const KEY: &str = "liulihaocai123456789123456789123";
    const MANIFEST: &str = r#"{"format_version":2,"header":{"name":"test","uuid":"abc"}}"#;

    type MemReader = PackReader<Cursor<Vec<u8>>>;

    fn build(files: &[(&str, &str)]) -> MemReader {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, data) in files {
            if name.ends_with('/') {
                zip.add_directory(*name, SimpleFileOptions::default()).unwrap();
            } else {
                zip.start_file(*name, SimpleFileOptions::default()).unwrap();
                zip.write_all(data.as_bytes()).unwrap();
            }
        }
        PackReader::new(Cursor::new(zip.finish().unwrap().into_inner())).unwrap()
    }

    fn run<F>(reader: &mut MemReader, op: F) -> (PackReport, MemReader)
    where
        F: FnOnce(&mut MemReader, &mut PackWriter<Cursor<Vec<u8>>>) -> Result<PackReport>,
    {
        let mut writer = PackWriter::new(Cursor::new(Vec::new()));
        let report = op(reader, &mut writer).unwrap();
        let data = writer.finish().unwrap().into_inner();
        (report, PackReader::new(Cursor::new(data)).unwrap())
    }

    fn encrypt(reader: &mut MemReader, options: PackOptions) -> (PackReport, MemReader) {
        let transcoder = PackTranscoder::new(options);
        run(reader, |r, w| transcoder.encrypt(r, w, KEY))
    }

    fn decrypt(reader: &mut MemReader) -> (PackReport, MemReader) {
        let transcoder = PackTranscoder::new(PackOptions::default());
        run(reader, |r, w| transcoder.decrypt(r, w, KEY))
    }

    fn contents_of(pack: &mut MemReader, path: &str) -> Vec<ContentEntry> {
        let data = pack.read(path).unwrap();
        deserialize_contents(path, &data, KEY).unwrap()
    }

    #[test]
    fn test_classification() {
        let mut input = build(&[
            ("manifest.json", MANIFEST),
            ("pack_icon.png", "icon"),
            ("textures/", ""),
            ("textures/a.txt", "hello"),
        ]);
        let (report, mut output) = encrypt(&mut input, PackOptions::default());

        assert_eq!(report.encrypted, 1);
        assert_eq!(report.copied, 2);
        assert_eq!(report.directories, 1);
        assert_eq!(output.read("manifest.json").unwrap(), MANIFEST.as_bytes());
        assert_eq!(output.read("pack_icon.png").unwrap(), b"icon");

        let ciphertext = output.read("textures/a.txt").unwrap();
        assert_eq!(ciphertext.len(), 5);
        assert_ne!(ciphertext, b"hello");

        let contents = contents_of(&mut output, CONTENTS_FILE);
        assert_eq!(contents.len(), 3);
        assert!(contents.contains(&ContentEntry::plain("manifest.json")));
        let entry = contents.iter().find(|e| e.path == "textures/a.txt").unwrap();
        let key = entry.key.as_deref().unwrap();
        assert_eq!(key.len(), KEY_LENGTH);
        assert!(key.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_eq!(decrypt_cfb8(&ciphertext, key).unwrap(), b"hello");
    }

    #[test]
    fn test_subpack_manifest() {
        let mut input = build(&[
            ("manifest.json", MANIFEST),
            ("subpacks/", ""),
            ("subpacks/sub1/", ""),
            ("subpacks/sub1/b.txt", "world"),
            ("subpacks/sub1/textures/", ""),
            ("subpacks/sub1/textures/c.txt", "!"),
        ]);
        let (report, mut output) = encrypt(&mut input, PackOptions::default());
        assert_eq!(report.subpacks, 1);
        assert_eq!(report.encrypted, 2);

        // Subpack files only appear in the subpack contents, relative to it
        let root = contents_of(&mut output, CONTENTS_FILE);
        assert!(root.iter().all(|e| !e.path.starts_with("subpacks/")));
        let sub = contents_of(&mut output, "subpacks/sub1/contents.json");
        let mut paths: Vec<_> = sub.iter().map(|e| e.path.as_str()).collect();
        paths.sort();
        assert_eq!(paths, ["b.txt", "textures/c.txt"]);

        // Same content id as the root
        let header = crate::contents::read_header(&output.read("subpacks/sub1/contents.json").unwrap()).unwrap();
        assert_eq!(header.content_id, "abc");
    }

    #[test]
    fn test_implied_subpack_root() {
        let mut input = build(&[("manifest.json", MANIFEST), ("subpacks/sub1/b.txt", "world")]);
        let (report, mut encrypted) = encrypt(&mut input, PackOptions::default());
        assert_eq!(report.subpacks, 1);
        assert!(encrypted.get("subpacks/sub1/").unwrap().is_dir);

        let (_, mut output) = decrypt(&mut encrypted);
        assert_eq!(output.read("subpacks/sub1/b.txt").unwrap(), b"world");
    }

    #[test]
    fn test_file_directly_in_subpacks_dir() {
        let mut input = build(&[("manifest.json", MANIFEST), ("subpacks/readme.txt", "hi")]);
        let (report, mut encrypted) = encrypt(&mut input, PackOptions::default());
        assert_eq!(report.subpacks, 0);
        assert_eq!(report.encrypted, 1);

        let (_, mut output) = decrypt(&mut encrypted);
        assert_eq!(output.read("subpacks/readme.txt").unwrap(), b"hi");
    }

    #[test]
    fn test_existing_contents_is_replaced() {
        let mut input = build(&[("manifest.json", MANIFEST), ("contents.json", "stale")]);
        let (report, mut output) = encrypt(&mut input, PackOptions::default());
        assert_eq!(report.encrypted, 0);
        assert_eq!(contents_of(&mut output, CONTENTS_FILE), vec![ContentEntry::plain("manifest.json")]);
    }

    #[test]
    fn test_missing_identity() {
        let mut input = build(&[("a.txt", "hello")]);
        let transcoder = PackTranscoder::new(PackOptions::default());
        let mut writer = PackWriter::new(Cursor::new(Vec::new()));
        assert!(matches!(
            transcoder.encrypt(&mut input, &mut writer, KEY),
            Err(Error::ManifestMissing(_))
        ));
    }

    #[test]
    fn test_round_trip() {
        let files = [
            ("manifest.json", MANIFEST),
            ("bug_pack_icon.png", "bug"),
            ("a.txt", "hello"),
            ("textures/", ""),
            ("textures/b.txt", "b"),
            ("subpacks/", ""),
            ("subpacks/sub1/", ""),
            ("subpacks/sub1/c.txt", "world"),
        ];
        let mut input = build(&files);
        let (_, mut encrypted) = encrypt(&mut input, PackOptions::default());
        let (report, mut output) = decrypt(&mut encrypted);

        assert!(report.is_clean());
        assert_eq!(report.subpacks, 1);
        for (name, data) in files {
            if name.ends_with('/') {
                assert!(output.get(name).unwrap().is_dir);
            } else {
                assert_eq!(output.read(name).unwrap(), data.as_bytes(), "{}", name);
            }
        }
        assert!(!output.contains(CONTENTS_FILE));
        assert!(!output.contains("subpacks/sub1/contents.json"));
    }

    #[test]
    fn test_parallel_round_trip() {
        let names: Vec<String> = (0..150).map(|i| format!("textures/{}.txt", i)).collect();
        let mut files = vec![("manifest.json", MANIFEST)];
        files.extend(names.iter().map(|n| (n.as_str(), n.as_str())));

        let mut input = build(&files);
        let options = PackOptions {
            parallel: true,
            ..Default::default()
        };
        let (report, mut encrypted) = encrypt(&mut input, options);
        assert_eq!(report.encrypted, 150);

        let keys: HashSet<_> = contents_of(&mut encrypted, CONTENTS_FILE)
            .into_iter()
            .filter_map(|e| e.key)
            .collect();
        assert!(keys.len() > 1);

        let (_, mut output) = decrypt(&mut encrypted);
        for name in &names {
            assert_eq!(output.read(name).unwrap(), name.as_bytes());
        }
    }

    #[test]
    fn test_not_encrypted() {
        let mut input = build(&[("manifest.json", MANIFEST)]);
        let transcoder = PackTranscoder::new(PackOptions::default());
        let mut writer = PackWriter::new(Cursor::new(Vec::new()));
        assert!(matches!(
            transcoder.decrypt(&mut input, &mut writer, KEY),
            Err(Error::NotEncrypted(_))
        ));
    }

    #[test]
    fn test_recoverable_entry_errors() {
        let contents = serialize_contents(
            "abc",
            KEY,
            &[
                ContentEntry::encrypted("gone.txt", "A".repeat(32)),
                ContentEntry::encrypted("short.txt", "tooshort"),
                ContentEntry::plain("plain.txt"),
            ],
        )
        .unwrap();

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, data) in [("short.txt", b"x".to_vec()), ("plain.txt", b"p".to_vec()), (CONTENTS_FILE, contents)] {
            zip.start_file(name, SimpleFileOptions::default()).unwrap();
            zip.write_all(&data).unwrap();
        }
        let mut input = PackReader::new(Cursor::new(zip.finish().unwrap().into_inner())).unwrap();

        let (report, mut output) = decrypt(&mut input);
        assert_eq!(report.skipped.len(), 2);
        assert!(report.skipped.iter().all(|(_, e)| e.is_recoverable()));
        assert!(matches!(report.skipped[0].1, Error::EntryMissing(_)));
        assert!(matches!(report.skipped[1].1, Error::InvalidKeyLength { length: 8, .. }));
        assert!(!output.contains("short.txt"));
        assert_eq!(output.read("plain.txt").unwrap(), b"p");
    }

    #[test]
    fn test_broken_subpack_is_skipped() {
        let mut input = build(&[
            ("manifest.json", MANIFEST),
            ("a.txt", "hello"),
            ("subpacks/", ""),
            ("subpacks/sub1/", ""),
            ("subpacks/sub1/b.txt", "world"),
        ]);
        let (_, encrypted) = encrypt(&mut input, PackOptions::default());

        // Rebuild the encrypted pack without the subpack contents file
        let mut tampered = ZipWriter::new(Cursor::new(Vec::new()));
        let mut source = encrypted;
        for meta in source.entries().to_vec() {
            if meta.path == "subpacks/sub1/contents.json" {
                continue;
            }
            if meta.is_dir {
                tampered.add_directory(meta.path.as_str(), SimpleFileOptions::default()).unwrap();
            } else {
                let data = source.read(&meta.path).unwrap();
                tampered.start_file(meta.path.as_str(), SimpleFileOptions::default()).unwrap();
                tampered.write_all(&data).unwrap();
            }
        }
        let mut input = PackReader::new(Cursor::new(tampered.finish().unwrap().into_inner())).unwrap();

        let (report, mut output) = decrypt(&mut input);
        assert_eq!(report.subpacks, 0);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].0, "subpacks/sub1/");
        assert!(matches!(report.skipped[0].1, Error::NotEncrypted(_)));
        assert_eq!(output.read("a.txt").unwrap(), b"hello");
        assert!(!output.contains("subpacks/sub1/b.txt"));
    }

    #[test]
    fn test_wrong_key() {
        let mut input = build(&[("manifest.json", MANIFEST), ("a.txt", "hello")]);
        let (_, mut encrypted) = encrypt(&mut input, PackOptions::default());

        let transcoder = PackTranscoder::new(PackOptions::default());
        let mut writer = PackWriter::new(Cursor::new(Vec::new()));
        let result = transcoder.decrypt(&mut encrypted, &mut writer, "abcdefghijklmnopqrstuvwxyz012345");
        match result {
            Err(Error::ContentsDecode { .. }) => {}
            Err(other) => panic!("unexpected error: {}", other),
            Ok(report) => assert!(report.decrypted == 0),
        }
    }

    #[test]
    fn test_subpack_roots() {
        let reader = build(&[
            ("subpacks/", ""),
            ("subpacks/a/", ""),
            ("subpacks/a/deeper/", ""),
            ("subpacks/b/contents.json", ""),
            ("subpacks/c/other.json", ""),
        ]);
        assert_eq!(subpack_roots(&reader), ["subpacks/a/", "subpacks/b/"]);
    }
}
