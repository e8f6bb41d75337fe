//! Pack file utility functions
//!
//! This module contains the operations behind the command line front end:
//! encrypting, decrypting and inspecting packs.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::{
    contents::{read_header, ContentsHeader, CONTENTS_FILE},
    crypto::generate_key,
    transcoder::{decrypt_pack, encrypt_pack, PackOptions, PackReport},
    utils::{default_output_path, format_size, subpack_root_of},
    PackReader,
};

/// Summary of a pack, gathered without a key
#[derive(Debug, Clone)]
pub struct PackInfo {
    pub path: PathBuf,
    pub files: usize,
    pub directories: usize,
    /// Sum of uncompressed file sizes
    pub total_size: u64,
    /// Whether a root `contents.json` exists
    pub encrypted: bool,
    /// `header.uuid` of the pack identity file, if readable
    pub content_id: Option<String>,
    /// Readable contents headers by archive path
    pub manifests: Vec<(String, ContentsHeader)>,
}

/// Gather a [`PackInfo`] for the pack at `path`
pub fn inspect_pack(path: &Path) -> crate::Result<PackInfo> {
    let mut reader = PackReader::open(path)?;

    let mut info = PackInfo {
        path: path.to_path_buf(),
        files: 0,
        directories: 0,
        total_size: 0,
        encrypted: reader.contains(CONTENTS_FILE),
        content_id: None,
        manifests: Vec::new(),
    };

    let mut manifest_paths = Vec::new();
    for entry in reader.entries() {
        if entry.is_dir {
            info.directories += 1;
            continue;
        }
        info.files += 1;
        info.total_size += entry.size;

        let at_level = entry.path == CONTENTS_FILE
            || subpack_root_of(&entry.path)
                .map(|root| entry.path[root.len()..] == *CONTENTS_FILE)
                .unwrap_or(false);
        if at_level {
            manifest_paths.push(entry.path.clone());
        }
    }

    info.content_id = match reader.content_id() {
        Ok(id) => Some(id),
        Err(e) => {
            debug!("No content id: {}", e);
            None
        }
    };

    for manifest in manifest_paths {
        let data = reader.read(&manifest)?;
        match read_header(&data) {
            Ok(header) => info.manifests.push((manifest, header)),
            Err(e) => warn!("Unreadable {}: {}", manifest, e),
        }
    }

    Ok(info)
}

/// Show pack information
pub fn show_info(path: &Path) -> Result<()> {
    println!("Opening {}...", path.display());

    let info = inspect_pack(path).with_context(|| format!("Failed to open {}", path.display()))?;

    println!();
    println!("Pack Information:");
    println!("  File: {}", info.path.display());
    println!("  Files: {}", info.files);
    println!("  Directories: {}", info.directories);
    println!("  Uncompressed size: {}", format_size(info.total_size));
    println!(
        "  Content id: {}",
        info.content_id.as_deref().unwrap_or("(none)")
    );
    println!();
    println!("Encryption:");
    println!("  Encrypted: {}", if info.encrypted { "yes" } else { "no" });
    if info.manifests.is_empty() {
        println!("  Manifests: (none)");
    }
    for (manifest, header) in &info.manifests {
        println!(
            "  {} (version {}, content id {})",
            manifest, header.version, header.content_id
        );
    }

    Ok(())
}

/// Encrypt a pack, generating a master key when none is given
///
/// The output defaults to `<name>_encrypted.<ext>` next to the input.
pub fn encrypt_file(
    input: &Path,
    output: Option<&Path>,
    key: Option<&str>,
    options: &PackOptions,
) -> Result<()> {
    let key = match key {
        Some(key) => key.to_string(),
        None => {
            let key = generate_key();
            println!("Generated key: {}", key);
            key
        }
    };
    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_output_path(input, "_encrypted"));

    println!("Encrypting {} -> {}...", input.display(), output.display());
    let report = encrypt_pack(input, &output, &key, options)
        .with_context(|| format!("Failed to encrypt {}", input.display()))?;

    print_report(&report);
    println!("Key: {}", key);
    Ok(())
}

/// Decrypt a pack with its master key
///
/// The output defaults to `<name>_decrypted.<ext>` next to the input.
pub fn decrypt_file(
    input: &Path,
    output: Option<&Path>,
    key: &str,
    options: &PackOptions,
) -> Result<()> {
    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_output_path(input, "_decrypted"));

    println!("Decrypting {} -> {}...", input.display(), output.display());
    let report = decrypt_pack(input, &output, key, options)
        .with_context(|| format!("Failed to decrypt {}", input.display()))?;

    print_report(&report);
    Ok(())
}

/// Print the counters of a finished operation and anything that was skipped
pub fn print_report(report: &PackReport) {
    println!();
    println!("Done:");
    if report.encrypted > 0 {
        println!("  Encrypted: {} files", report.encrypted);
    }
    if report.decrypted > 0 {
        println!("  Decrypted: {} files", report.decrypted);
    }
    println!("  Copied: {} files", report.copied);
    println!("  Directories: {}", report.directories);
    println!("  Subpacks: {}", report.subpacks);

    if !report.is_clean() {
        println!();
        println!("Skipped {} entries:", report.skipped.len());
        for (path, reason) in &report.skipped {
            println!("  {}: {}", path, reason);
        }
    }
}
