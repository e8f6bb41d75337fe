//! General utility functions for packcrypt
//!
//! Path classification shared by encryption and decryption, plus a few
//! helpers for the command line front end.

use std::path::{Path, PathBuf};

use crate::pack::PACK_MANIFEST;

/// Directory holding nested subpacks
pub const SUBPACKS_DIR: &str = "subpacks/";

/// Root files that are never encrypted
pub const EXCLUDED_FILES: [&str; 3] = [PACK_MANIFEST, "pack_icon.png", "bug_pack_icon.png"];

/// Check if a root-level path is stored verbatim
pub fn is_excluded(path: &str) -> bool {
    EXCLUDED_FILES.contains(&path)
}

/// Check if a directory path is a subpack root (`subpacks/<name>/`)
pub fn is_subpack_root(path: &str) -> bool {
    subpack_root_of(path) == Some(path)
}

/// The `subpacks/<name>/` prefix a path lives under, if any
///
/// `subpacks/foo/bar.png` and `subpacks/foo/` give `subpacks/foo/`, while a
/// file directly inside `subpacks/` belongs to no subpack.
pub fn subpack_root_of(path: &str) -> Option<&str> {
    let rest = path.strip_prefix(SUBPACKS_DIR)?;
    let end = rest.find('/')?;
    if end == 0 {
        return None;
    }
    Some(&path[..SUBPACKS_DIR.len() + end + 1])
}

/// Path next to `input` with `suffix` appended to the file stem
///
/// `packs/MyPack.mcpack` with `_encrypted` gives `packs/MyPack_encrypted.mcpack`.
pub fn default_output_path(input: &Path, suffix: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match input.extension() {
        Some(ext) => format!("{}{}.{}", stem, suffix, ext.to_string_lossy()),
        None => format!("{}{}", stem, suffix),
    };
    input.with_file_name(name)
}

/// Format a file size in human-readable form (B, KB, MB, GB)
pub fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} B", size)
    }
}
