//! # packcrypt
//!
//! A Rust library for encrypting and decrypting resource packs.
//!
//! ## Overview
//!
//! Resource packs are ZIP archives identified by the `header.uuid` of their
//! `manifest.json`. Encryption keeps the archive structure intact but replaces
//! the content of every file with AES-256-CFB8 ciphertext under its own random
//! key. The keys are collected in a binary `contents.json` at the pack root
//! (and at the root of every subpack), which is in turn encrypted under a
//! 32-character master key. This library provides:
//!
//! - Encrypting packs, including nested `subpacks/<name>/` packs
//! - Decrypting packs with their master key
//! - Reading the unencrypted `contents.json` header without a key
//! - Random key generation
//!
//! ## Example - Encrypting
//!
//! ```rust,no_run
//! use std::path::Path;
//! use packcrypt::{encrypt_pack, generate_key, PackOptions};
//!
//! fn main() -> anyhow::Result<()> {
//!     let key = generate_key();
//!     let report = encrypt_pack(
//!         Path::new("MyPack.zip"),
//!         Path::new("MyPack_encrypted.zip"),
//!         &key,
//!         &PackOptions::default(),
//!     )?;
//!
//!     println!("Encrypted {} files with key {}", report.encrypted, key);
//!     Ok(())
//! }
//! ```
//!
//! ## Example - Decrypting
//!
//! ```rust,no_run
//! use std::path::Path;
//! use packcrypt::{decrypt_pack, PackOptions};
//!
//! fn main() -> anyhow::Result<()> {
//!     let report = decrypt_pack(
//!         Path::new("MyPack_encrypted.zip"),
//!         Path::new("MyPack.zip"),
//!         "liulihaocai123456789123456789123",
//!         &PackOptions::default(),
//!     )?;
//!
//!     for (path, reason) in &report.skipped {
//!         eprintln!("{}: {}", path, reason);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Example - Streams
//!
//! ```rust,no_run
//! use std::io::Cursor;
//! use packcrypt::{PackOptions, PackReader, PackTranscoder, PackWriter};
//!
//! fn main() -> anyhow::Result<()> {
//!     let input = std::fs::read("MyPack.zip")?;
//!     let mut reader = PackReader::new(Cursor::new(input))?;
//!     let mut writer = PackWriter::new(Cursor::new(Vec::new()));
//!
//!     let transcoder = PackTranscoder::new(PackOptions::default());
//!     transcoder.encrypt(&mut reader, &mut writer, "liulihaocai123456789123456789123")?;
//!
//!     let encrypted = writer.finish()?.into_inner();
//!     println!("{} bytes", encrypted.len());
//!     Ok(())
//! }
//! ```

pub mod contents;
pub mod crypto;
pub mod error;
pub mod pack;
pub mod pack_utils;
pub mod pack_writer;
pub mod transcoder;
pub mod utils;

pub use contents::{ContentEntry, ContentsHeader};
pub use crypto::{generate_key, KEY_LENGTH};
pub use error::{Error, Result};
pub use pack::{EntryMeta, PackReader};
pub use pack_utils::{inspect_pack, PackInfo};
pub use pack_writer::{PackWriteOptions, PackWriter};
pub use transcoder::{decrypt_pack, encrypt_pack, PackOptions, PackReport, PackTranscoder};
pub use utils::default_output_path;
