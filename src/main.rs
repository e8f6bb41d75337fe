//! packcrypt - A tool for encrypting and decrypting resource packs
//!
//! Usage:
//!   packcrypt encrypt <pack> [-o output] [-k key]   - Encrypt a pack
//!   packcrypt decrypt <pack> -k key [-o output]     - Decrypt a pack
//!   packcrypt genkey                                - Print a random master key
//!   packcrypt info <pack>                           - Show pack information

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use packcrypt::crypto::generate_key;
use packcrypt::pack_utils::{decrypt_file, encrypt_file, show_info};
use packcrypt::PackOptions;

#[derive(Parser)]
#[command(name = "packcrypt")]
#[command(version = "0.1.0")]
#[command(about = "Encrypt and decrypt resource packs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log every entry and its key
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Encrypt a pack
    Encrypt {
        /// Path to the pack
        input: PathBuf,
        /// Output pack (default: <name>_encrypted.<ext>)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// 32-character master key (default: a random one)
        #[arg(short, long)]
        key: Option<String>,
        /// Encrypt files on all cores
        #[arg(short, long)]
        parallel: bool,
        /// Deflate level (0-9)
        #[arg(short, long, value_parser = clap::value_parser!(i64).range(0..=9))]
        level: Option<i64>,
    },
    /// Decrypt a pack
    Decrypt {
        /// Path to the encrypted pack
        input: PathBuf,
        /// 32-character master key
        #[arg(short, long)]
        key: String,
        /// Output pack (default: <name>_decrypted.<ext>)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Deflate level (0-9)
        #[arg(short, long, value_parser = clap::value_parser!(i64).range(0..=9))]
        level: Option<i64>,
    },
    /// Print a random master key
    Genkey,
    /// Show pack information
    Info {
        /// Path to the pack
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    match cli.command {
        Commands::Encrypt { input, output, key, parallel, level } => {
            let options = PackOptions {
                parallel,
                deflate_level: level,
            };
            encrypt_file(&input, output.as_deref(), key.as_deref(), &options)?;
        }
        Commands::Decrypt { input, key, output, level } => {
            let options = PackOptions {
                parallel: false,
                deflate_level: level,
            };
            decrypt_file(&input, output.as_deref(), &key, &options)?;
        }
        Commands::Genkey => {
            println!("{}", generate_key());
        }
        Commands::Info { input } => {
            show_info(&input)?;
        }
    }

    Ok(())
}
