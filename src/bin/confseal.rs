//! Confseal CLI - key-based configuration file encryption
//!
//! Command-line interface for sealing whole files or individual HCL values
//! with AES-256-CFB and HMAC-SHA512.

use clap::{ArgAction, Parser, Subcommand};
use std::error::Error as StdError;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;
use tracing::info;
use tracing_subscriber::EnvFilter;

use confseal::cipher;
use confseal::error::{ConfsealError, ErrorCategory, ErrorKind, Result};
use confseal::file_ops;
use confseal::keysource::{
    EncodedKeyReader, KeyReader, ReaderKeyReader, TerminalKeyReader, encode_key,
};

#[derive(Parser)]
#[command(name = "confseal")]
#[command(version)]
#[command(about = "Key-based encryption of configuration files and HCL values.", long_about = None)]
struct Cli {
    /// Base64-encoded 32-byte key
    #[arg(short, long, global = true, env = "CONFSEAL_KEY", hide_env_values = true)]
    key: Option<String>,

    /// Read the base64-encoded key from stdin instead of from the terminal
    #[arg(long, global = true)]
    key_stdin: bool,

    /// Increase log verbosity (-v for info, -vv for debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encrypt a file
    #[command(alias = "e")]
    Encrypt {
        /// Path to the file whose contents is to be encrypted
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Path to write the encrypted text to [default: INPUT.enc]
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Delete the input file after a successful encryption
        #[arg(short, long)]
        delete: bool,
    },

    /// Decrypt a file
    #[command(alias = "d")]
    Decrypt {
        /// Path to the file whose contents is to be decrypted
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Path to write the plaintext to [default: INPUT without .enc]
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Delete the input file after a successful decryption
        #[arg(short, long)]
        delete: bool,
    },

    /// Encrypt the values under a key path inside an HCL file
    Inline {
        /// Path to the HCL file
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Path to write the result to [default: rewrite INPUT in place]
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Slash-separated labels selecting the values, e.g. secret/data
        #[arg(short = 'p', long, value_name = "PATH")]
        key_path: String,
    },

    /// Decrypt the values under a key path inside an HCL file
    Reveal {
        /// Path to the HCL file
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Path to write the result to [default: rewrite INPUT in place]
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Slash-separated labels selecting the values, e.g. secret/data
        #[arg(short = 'p', long, value_name = "PATH")]
        key_path: String,
    },

    /// Print a new random key, base64-encoded
    Keygen,

    /// Concatenate the configuration files of a directory
    Render {
        /// Render only this file
        #[arg(short, long, value_name = "FILE")]
        file: Option<PathBuf>,

        /// Directory holding the *.vc files
        #[arg(short = 'C', long, value_name = "DIR", default_value = ".")]
        dir: PathBuf,

        /// Also decrypt and include *.vc.enc files
        #[arg(short, long)]
        encrypted: bool,

        /// Write to this file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        let mut source = e.source();
        while let Some(cause) = source {
            eprintln!("  caused by: {}", cause);
            source = cause.source();
        }
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let key_stdin = cli.key_stdin;
    let key = cli.key;

    match cli.command {
        Commands::Encrypt {
            input,
            output,
            delete,
        } => {
            let output = output.unwrap_or_else(|| file_ops::default_encrypted_path(&input));
            let mut reader = get_key_reader(key_stdin, key);
            file_ops::encrypt_file(&input, &output, &mut *reader)?;
            if delete {
                file_ops::remove_input(&input)?;
            }
            Ok(())
        }
        Commands::Decrypt {
            input,
            output,
            delete,
        } => {
            let output = output.unwrap_or_else(|| file_ops::default_decrypted_path(&input));
            let mut reader = get_key_reader(key_stdin, key);
            file_ops::decrypt_file(&input, &output, &mut *reader)?;
            if delete {
                file_ops::remove_input(&input)?;
            }
            Ok(())
        }
        Commands::Inline {
            input,
            output,
            key_path,
        } => {
            let output = output.unwrap_or_else(|| input.clone());
            let mut reader = get_key_reader(key_stdin, key);
            let report = file_ops::inline_encrypt_file(&input, &output, &key_path, &mut *reader)?;
            info!(encrypted = report.changed.len(), skipped = report.skipped.len(), "inline encryption done");
            Ok(())
        }
        Commands::Reveal {
            input,
            output,
            key_path,
        } => {
            let output = output.unwrap_or_else(|| input.clone());
            let mut reader = get_key_reader(key_stdin, key);
            let report = file_ops::inline_decrypt_file(&input, &output, &key_path, &mut *reader)?;
            info!(decrypted = report.changed.len(), skipped = report.skipped.len(), "inline decryption done");
            Ok(())
        }
        Commands::Keygen => {
            let key = cipher::generate_key();
            let encoded = encode_key(&key[..]);
            write_stdout(encoded.as_bytes())?;
            write_stdout(b"\n")
        }
        Commands::Render {
            file,
            dir,
            encrypted,
            output,
        } => {
            let rendered = if encrypted {
                let mut boxed = get_key_reader(key_stdin, key);
                let reader: &mut dyn KeyReader = &mut *boxed;
                file_ops::render_configs(&dir, file.as_deref(), Some(reader))?
            } else {
                file_ops::render_configs(&dir, file.as_deref(), None)?
            };
            match output {
                Some(path) => write_output(&path, &rendered),
                None => write_stdout(&rendered),
            }
        }
    }
}

fn get_key_reader(use_stdin: bool, key: Option<String>) -> Box<dyn KeyReader> {
    if use_stdin {
        Box::new(ReaderKeyReader::new(Box::new(io::stdin())))
    } else if let Some(key) = key {
        Box::new(EncodedKeyReader::new(key))
    } else {
        Box::new(TerminalKeyReader::new())
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn write_output(path: &Path, contents: &[u8]) -> Result<()> {
    file_ops::write_file_secure(path, contents)
        .map_err(|e| e.with_context(format!("failed to write to {}", path.display())))
}

fn write_stdout(contents: &[u8]) -> Result<()> {
    let mut stdout = io::stdout().lock();
    stdout
        .write_all(contents)
        .and_then(|()| stdout.flush())
        .map_err(|e| {
            ConfsealError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::Io,
                "failed to write to stdout",
                e,
            )
        })
}
