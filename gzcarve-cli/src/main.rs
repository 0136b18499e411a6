//! gzcarve CLI - gzip carving
//!
//! Finds gzip members embedded anywhere in a file, disk image or pipe, lists
//! them and extracts the one you pick.

mod commands;
mod logging;
mod utils;

use clap::{Args, Parser, Subcommand};
use commands::{ExtractOptions, ListOptions, cmd_extract, cmd_list};
use gzcarve_scan::SessionOptions;
use gzcarve_scan::window::{DEFAULT_WINDOW_SIZE, MIN_WINDOW_SIZE};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "gzcarve")]
#[command(
    author,
    version,
    about = "Find and extract gzip data embedded in arbitrary files"
)]
#[command(long_about = "
gzcarve scans its input for bytes that look like the start of a gzip member,
numbers every plausible member from 1, and can decompress any one of them.
The input is read once, front to back; `-` reads from stdin.

Examples:
  gzcarve list disk.img
  gzcarve list --json disk.img
  gzcarve extract disk.img 2
  gzcarve extract disk.img 2 -o recovered.log
  cat dump.bin | gzcarve extract - 1 -d out/
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalArgs,
}

#[derive(Args)]
struct GlobalArgs {
    /// Increase log output (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only report errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Accept headers with unusual timestamps or operating system codes
    #[arg(long, global = true)]
    lenient: bool,

    /// Input buffer size in bytes
    #[arg(long, global = true, default_value_t = DEFAULT_WINDOW_SIZE,
          value_parser = parse_window_size)]
    window_size: usize,

    /// Maximum embedded filename length kept per member
    #[arg(long, global = true, default_value_t = 29,
          value_parser = clap::value_parser!(u16).range(1..))]
    name_limit: u16,
}

impl GlobalArgs {
    fn session_options(&self) -> SessionOptions {
        SessionOptions::new()
            .strict(!self.lenient)
            .window_size(self.window_size)
            .name_limit(usize::from(self.name_limit))
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List gzip members found in the input
    #[command(alias = "l")]
    List {
        /// Input file, or `-` for stdin
        input: PathBuf,

        /// Output as JSON (machine-readable)
        #[arg(short, long)]
        json: bool,

        /// Show header details for every member
        #[arg(short, long)]
        long: bool,
    },

    /// Extract one gzip member
    #[command(alias = "x")]
    Extract {
        /// Input file, or `-` for stdin
        input: PathBuf,

        /// Member number, as shown by `list`
        #[arg(value_parser = clap::value_parser!(u32).range(1..))]
        index: u32,

        /// Write to this file, replacing it if it exists
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Directory for the generated output name
        #[arg(short = 'd', long, default_value = ".", conflicts_with = "output")]
        directory: PathBuf,

        /// Set the output's modification time from the gzip header
        #[arg(long)]
        restore_mtime: bool,

        /// Show a progress spinner
        #[arg(short = 'P', long)]
        progress: bool,
    },
}

fn parse_window_size(value: &str) -> Result<usize, String> {
    let size: usize = value.parse().map_err(|e| format!("{e}"))?;
    if size < MIN_WINDOW_SIZE {
        return Err(format!("must be at least {MIN_WINDOW_SIZE}"));
    }
    Ok(size)
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.global.verbose, cli.global.quiet);
    let session = cli.global.session_options();

    let result = match cli.command {
        Commands::List { input, json, long } => {
            cmd_list(&input, session, &ListOptions { json, long })
        }
        Commands::Extract {
            input,
            index,
            output,
            directory,
            restore_mtime,
            progress,
        } => cmd_extract(
            &input,
            session,
            &ExtractOptions {
                ordinal: index as usize,
                output,
                directory,
                restore_mtime,
                progress,
                quiet: cli.global.quiet,
            },
        ),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_extract() {
        let cli = Cli::try_parse_from([
            "gzcarve",
            "extract",
            "disk.img",
            "2",
            "-o",
            "out.bin",
            "--lenient",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.global.verbose, 2);
        assert!(cli.global.lenient);
        assert!(!cli.global.session_options().heuristic.strict);
        match cli.command {
            Commands::Extract { index, output, .. } => {
                assert_eq!(index, 2);
                assert_eq!(output, Some(PathBuf::from("out.bin")));
            }
            Commands::List { .. } => panic!("expected extract"),
        }
    }

    #[test]
    fn test_index_zero_rejected() {
        assert!(Cli::try_parse_from(["gzcarve", "x", "disk.img", "0"]).is_err());
    }

    #[test]
    fn test_window_size_minimum() {
        assert!(Cli::try_parse_from(["gzcarve", "l", "disk.img", "--window-size", "8"]).is_err());
        let cli = Cli::try_parse_from(["gzcarve", "l", "disk.img", "--window-size", "64"]).unwrap();
        assert_eq!(cli.global.session_options().window_size, 64);
    }
}
