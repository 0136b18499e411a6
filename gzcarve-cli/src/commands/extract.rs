//! Extract command implementation.

use crate::utils::{create_byte_spinner, open_input};
use gzcarve_scan::{OutputPolicy, Session, SessionOptions};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Options for extracting one member.
pub struct ExtractOptions {
    pub ordinal: usize,
    pub output: Option<PathBuf>,
    pub directory: PathBuf,
    pub restore_mtime: bool,
    pub progress: bool,
    pub quiet: bool,
}

impl ExtractOptions {
    fn policy(&self) -> OutputPolicy {
        let policy = match &self.output {
            Some(path) => OutputPolicy::explicit(path),
            None => OutputPolicy::implicit(&self.directory),
        };
        policy.with_restore_mtime(self.restore_mtime)
    }
}

pub fn cmd_extract(
    input: &Path,
    session: SessionOptions,
    options: &ExtractOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    debug!(input = %input.display(), ordinal = options.ordinal, "extracting member");
    let mut session = Session::with_options(open_input(input)?, session)?;
    let policy = options.policy();

    let pb = create_byte_spinner(options.progress);
    let result = session.extract(options.ordinal, &policy, |n| pb.inc(n));
    pb.finish_and_clear();
    let report = result?;

    if !options.quiet {
        eprintln!(
            "{} -> {} ({} bytes)",
            report.member,
            report.path.display(),
            report.bytes_written
        );
    }
    Ok(())
}
