//! Output file naming and creation for extracted members.
//!
//! An explicit destination is used as given and may replace an existing file.
//! Otherwise the embedded member name is used when it is a plain file name,
//! falling back to [`FALLBACK_NAME`], and an existing file is never replaced.

use gzcarve_core::error::{CarveError, Result};
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

/// Output name used when the member carries no usable name.
pub const FALLBACK_NAME: &str = "gzcarve.out";

/// Where an extracted member is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPolicy {
    /// Destination given by the user, used verbatim.
    pub explicit: Option<PathBuf>,
    /// Directory for generated names.
    pub directory: PathBuf,
    /// Set the output file's modification time from the member header.
    pub restore_mtime: bool,
}

impl OutputPolicy {
    /// Write to exactly this path, replacing any existing file.
    pub fn explicit(path: impl Into<PathBuf>) -> Self {
        Self {
            explicit: Some(path.into()),
            ..Self::default()
        }
    }

    /// Generate a name inside `directory`, never replacing existing files.
    pub fn implicit(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            ..Self::default()
        }
    }

    /// Enable or disable mtime restoration.
    pub fn with_restore_mtime(mut self, restore: bool) -> Self {
        self.restore_mtime = restore;
        self
    }

    /// Output path for a member with the given embedded name.
    pub fn resolve(&self, embedded_name: &str) -> PathBuf {
        match &self.explicit {
            Some(path) => path.clone(),
            None => self.directory.join(implicit_name(embedded_name)),
        }
    }

    /// Open the resolved output path for writing.
    pub fn open(&self, path: &Path) -> Result<File> {
        let mut options = OpenOptions::new();
        options.write(true);
        if self.explicit.is_some() {
            options.create(true).truncate(true);
        } else {
            options.create_new(true);
        }

        options.open(path).map_err(|e| {
            if self.explicit.is_none() && e.kind() == io::ErrorKind::AlreadyExists {
                CarveError::output_exists(path)
            } else {
                CarveError::write(e)
            }
        })
    }
}

impl Default for OutputPolicy {
    fn default() -> Self {
        Self {
            explicit: None,
            directory: PathBuf::from("."),
            restore_mtime: false,
        }
    }
}

/// The embedded name if it can be trusted as a file name, else [`FALLBACK_NAME`].
///
/// Header names are decoded as lossy UTF-8, so a name that was not valid
/// UTF-8 carries `U+FFFD` and is replaced rather than written under a
/// mangled name.
pub fn implicit_name(embedded: &str) -> &str {
    let plain = !embedded.is_empty()
        && embedded != "."
        && embedded != ".."
        && !embedded.contains(char::REPLACEMENT_CHARACTER)
        && !embedded.chars().any(std::path::is_separator);
    if plain { embedded } else { FALLBACK_NAME }
}
