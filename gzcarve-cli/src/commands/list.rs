//! List command implementation.

use crate::utils::{MemberJson, long_line, open_input};
use gzcarve_scan::{Session, SessionOptions};
use std::path::Path;
use tracing::debug;

/// Options for listing located members.
pub struct ListOptions {
    pub json: bool,
    pub long: bool,
}

pub fn cmd_list(
    input: &Path,
    session: SessionOptions,
    options: &ListOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    debug!(input = %input.display(), ?session, "listing members");
    let mut session = Session::with_options(open_input(input)?, session)?;

    if options.json {
        let members: Vec<MemberJson> = session
            .list()?
            .iter()
            .map(MemberJson::from_member)
            .collect();
        println!("{}", serde_json::to_string_pretty(&members)?);
        return Ok(());
    }

    // Lines are printed as members are found, so a later error still
    // leaves the earlier ones visible.
    session.list_with(|member| {
        if options.long {
            eprintln!("{}", long_line(member));
        } else {
            eprintln!("{}", member);
        }
    })?;
    Ok(())
}
