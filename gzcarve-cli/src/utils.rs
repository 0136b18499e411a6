//! Utility functions for the CLI.

use gzcarve_scan::MemberInfo;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Open the input file, or stdin for `-`.
pub fn open_input(path: &Path) -> io::Result<Box<dyn Read>> {
    if path.as_os_str() == "-" {
        Ok(Box::new(io::stdin().lock()))
    } else {
        Ok(Box::new(File::open(path)?))
    }
}

/// JSON serializable record of one located member.
#[derive(Debug, Serialize)]
pub struct MemberJson {
    pub ordinal: usize,
    pub offset: u64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mtime: Option<u32>,
    pub os: String,
    pub xfl: u8,
    pub flags: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub name_truncated: bool,
}

impl MemberJson {
    pub fn from_member(member: &MemberInfo) -> Self {
        let header = &member.header;
        Self {
            ordinal: member.ordinal,
            offset: member.offset,
            name: member.name().to_string(),
            mtime: (header.mtime != 0).then_some(header.mtime),
            os: header.os_name().to_string(),
            xfl: header.xfl,
            flags: header.flags,
            comment: header.comment.clone(),
            name_truncated: header.name_truncated,
        }
    }
}

/// Long listing line: the standard line followed by header details.
pub fn long_line(member: &MemberInfo) -> String {
    let header = &member.header;
    let mut line = format!(
        "{}\n      mtime={} os={} xfl={}",
        member,
        header.mtime,
        header.os_name(),
        header.xfl
    );
    if let Some(comment) = &header.comment {
        line.push_str(&format!(" comment={:?}", comment));
    }
    line
}

/// Create a spinner counting written bytes.
pub fn create_byte_spinner(enable: bool) -> ProgressBar {
    if !enable {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .template("{spinner} [{elapsed_precise}] {bytes} written ({bytes_per_sec}) {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    pb.set_style(style);
    pb
}

#[cfg(test)]
mod tests {
    use super::*;
    use gzcarve_scan::GzipHeader;

    fn member() -> MemberInfo {
        MemberInfo {
            ordinal: 2,
            offset: 0x40,
            header: GzipHeader {
                mtime: 1_600_000_000,
                os: 3,
                filename: Some("a.txt".to_string()),
                comment: Some("hello".to_string()),
                ..GzipHeader::default()
            },
        }
    }

    #[test]
    fn test_member_json() {
        let json = serde_json::to_value(MemberJson::from_member(&member())).unwrap();
        assert_eq!(json["ordinal"], 2);
        assert_eq!(json["offset"], 64);
        assert_eq!(json["name"], "a.txt");
        assert_eq!(json["mtime"], 1_600_000_000u32);
        assert_eq!(json["os"], "Unix");
        assert_eq!(json["comment"], "hello");
    }

    #[test]
    fn test_member_json_skips_absent_fields() {
        let bare = MemberInfo {
            ordinal: 1,
            offset: 0,
            header: GzipHeader::default(),
        };
        let json = serde_json::to_value(MemberJson::from_member(&bare)).unwrap();
        assert!(json.get("mtime").is_none());
        assert!(json.get("comment").is_none());
        assert_eq!(json["name"], "");
    }

    #[test]
    fn test_long_line() {
        let line = long_line(&member());
        assert!(line.starts_with(" 2: 0x00000040  a.txt\n"));
        assert!(line.contains("mtime=1600000000"));
        assert!(line.contains("comment=\"hello\""));
    }

    #[test]
    fn test_hidden_spinner() {
        assert!(create_byte_spinner(false).is_hidden());
    }
}
