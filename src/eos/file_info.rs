use crate::error::{Error, Result};
use std::collections::HashMap;

/// Every `file info -m` record opens with the byte length of the `file` value.
pub const KEYLENGTH_KEY: &str = "keylength.file=";

/// Separator between the keylength digits and the first byte of the path.
/// Together with `KEYLENGTH_KEY` this is the 14 + len(digits) + 7 preamble
/// of the EOS 4.x monitoring format.
pub const FILE_KEY: &str = " file=";

/// Backend state of a single file or directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMetadata {
    pub inode: i64,
    pub path: String,
    pub owner_uid: String,
    pub owner_gid: String,
    pub size: Option<u64>,
}

/// Parse one machine readable `file info` line.
///
/// The `file` value may contain spaces, so it is cut out of the record using
/// the declared `keylength.file` instead of being tokenized. The remaining
/// `key=value` pairs are read from the record with the path removed, so a
/// path such as `a ino=1` cannot shadow the real `ino` key.
pub fn parse(raw: &str) -> Result<FileMetadata> {
    let record = raw.trim_start();

    let rest = record
        .strip_prefix(KEYLENGTH_KEY)
        .ok_or_else(|| Error::parse("missing keylength.file"))?;
    let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits_len == 0 {
        return Err(Error::parse("keylength.file is not numeric"));
    }
    let file_len: usize = rest[..digits_len]
        .parse()
        .map_err(|e| Error::parse(format!("keylength.file: {}", e)))?;

    let separator_at = KEYLENGTH_KEY.len() + digits_len;
    if !record[separator_at..].starts_with(FILE_KEY) {
        return Err(Error::parse(format!(
            "expected '{}' after keylength.file",
            FILE_KEY.trim_start()
        )));
    }

    let start = separator_at + FILE_KEY.len();
    let end = start
        .checked_add(file_len)
        .ok_or_else(|| Error::parse("keylength.file overflows"))?;
    let path = record.get(start..end).ok_or_else(|| {
        Error::parse(format!(
            "file value {}..{} out of bounds of a {} byte record",
            start,
            end,
            record.len()
        ))
    })?;

    let fields = parse_fields(&record[end..]);

    let inode = fields
        .get("ino")
        .ok_or_else(|| Error::parse("missing ino"))?
        .parse::<i64>()
        .map_err(|e| Error::parse(format!("ino: {}", e)))?;
    let size = fields.get("size").and_then(|s| s.parse::<u64>().ok());

    Ok(FileMetadata {
        inode,
        path: path.to_string(),
        owner_uid: fields.get("uid").map(|s| s.to_string()).unwrap_or_default(),
        owner_gid: fields.get("gid").map(|s| s.to_string()).unwrap_or_default(),
        size,
    })
}

fn parse_fields(raw: &str) -> HashMap<&str, &str> {
    raw.split_whitespace()
        .filter_map(|token| token.split_once('='))
        .collect()
}
