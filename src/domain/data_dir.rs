//! Locating and validating a terminal's data directory.
//!
//! With UAC active the terminal keeps its data in a per-user directory
//! (`%APPDATA%/MetaQuotes/Terminal/<hash>`). Each such directory holds an
//! `origin.txt` marker whose UTF-16 text is the install path it belongs to.

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

pub const MARKER_FILE: &str = "origin.txt";

/// Sub-paths every usable data directory must contain.
pub const REQUIRED_SUBDIRS: [&[&str]; 5] = [
    &["history"],
    &["profiles"],
    &["tester"],
    &["MQL4", "Experts"],
    &["MQL4", "Libraries"],
];

/// Per-user data root under an `APPDATA` directory.
pub fn per_user_root(app_data: &Path) -> PathBuf {
    app_data.join("MetaQuotes").join("Terminal")
}

/// Decodes marker text. Honors a byte-order mark and defaults to little-endian.
pub fn decode_utf16(bytes: &[u8]) -> Option<String> {
    let (body, big_endian) = match bytes {
        [0xFF, 0xFE, rest @ ..] => (rest, false),
        [0xFE, 0xFF, rest @ ..] => (rest, true),
        _ => (bytes, false),
    };
    if body.len() % 2 != 0 {
        return None;
    }
    let units: Vec<u16> = body
        .chunks_exact(2)
        .map(|pair| {
            let pair = [pair[0], pair[1]];
            if big_endian {
                u16::from_be_bytes(pair)
            } else {
                u16::from_le_bytes(pair)
            }
        })
        .collect();
    String::from_utf16(&units).ok()
}

fn marker_matches(dir: &Path, install_path: &Path) -> bool {
    match fs::read(dir.join(MARKER_FILE)) {
        Ok(bytes) => decode_utf16(&bytes)
            .is_some_and(|text| OsStr::new(&text) == install_path.as_os_str()),
        Err(_) => false,
    }
}

/// Finds the data directory whose marker names `install_path`.
///
/// Only `root` itself and its immediate sub-directories are inspected; deeper
/// directories are never visited. Sub-directories are visited in whatever
/// order the filesystem reports them, and the first exact match wins.
pub fn find_data_dir(root: &Path, install_path: &Path) -> Option<PathBuf> {
    if marker_matches(root, install_path) {
        return Some(root.to_path_buf());
    }
    let entries = fs::read_dir(root).ok()?;
    entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .find(|path| marker_matches(path, install_path))
}

/// Returns the required sub-paths absent from `data_path`, `/`-joined.
pub fn missing_subdirs(data_path: &Path) -> Vec<String> {
    REQUIRED_SUBDIRS
        .iter()
        .filter(|parts| {
            let path = parts.iter().fold(data_path.to_path_buf(), |p, part| p.join(part));
            !path.is_dir()
        })
        .map(|parts| parts.join("/"))
        .collect()
}
