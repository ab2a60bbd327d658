//! First-boot `userdata` for new devices.
//!
//! Packet passes the `userdata` string of a creation request to the device
//! on its first boot, typically a `#cloud-config` document or a `#!` script.
//! The payload comes either inline or from a file and is sent byte for byte.
//! Blank payloads are rejected.

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8::Dir};
use thiserror::Error;

/// Errors raised while loading device `userdata`.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum UserDataError {
    /// Both an inline payload and a file were given.
    #[error("userdata takes one source: inline or file, not both")]
    BothProvided,
    /// The inline payload holds only whitespace.
    #[error("inline userdata is blank")]
    InlineEmpty,
    /// The file path holds only whitespace.
    #[error("userdata file path is blank")]
    FilePathEmpty,
    /// The file was read but holds only whitespace.
    #[error("userdata file `{path}` is blank")]
    FileEmpty {
        /// Path after `~/` expansion.
        path: String,
    },
    /// The file could not be opened or read.
    #[error("failed to read userdata file `{path}`: {message}")]
    FileRead {
        /// Path after `~/` expansion.
        path: String,
        /// I/O error reported by the filesystem.
        message: String,
    },
}

/// Where a device's `userdata` comes from.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum UserDataSource<'a> {
    /// Payload given directly on the command line or in configuration.
    Inline(&'a str),
    /// Path to a payload file; a leading `~/` resolves against `HOME`.
    File(&'a str),
}

impl<'a> UserDataSource<'a> {
    /// Picks the single configured source, if any.
    ///
    /// # Errors
    ///
    /// Returns [`UserDataError::BothProvided`] when both are set.
    pub const fn from_options(
        inline: Option<&'a str>,
        file: Option<&'a str>,
    ) -> Result<Option<Self>, UserDataError> {
        match (inline, file) {
            (Some(_), Some(_)) => Err(UserDataError::BothProvided),
            (Some(payload), None) => Ok(Some(Self::Inline(payload))),
            (None, Some(path)) => Ok(Some(Self::File(path))),
            (None, None) => Ok(None),
        }
    }

    /// Produces the payload to send as `userdata`.
    ///
    /// # Errors
    ///
    /// Returns [`UserDataError`] when the payload or path is blank or the file
    /// cannot be read.
    pub fn load(self) -> Result<String, UserDataError> {
        match self {
            Self::Inline(payload) if payload.trim().is_empty() => Err(UserDataError::InlineEmpty),
            Self::Inline(payload) => Ok(payload.to_owned()),
            Self::File(path) if path.trim().is_empty() => Err(UserDataError::FilePathEmpty),
            Self::File(path) => load_file(&home_relative(path)),
        }
    }
}

/// Loads `userdata` from an inline value or a file, whichever is set.
///
/// # Errors
///
/// Returns [`UserDataError`] when both sources are set, the chosen one is
/// blank, or the file cannot be read.
pub fn resolve_user_data(
    inline: Option<&str>,
    file: Option<&str>,
) -> Result<Option<String>, UserDataError> {
    UserDataSource::from_options(inline, file)?
        .map(UserDataSource::load)
        .transpose()
}

fn home_relative(path: &str) -> Utf8PathBuf {
    match (path.strip_prefix("~/"), std::env::var("HOME")) {
        (Some(rest), Ok(home)) => Utf8Path::new(&home).join(rest),
        _ => Utf8PathBuf::from(path),
    }
}

fn load_file(path: &Utf8Path) -> Result<String, UserDataError> {
    let read_failed = |message: String| UserDataError::FileRead {
        path: path.to_string(),
        message,
    };
    let file_name = path
        .file_name()
        .ok_or_else(|| read_failed(String::from("path does not name a file")))?;
    let parent = path
        .parent()
        .filter(|parent| !parent.as_str().is_empty())
        .unwrap_or_else(|| Utf8Path::new("."));

    let dir = Dir::open_ambient_dir(parent, ambient_authority())
        .map_err(|err| read_failed(err.to_string()))?;
    let payload = dir
        .read_to_string(file_name)
        .map_err(|err| read_failed(err.to_string()))?;

    if payload.trim().is_empty() {
        return Err(UserDataError::FileEmpty {
            path: path.to_string(),
        });
    }
    Ok(payload)
}
