//! Cue source selection.
//!
//! The session cue is either an audio file chosen by the user or the
//! synthesized gong compiled into the binary.

use std::path::{Path, PathBuf};

use super::error::SoundError;

/// Supported audio file extensions.
const SUPPORTED_EXTENSIONS: &[&str] = &["mp3", "wav", "flac", "ogg", "aiff", "m4a"];

/// Name of the built-in cue.
pub const DEFAULT_CUE_NAME: &str = "gong";

/// Where the session cue comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CueSource {
    /// An audio file on disk.
    File {
        /// Display name, the file stem.
        name: String,
        /// Full path to the file.
        path: PathBuf,
    },
    /// The synthesized gong.
    Tone {
        /// Display name.
        name: String,
    },
}

impl CueSource {
    /// Creates a file cue, named after the file stem.
    #[must_use]
    pub fn file(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self::File { name, path }
    }

    /// Creates a file cue after checking the extension is decodable.
    ///
    /// # Errors
    ///
    /// Returns `SoundError::UnsupportedFormat` for unknown extensions.
    pub fn file_validated(path: impl Into<PathBuf>) -> Result<Self, SoundError> {
        let path = path.into();
        validate_extension(&path)?;
        Ok(Self::file(path))
    }

    /// Creates the built-in gong cue.
    #[must_use]
    pub fn tone() -> Self {
        Self::Tone {
            name: DEFAULT_CUE_NAME.to_string(),
        }
    }

    /// Picks the configured file, or the gong when none is configured.
    #[must_use]
    pub fn from_path(path: Option<&Path>) -> Self {
        match path {
            Some(path) => Self::file(path),
            None => Self::tone(),
        }
    }

    /// Returns the display name of the cue.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::File { name, .. } | Self::Tone { name } => name,
        }
    }

    /// Returns true if the cue is read from a file.
    #[must_use]
    pub fn is_file(&self) -> bool {
        matches!(self, Self::File { .. })
    }

    /// Returns the file path of a file cue.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::File { path, .. } => Some(path),
            Self::Tone { .. } => None,
        }
    }
}

impl Default for CueSource {
    fn default() -> Self {
        Self::tone()
    }
}

fn validate_extension(path: &Path) -> Result<(), SoundError> {
    let supported = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()));
    if supported {
        Ok(())
    } else {
        Err(SoundError::UnsupportedFormat(path.display().to_string()))
    }
}
