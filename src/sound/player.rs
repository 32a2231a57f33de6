//! Cue player implementation using rodio.
//!
//! The cue is kept in memory (encoded file bytes or the synthesized gong)
//! so that every rewind can build a fresh sink positioned at the start.

use std::io::Cursor;
use std::sync::{Arc, Mutex, MutexGuard};

use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use tracing::{debug, warn};

use super::error::SoundError;
use super::source::{CueSource, DEFAULT_CUE_NAME};
use super::tone::GongTone;

/// Cue audio held by the player.
#[derive(Clone)]
enum CueData {
    /// Encoded file contents, decoded on every rewind.
    Encoded(Arc<[u8]>),
    /// The synthesized gong.
    Tone,
}

/// A cue player backed by the default audio output device.
pub struct RodioCuePlayer {
    /// The audio output stream (must be kept alive for playback).
    _stream: OutputStream,
    /// Handle to the output stream for creating sinks.
    stream_handle: OutputStreamHandle,
    cue: CueData,
    cue_name: String,
    /// Sink positioned by the last rewind.
    sink: Mutex<Option<Sink>>,
}

impl RodioCuePlayer {
    /// Opens the default output device and loads the cue.
    ///
    /// A cue file that cannot be read or decoded is replaced by the
    /// synthesized gong.
    ///
    /// # Errors
    ///
    /// Returns `SoundError::DeviceNotAvailable` if no audio output device
    /// is available.
    pub fn new(source: &CueSource) -> Result<Self, SoundError> {
        let (stream, stream_handle) = OutputStream::try_default()
            .map_err(|e| SoundError::DeviceNotAvailable(e.to_string()))?;

        debug!("Audio output stream initialized");

        let (cue, cue_name) = match load_cue(source) {
            Ok(cue) => (cue, source.name().to_string()),
            Err(e) if e.should_fall_back_to_tone() => {
                warn!("Cue '{}' unusable: {}, falling back to gong", source.name(), e);
                (CueData::Tone, DEFAULT_CUE_NAME.to_string())
            }
            Err(e) => return Err(e),
        };

        Ok(Self {
            _stream: stream,
            stream_handle,
            cue,
            cue_name,
            sink: Mutex::new(None),
        })
    }

    /// Returns the name of the loaded cue.
    #[must_use]
    pub fn cue_name(&self) -> &str {
        &self.cue_name
    }

    /// Replaces the current sink with a paused one at the start of the cue.
    pub fn rewind_to_start(&self) -> Result<(), SoundError> {
        let sink = self.prepare_sink()?;
        let mut slot = self.lock_sink()?;
        if let Some(previous) = slot.replace(sink) {
            previous.stop();
        }
        debug!("Cue '{}' rewound", self.cue_name);
        Ok(())
    }

    /// Starts (or resumes) playback of the prepared sink.
    ///
    /// Playback is non-blocking.
    pub fn play(&self) -> Result<(), SoundError> {
        let mut slot = self.lock_sink()?;
        if slot.is_none() {
            *slot = Some(self.prepare_sink()?);
        }
        if let Some(sink) = slot.as_ref() {
            sink.play();
        }
        debug!("Cue '{}' playing", self.cue_name);
        Ok(())
    }

    /// Blocks until the current cue has finished.
    pub fn sleep_until_end(&self) {
        if let Ok(slot) = self.lock_sink() {
            if let Some(sink) = slot.as_ref() {
                sink.sleep_until_end();
            }
        }
    }

    fn prepare_sink(&self) -> Result<Sink, SoundError> {
        let sink = Sink::try_new(&self.stream_handle)
            .map_err(|e| SoundError::StreamError(e.to_string()))?;
        sink.pause();

        match &self.cue {
            CueData::Encoded(bytes) => {
                let decoder = Decoder::new(Cursor::new(Arc::clone(bytes)))
                    .map_err(|e| SoundError::DecodeError(e.to_string()))?;
                sink.append(decoder);
            }
            CueData::Tone => sink.append(GongTone::new()),
        }
        Ok(sink)
    }

    fn lock_sink(&self) -> Result<MutexGuard<'_, Option<Sink>>, SoundError> {
        self.sink
            .lock()
            .map_err(|_| SoundError::PlaybackError("cue sink lock poisoned".to_string()))
    }
}

impl std::fmt::Debug for RodioCuePlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RodioCuePlayer")
            .field("cue", &self.cue_name)
            .finish_non_exhaustive()
    }
}

/// Reads and probes the cue so decoding problems surface at construction.
fn load_cue(source: &CueSource) -> Result<CueData, SoundError> {
    match source {
        CueSource::Tone { .. } => Ok(CueData::Tone),
        CueSource::File { path, .. } => {
            let bytes = std::fs::read(path)
                .map_err(|e| SoundError::FileNotFound(format!("{}: {}", path.display(), e)))?;
            let bytes: Arc<[u8]> = Arc::from(bytes);
            Decoder::new(Cursor::new(Arc::clone(&bytes)))
                .map_err(|e| SoundError::DecodeError(e.to_string()))?;
            Ok(CueData::Encoded(bytes))
        }
    }
}
