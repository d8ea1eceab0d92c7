//! Audio sources a recognizer can be bound to, and who owns them.
//!
//! File input is opened by the recognizer and released with it. Streams
//! belong to the caller: a recognizer keeps a reference for its lifetime
//! but never closes or releases them.

use crate::{
    engine::{NativeAudio, RecognitionEngine},
    error::*,
    Handle, Result, SpxHandle, INVALID_HANDLE,
};
use std::{
    fmt,
    fs::File,
    path::PathBuf,
    sync::Arc,
};

/// Caller-owned audio stream.
pub trait AudioInputStream: SpxHandle + Send + Sync {
    /// The main method to stream audio data.
    fn write(&self, buffer: &[u8]) -> Result;

    /// Close the stream gracefully.
    fn close(&self) -> Result;
}

/// Audio input requested for a new recognizer.
#[derive(Clone)]
pub enum AudioSourceSpec {
    /// Default microphone.
    Microphone,
    File {
        path: PathBuf,
        language: Option<String>,
    },
    Stream {
        stream: Arc<dyn AudioInputStream>,
        language: Option<String>,
    },
}

impl AudioSourceSpec {
    pub fn microphone() -> Self {
        AudioSourceSpec::Microphone
    }

    pub fn file<P: Into<PathBuf>>(path: P) -> Self {
        AudioSourceSpec::File {
            path: path.into(),
            language: None,
        }
    }

    pub fn stream(stream: Arc<dyn AudioInputStream>) -> Self {
        AudioSourceSpec::Stream {
            stream,
            language: None,
        }
    }

    /// Spoken language in BCP-47 format, passed through unchecked.
    /// Microphone input carries no language and is returned unchanged.
    pub fn with_language<T: ToString>(self, language: T) -> Self {
        match self {
            AudioSourceSpec::Microphone => AudioSourceSpec::Microphone,
            AudioSourceSpec::File { path, .. } => AudioSourceSpec::File {
                path,
                language: Some(language.to_string()),
            },
            AudioSourceSpec::Stream { stream, .. } => AudioSourceSpec::Stream {
                stream,
                language: Some(language.to_string()),
            },
        }
    }

    pub fn language(&self) -> Option<&str> {
        match self {
            AudioSourceSpec::Microphone => None,
            AudioSourceSpec::File { language, .. }
            | AudioSourceSpec::Stream { language, .. } => language.as_deref(),
        }
    }
}

impl fmt::Debug for AudioSourceSpec {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AudioSourceSpec::Microphone => write!(f, "Microphone"),
            AudioSourceSpec::File { path, language } => {
                write!(f, "File({}, {:?})", path.display(), language)
            }
            AudioSourceSpec::Stream { stream, language } => {
                write!(f, "Stream({}, {:?})", stream.handle(), language)
            }
        }
    }
}

/// The source a recognizer ended up bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioSource {
    Microphone,
    FilePath(PathBuf, Option<String>),
    Stream(Handle, Option<String>),
}

/// Who releases the native audio resource.
pub enum Ownership {
    /// Nothing to release.
    Unbound,
    /// Audio config allocated for this recognizer.
    Owned(Handle),
    /// Caller stream, kept alive but never released here.
    Borrowed(Arc<dyn AudioInputStream>),
}

/// Audio source held by a recognizer.
pub struct AudioBinding {
    source: AudioSource,
    ownership: Ownership,
    engine: Arc<dyn RecognitionEngine>,
}

impl AudioBinding {
    /// Check the request and allocate what the binding owns.
    pub(crate) fn bind(
        engine: Arc<dyn RecognitionEngine>,
        spec: AudioSourceSpec,
    ) -> Result<Self> {
        let (source, ownership) = match spec {
            AudioSourceSpec::Microphone => {
                (AudioSource::Microphone, Ownership::Unbound)
            }
            AudioSourceSpec::File { path, language } => {
                if path.as_os_str().is_empty() {
                    return Err(InvalidArgument(String::from(
                        "audio file path is empty",
                    )));
                }
                let file = File::open(&path).map_err(|err| {
                    InvalidArgument(format!("{}: {}", path.display(), err))
                })?;
                let meta = file.metadata().map_err(|err| {
                    InvalidArgument(format!("{}: {}", path.display(), err))
                })?;
                if !meta.is_file() {
                    return Err(InvalidArgument(format!(
                        "{}: not a regular file",
                        path.display()
                    )));
                }
                let handle = engine.audio_from_wav_file(&path)?;
                log::debug!("AudioInput({}) is opened from {}", handle, path.display());
                (AudioSource::FilePath(path, language), Ownership::Owned(handle))
            }
            AudioSourceSpec::Stream { stream, language } => {
                let handle = stream.handle();
                if handle == INVALID_HANDLE {
                    return Err(InvalidArgument(String::from(
                        "audio stream handle is null",
                    )));
                }
                (AudioSource::Stream(handle, language), Ownership::Borrowed(stream))
            }
        };
        Ok(AudioBinding {
            source,
            ownership,
            engine,
        })
    }

    pub fn source(&self) -> &AudioSource {
        &self.source
    }

    pub fn ownership(&self) -> &Ownership {
        &self.ownership
    }

    pub fn is_owned(&self) -> bool {
        match self.ownership {
            Ownership::Owned(_) => true,
            _ => false,
        }
    }

    pub(crate) fn native(&self) -> NativeAudio {
        match &self.ownership {
            Ownership::Unbound => NativeAudio::Microphone,
            Ownership::Owned(handle) => NativeAudio::Config(*handle),
            Ownership::Borrowed(stream) => NativeAudio::Stream(stream.handle()),
        }
    }

    /// Release the owned audio config once. Borrowed streams are left alone.
    pub(crate) fn release(&mut self) -> Result {
        if let Ownership::Owned(handle) = &mut self.ownership {
            if *handle == INVALID_HANDLE {
                return Ok(());
            }
            let h = std::mem::replace(handle, INVALID_HANDLE);
            self.engine.audio_release(h)?;
            log::trace!("AudioInput({}) is released", h);
        }
        Ok(())
    }
}

impl Drop for AudioBinding {
    fn drop(&mut self) {
        if let Err(err) = self.release() {
            log::error!("failed to release audio of {:?}: {}", self.source, err);
        }
    }
}

impl fmt::Debug for AudioBinding {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "AudioBinding {{source: {:?}, owned: {}}}.",
            self.source,
            self.is_owned()
        )
    }
}
