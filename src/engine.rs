//! Boundary to the native recognition engine.
//!
//! Everything behind [`RecognitionEngine`] is opaque: audio decoding, model
//! inference and the service protocol. Native objects are identified by
//! [`Handle`] values the engine hands out and takes back on release.

use crate::{
    error::*,
    speech::{EventSink, RecognizerKind},
    Result,
};
use std::{path::Path, sync::OnceLock};
use url::Url;

/// Opaque native object handle.
pub type Handle = usize;

pub const INVALID_HANDLE: Handle = 0;

pub trait SpxHandle {
    fn handle(&self) -> Handle;
}

/// Service identity a factory is created with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    SubscriptionKey(String),
    AuthorizationToken(String),
}

impl Credential {
    /// The token wins when it is not empty.
    pub fn resolve(subscription_key: &str, authorization_token: &str) -> Self {
        if authorization_token.is_empty() {
            Credential::SubscriptionKey(subscription_key.to_string())
        } else {
            Credential::AuthorizationToken(authorization_token.to_string())
        }
    }
}

/// Audio input as seen by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeAudio {
    Microphone,
    /// Audio config allocated by `audio_from_wav_file`.
    Config(Handle),
    /// Caller-supplied stream, borrowed.
    Stream(Handle),
}

/// Everything the engine needs to allocate one recognizer.
#[derive(Debug, Clone)]
pub struct RecognizerRequest {
    pub kind: RecognizerKind,
    pub audio: NativeAudio,
    pub credential: Credential,
    pub region: String,
    pub language: Option<String>,
    pub endpoint: Option<Url>,
}

impl RecognizerRequest {
    /// Translation targets in caller order, empty for other kinds.
    pub fn target_languages(&self) -> &[String] {
        match &self.kind {
            RecognizerKind::Translation(params) => params.target_languages.as_slice(),
            _ => &[],
        }
    }

    pub fn voice(&self) -> Option<&str> {
        match &self.kind {
            RecognizerKind::Translation(params) => params.voice.as_deref(),
            _ => None,
        }
    }
}

/// Cancellation details as reported by the engine.
pub trait NativeCancellationDetails: Send {
    /// 1-based native reason code.
    fn reason(&self) -> i32;

    fn error_details(&self) -> String;
}

/// Plain snapshot of native cancellation details.
#[derive(Debug, Clone, Default)]
pub struct CancellationDetails {
    pub reason: i32,
    pub error_details: String,
}

impl NativeCancellationDetails for CancellationDetails {
    fn reason(&self) -> i32 {
        self.reason
    }

    fn error_details(&self) -> String {
        self.error_details.clone()
    }
}

/// Recognition output in ticks of one hundred nanoseconds.
#[derive(Debug, Clone, Default)]
pub struct NativeResult {
    pub session_id: String,
    pub result_id: String,
    pub text: String,
    pub intent_id: Option<String>,
    pub translations: Vec<(String, String)>,
    pub offset: u64,
    pub duration: u64,
}

/// Raw event delivered on the engine's callback thread.
pub enum NativeEvent {
    SessionStarted {
        session_id: String,
    },
    SessionStopped {
        session_id: String,
    },
    Recognizing(NativeResult),
    Recognized(NativeResult),
    Canceled {
        session_id: String,
        result_id: String,
        intent_id: Option<String>,
        details: Box<dyn NativeCancellationDetails>,
    },
}

/// Minimal native surface the façade consumes.
pub trait RecognitionEngine: Send + Sync {
    /// Process-wide native setup, called through [`initialize_engine`].
    fn initialize(&self) -> Result {
        Ok(())
    }

    fn create_factory(
        &self,
        credential: &Credential,
        region: &str,
    ) -> Result<Handle>;

    fn factory_release(&self, factory: Handle) -> Result;

    fn audio_from_wav_file(&self, path: &Path) -> Result<Handle>;

    fn audio_release(&self, audio: Handle) -> Result;

    fn create_recognizer(
        &self,
        factory: Handle,
        request: &RecognizerRequest,
    ) -> Result<Handle>;

    fn recognizer_release(&self, recognizer: Handle) -> Result;

    /// Events are pushed into `sink` until `stop_continuous` returns.
    fn start_continuous(&self, _recognizer: Handle, _sink: EventSink) -> Result {
        Err(Unimplemented)
    }

    fn stop_continuous(&self, _recognizer: Handle) -> Result {
        Err(Unimplemented)
    }

    /// Blocks inside the engine until one terminal event is available.
    fn recognize_once(&self, _recognizer: Handle) -> Result<NativeEvent> {
        Err(Unimplemented)
    }
}

static ENGINE_INIT: OnceLock<std::result::Result<(), String>> = OnceLock::new();

/// Load the native engine once per process.
///
/// The first call runs `engine.initialize()`; every later call, with any
/// engine, is a no-op that returns the first outcome.
pub fn initialize_engine(engine: &dyn RecognitionEngine) -> Result {
    let outcome = ENGINE_INIT.get_or_init(|| {
        log::debug!("Initializing the speech engine");
        engine.initialize().map_err(|err| err.to_string())
    });
    outcome.clone().map_err(EngineError)
}

pub fn engine_initialized() -> bool {
    ENGINE_INIT.get().is_some()
}
