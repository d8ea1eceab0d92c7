#![allow(dead_code)]

use luis_speech::{
    engine::{NativeEvent, RecognizerRequest},
    error::*,
    hr,
    speech::{AudioInputStream, EventSink},
    Credential, Handle, RecognitionEngine, Result, SpxHandle,
};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Recording engine double. Every native call is logged in `calls`.
#[derive(Default)]
pub struct MockEngine {
    next: AtomicUsize,
    pub initialized: AtomicUsize,
    /// Status returned by `create_recognizer`, zero for success.
    pub status: AtomicUsize,
    pub calls: Mutex<Vec<String>>,
    pub factories: Mutex<Vec<(Handle, Credential, String)>>,
    pub requests: Mutex<Vec<RecognizerRequest>>,
    pub sinks: Mutex<Vec<(Handle, EventSink)>>,
    pub once: Mutex<Vec<NativeEvent>>,
}

impl MockEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(MockEngine::default())
    }

    fn next_handle(&self) -> Handle {
        self.next.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn record<T: ToString>(&self, call: T) {
        self.calls.lock().unwrap().push(call.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of recorded calls equal to `call`.
    pub fn count(&self, call: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == call).count()
    }

    pub fn last_request(&self) -> RecognizerRequest {
        self.requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no recognizer was requested")
    }

    /// Push a native event as the engine's callback thread would.
    pub fn fire(&self, recognizer: Handle, evt: NativeEvent) -> Result {
        let sink = self
            .sinks
            .lock()
            .unwrap()
            .iter()
            .find(|(h, _)| *h == recognizer)
            .map(|(_, sink)| sink.clone())
            .expect("recognizer was not started");
        sink.fire(evt)
    }
}

impl RecognitionEngine for MockEngine {
    fn initialize(&self) -> Result {
        self.initialized.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn create_factory(&self, credential: &Credential, region: &str) -> Result<Handle> {
        let h = self.next_handle();
        self.factories
            .lock()
            .unwrap()
            .push((h, credential.clone(), region.to_string()));
        self.record(format!("factory_create({})", h));
        Ok(h)
    }

    fn factory_release(&self, factory: Handle) -> Result {
        self.record(format!("factory_release({})", factory));
        Ok(())
    }

    fn audio_from_wav_file(&self, path: &Path) -> Result<Handle> {
        let h = self.next_handle();
        self.record(format!("audio_open({}, {})", h, path.display()));
        Ok(h)
    }

    fn audio_release(&self, audio: Handle) -> Result {
        self.record(format!("audio_release({})", audio));
        Ok(())
    }

    fn create_recognizer(
        &self,
        factory: Handle,
        request: &RecognizerRequest,
    ) -> Result<Handle> {
        self.requests.lock().unwrap().push(request.clone());
        hr(self.status.load(Ordering::SeqCst))?;
        let h = self.next_handle();
        self.record(format!("recognizer_create({}, {})", factory, h));
        Ok(h)
    }

    fn recognizer_release(&self, recognizer: Handle) -> Result {
        self.record(format!("recognizer_release({})", recognizer));
        Ok(())
    }

    fn start_continuous(&self, recognizer: Handle, sink: EventSink) -> Result {
        self.record(format!("start({})", recognizer));
        self.sinks.lock().unwrap().push((recognizer, sink));
        Ok(())
    }

    fn stop_continuous(&self, recognizer: Handle) -> Result {
        self.record(format!("stop({})", recognizer));
        Ok(())
    }

    fn recognize_once(&self, recognizer: Handle) -> Result<NativeEvent> {
        self.record(format!("recognize_once({})", recognizer));
        self.once.lock().unwrap().pop().ok_or(IsNothing)
    }
}

/// Caller-owned stream that refuses writes once closed.
pub struct TestStream {
    handle: Handle,
    pub written: Mutex<Vec<u8>>,
    pub closed: AtomicBool,
}

impl TestStream {
    pub fn new(handle: Handle) -> Arc<Self> {
        Arc::new(TestStream {
            handle,
            written: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        })
    }
}

impl SpxHandle for TestStream {
    fn handle(&self) -> Handle {
        self.handle
    }
}

impl AudioInputStream for TestStream {
    fn write(&self, buffer: &[u8]) -> Result {
        if self.closed.load(Ordering::SeqCst) {
            return Err(IsNothing);
        }
        self.written.lock().unwrap().extend_from_slice(buffer);
        Ok(())
    }

    fn close(&self) -> Result {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Write a small RIFF stub named `name` under `dir`.
pub fn wav_file(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, b"RIFF\x24\x00\x00\x00WAVEfmt ").unwrap();
    path
}
