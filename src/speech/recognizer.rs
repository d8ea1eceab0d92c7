//! Recognizer for speech with intent and translation support.

use super::{
    audio::{AudioBinding, AudioSource},
    events::{Event, Flags, RecognitionCanceledEvent},
};
use crate::{
    engine::{NativeEvent, RecognitionEngine},
    error::*,
    properties::{ConfigurationStore, PropertyBag, PropertyId},
    DefineProperty, DeriveHandle, FlattenProps, Handle, Result,
};
use futures::{
    channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender},
    ready,
    stream::{Stream, StreamExt},
    task::{Context, Poll},
};
use std::{
    pin::Pin,
    sync::{Arc, Weak},
};
use url::Url;

/// What a recognizer recognizes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognizerKind {
    Speech,
    Intent,
    Translation(TranslationParams),
}

impl RecognizerKind {
    pub fn flag(&self) -> Flags {
        match self {
            RecognizerKind::Speech => Flags::Speech,
            RecognizerKind::Intent => Flags::Intent,
            RecognizerKind::Translation(_) => Flags::Translation,
        }
    }

    /// Same kind, translating from `language` instead.
    pub(crate) fn with_source_language(self, language: &str) -> Self {
        match self {
            RecognizerKind::Translation(mut tr) => {
                tr.source_language = language.to_string();
                RecognizerKind::Translation(tr)
            }
            other => other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TranslationParams {
    /// Spoken language, required.
    pub source_language: String,
    /// Kept in caller order, duplicates included.
    pub target_languages: Vec<String>,
    /// Voice name when synthesized output is wanted.
    pub voice: Option<String>,
}

impl TranslationParams {
    pub fn new<S, I>(source_language: S, target_languages: I) -> Self
    where
        S: ToString,
        I: IntoIterator,
        I::Item: ToString,
    {
        TranslationParams {
            source_language: source_language.to_string(),
            target_languages: target_languages
                .into_iter()
                .map(|lang| lang.to_string())
                .collect(),
            voice: None,
        }
    }

    pub fn with_voice<T: ToString>(mut self, voice: T) -> Self {
        self.voice = Some(voice.to_string());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Created,
    /// Continuous recognition in progress.
    Active,
    Released,
}

DeriveHandle!(Recognizer);

pub struct Recognizer {
    handle: Handle,
    engine: Arc<dyn RecognitionEngine>,
    kind: RecognizerKind,
    flags: Flags,
    state: State,
    audio: AudioBinding,
    endpoint: Option<Url>,
    props: ConfigurationStore,
    sink: Option<Arc<UnboundedSender<Event>>>,
}

impl Recognizer {
    /// Wrap a native recognizer. On error the native handle is released.
    pub(crate) fn new(
        handle: Handle,
        engine: Arc<dyn RecognitionEngine>,
        kind: RecognizerKind,
        audio: AudioBinding,
        language: Option<String>,
        endpoint: Option<Url>,
    ) -> Result<Self> {
        let flags = Flags::Recognized | Flags::Canceled | kind.flag();
        let reco = Recognizer {
            handle,
            engine,
            kind,
            flags,
            state: State::Created,
            audio,
            endpoint,
            props: ConfigurationStore::new("Recognizer"),
            sink: None,
        };
        reco.store_parameters(language.as_deref())?;
        log::debug!("Recognizer({}) is created with {:?}", handle, reco.audio);
        Ok(reco)
    }

    fn store_parameters(&self, language: Option<&str>) -> Result {
        if let Some(language) = language {
            self.put_by_id(PropertyId::RecoLanguage, language)?;
        }
        if let RecognizerKind::Translation(tr) = &self.kind {
            self.put_by_id(PropertyId::TranslationFromLanguage, &tr.source_language)?;
            self.put_by_id(
                PropertyId::TranslationToLanguages,
                &tr.target_languages.join(","),
            )?;
            if let Some(voice) = &tr.voice {
                self.put_by_id(PropertyId::TranslationVoice, voice)?;
            }
        }
        if let Some(endpoint) = &self.endpoint {
            self.put_by_id(PropertyId::EffectiveEndpoint, endpoint.as_str())?;
        }
        Ok(())
    }

    fn ensure_alive(&self) -> Result {
        if self.state == State::Released {
            Err(UseAfterDispose("Recognizer"))
        } else {
            Ok(())
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn kind(&self) -> &RecognizerKind {
        &self.kind
    }

    pub fn flags(&self) -> Flags {
        self.flags
    }

    pub fn audio_source(&self) -> Result<&AudioSource> {
        self.ensure_alive()?;
        Ok(self.audio.source())
    }

    /// Whether the recognizer releases its audio source itself.
    pub fn owns_audio(&self) -> bool {
        self.audio.is_owned()
    }

    /// `None` when the engine picks the endpoint.
    pub fn endpoint(&self) -> Result<Option<&Url>> {
        self.ensure_alive()?;
        Ok(self.endpoint.as_ref())
    }

    pub fn target_languages(&self) -> Result<&[String]> {
        self.ensure_alive()?;
        match &self.kind {
            RecognizerKind::Translation(tr) => Ok(tr.target_languages.as_slice()),
            _ => Ok(&[][..]),
        }
    }

    DefineProperty!(language, PropertyId::RecoLanguage);
    DefineProperty!(source_language, PropertyId::TranslationFromLanguage);
    DefineProperty!(voice, PropertyId::TranslationVoice);

    pub fn properties(&self) -> &ConfigurationStore {
        &self.props
    }

    pub fn started(&self) -> bool {
        self.state == State::Active
    }

    /// Blocked mode for once recognition. Yields the terminal event,
    /// a cancellation included.
    pub fn recognize_once(&self) -> Result<Event> {
        self.ensure_alive()?;
        if self.started() {
            return Err(AlreadyExists);
        }
        let native = self.engine.recognize_once(self.handle)?;
        Event::from_native(self.flags, native)
    }

    pub fn start(&mut self) -> Result<EventStream> {
        self.start_flags(Flags::empty())
    }

    /// Start continuous recognition, delivering the events in `flags` on
    /// top of the recognizer's own.
    pub fn start_flags(&mut self, flags: Flags) -> Result<EventStream> {
        self.ensure_alive()?;
        if self.started() {
            return Err(AlreadyExists);
        }

        let flags = self.flags | flags;
        let (s, r) = unbounded::<Event>();
        let sender = Arc::new(s);
        let sink = EventSink::new(Arc::downgrade(&sender), self.kind.flag());
        self.engine.start_continuous(self.handle, sink)?;

        self.sink = Some(sender);
        self.state = State::Active;
        log::debug!("Recognizer({}) is started with {:?}", self.handle, flags);
        Ok(EventStream::new(r, flags))
    }

    pub fn stop(&mut self) -> Result {
        self.ensure_alive()?;
        if !self.started() {
            return Ok(());
        }
        let stopped = self.engine.stop_continuous(self.handle);
        self.sink = None;
        self.state = State::Created;
        log::debug!("Recognizer({}) is stopped", self.handle);
        stopped
    }

    /// Close the parameter store, then release the native recognizer and
    /// the audio it owns. Calling it again is a no-op.
    pub fn release(&mut self) -> Result {
        if self.state == State::Released {
            return Ok(());
        }
        if self.started() {
            log::warn!(
                "Recognizer({}) is released while recognition is in progress",
                self.handle
            );
        }
        self.state = State::Released;
        self.sink = None;

        let props = self.props.close();
        let reco = self.engine.recognizer_release(self.handle);
        log::trace!("Recognizer({}) is released", self.handle);
        let audio = self.audio.release();
        props.and(reco).and(audio)
    }

    pub fn is_released(&self) -> bool {
        self.state == State::Released
    }
}

FlattenProps!(Recognizer);

/// Entry point for events pushed by the engine, usually from its own
/// callback thread.
#[derive(Clone)]
pub struct EventSink {
    kind: Flags,
    sender: Weak<UnboundedSender<Event>>,
}

impl EventSink {
    fn new(sender: Weak<UnboundedSender<Event>>, kind: Flags) -> Self {
        EventSink { kind, sender }
    }

    /// Translate and forward one native event. Fails without forwarding
    /// anything when the event cannot be translated or the recognizer is
    /// gone.
    pub fn fire(&self, native: NativeEvent) -> Result {
        let evt = Event::from_native(self.kind, native)?;
        let flag = evt.flag();
        log::trace!("Event is fired with {:?}", flag);
        match self.sender.upgrade() {
            Some(sender) => sender.unbounded_send(evt).map_err(|err| {
                log::error!("failed to post {:?} event: {}", flag, err);
                IsNothing
            }),
            None => {
                log::error!("Recognizer instance is dropped!");
                Err(IsNothing)
            }
        }
    }

    pub fn is_connected(&self) -> bool {
        self.sender.strong_count() > 0
    }
}

/// Events of one continuous recognition, ending after `SessionStopped`.
pub struct EventStream {
    filter: Flags,
    source: UnboundedReceiver<Event>,
    stopped: bool,
}

impl EventStream {
    pub fn new(source: UnboundedReceiver<Event>, filter: Flags) -> Self {
        EventStream {
            filter,
            source,
            stopped: false,
        }
    }

    pub fn filter(mut self, flags: Flags) -> Self {
        self.filter = flags;
        self
    }

    pub fn text(self) -> impl Stream<Item = String> {
        self.filter(Flags::Recognized).filter_map(|evt| async move {
            match evt {
                Event::Recognized(reco) => Some(reco.text_only()),
                _ => None,
            }
        })
    }

    pub fn canceled(self) -> impl Stream<Item = RecognitionCanceledEvent> {
        self.filter(Flags::Canceled).filter_map(|evt| async move {
            match evt {
                Event::Canceled(c) => Some(c),
                _ => None,
            }
        })
    }
}

impl Stream for EventStream {
    type Item = Event;

    fn poll_next(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Event>> {
        while !self.stopped {
            match ready!(self.source.poll_next_unpin(cx)) {
                Some(evt) => {
                    if evt.flag().contains(Flags::SessionStopped) {
                        self.stopped = true;
                    }
                    if evt.flag().intersects(self.filter) {
                        return Poll::Ready(Some(evt));
                    }
                }
                None => return Poll::Ready(None),
            }
        }
        Poll::Ready(None)
    }
}
