//! Factory methods to create recognizers.

use super::{
    audio::{AudioBinding, AudioSourceSpec},
    endpoint::EndpointResolver,
    recognizer::{Recognizer, RecognizerKind},
};
use crate::{
    engine::{initialize_engine, Credential, RecognitionEngine, RecognizerRequest},
    error::*,
    properties::{ConfigurationStore, PropertyBag, PropertyId},
    DefineProperty, DeriveHandle, FlattenProps, Handle, Result, INVALID_HANDLE,
};
use std::sync::Arc;
use url::Url;

DeriveHandle!(SpeechFactory);

/// Entry point resolving credentials, region and endpoint into recognizers.
pub struct SpeechFactory {
    handle: Handle,
    engine: Arc<dyn RecognitionEngine>,
    props: ConfigurationStore,
}

impl SpeechFactory {
    fn new(
        engine: Arc<dyn RecognitionEngine>,
        credential: Credential,
        region: &str,
    ) -> Result<Self> {
        initialize_engine(engine.as_ref())?;
        let handle = engine.create_factory(&credential, region)?;
        if handle == INVALID_HANDLE {
            return Err(EngineError(String::from(
                "engine returned a null factory handle",
            )));
        }
        let factory = SpeechFactory {
            handle,
            engine,
            props: ConfigurationStore::new("SpeechFactory"),
        };
        match &credential {
            Credential::SubscriptionKey(key) => factory.set_subscription_key(key)?,
            Credential::AuthorizationToken(token) => {
                factory.set_authorization_token(token)?
            }
        }
        factory.set_region(region)?;
        log::debug!("SpeechFactory({}) is created", handle);
        Ok(factory)
    }

    /// Authenticate with a subscription key. `region` may be empty.
    pub fn from_subscription(
        engine: Arc<dyn RecognitionEngine>,
        subscription: &str,
        region: &str,
    ) -> Result<Self> {
        Self::new(
            engine,
            Credential::SubscriptionKey(subscription.to_string()),
            region,
        )
    }

    /// Authenticate with an authorization token. The caller keeps the
    /// token valid.
    pub fn from_authorization_token(
        engine: Arc<dyn RecognitionEngine>,
        token: &str,
        region: &str,
    ) -> Result<Self> {
        Self::new(
            engine,
            Credential::AuthorizationToken(token.to_string()),
            region,
        )
    }

    DefineProperty!(
        subscription_key,
        set_subscription_key,
        PropertyId::SubscriptionKey
    );

    DefineProperty!(
        authorization_token,
        set_authorization_token,
        PropertyId::AuthorizationToken
    );

    DefineProperty!(region, set_region, PropertyId::Region);

    /// Explicit service endpoint, if one was set.
    pub fn endpoint(&self) -> Result<Option<Url>> {
        let endpoint = self.get_by_id(PropertyId::Endpoint)?;
        if endpoint.is_empty() {
            Ok(None)
        } else {
            Ok(Some(Url::parse(&endpoint)?))
        }
    }

    /// For non-standard service endpoints. Query parameters in `endpoint`
    /// take precedence over values set any other way, e.g. `language=de-DE`
    /// in the URL beats a recognizer created for "en-US".
    pub fn set_endpoint(&self, endpoint: &Url) -> Result {
        self.put_by_id(PropertyId::Endpoint, endpoint.as_str())
    }

    /// Credential used for new recognizers; a non-empty token wins over the
    /// subscription key.
    pub fn credential(&self) -> Result<Credential> {
        let key = self.subscription_key()?;
        let token = self.authorization_token()?;
        Ok(Credential::resolve(&key, &token))
    }

    pub fn properties(&self) -> &ConfigurationStore {
        &self.props
    }

    /// Create a recognizer of `kind` reading from `audio`.
    ///
    /// Caller-supplied streams are borrowed; the recognizer never releases
    /// them. Language tags are forwarded without validation. A language
    /// pinned in the explicit endpoint wins over the one requested here.
    pub fn create_recognizer(
        &self,
        kind: RecognizerKind,
        audio: AudioSourceSpec,
    ) -> Result<Recognizer> {
        self.ensure_alive()?;
        let language = match &kind {
            RecognizerKind::Translation(tr) => {
                if tr.source_language.is_empty() {
                    return Err(InvalidArgument(String::from(
                        "source language of translation is empty",
                    )));
                }
                if let Some(spoken) = audio.language() {
                    if spoken != tr.source_language {
                        log::warn!(
                            "Audio language {} is ignored, translating from {}",
                            spoken,
                            tr.source_language
                        );
                    }
                }
                Some(tr.source_language.clone())
            }
            RecognizerKind::Speech | RecognizerKind::Intent => {
                audio.language().map(String::from)
            }
        };

        let credential = self.credential()?;
        let region = self.region()?;
        let resolver = EndpointResolver::new(self.endpoint()?, &region);
        let (kind, language) = match resolver.explicit_language(&kind) {
            Some(pinned) => {
                if language.as_deref() != Some(pinned.as_str()) {
                    log::debug!(
                        "Endpoint language {} overrides {:?}",
                        pinned,
                        language
                    );
                }
                (kind.with_source_language(&pinned), Some(pinned))
            }
            None => (kind, language),
        };
        let endpoint = resolver.resolve(&kind, language.as_deref())?;
        let binding = AudioBinding::bind(self.engine.clone(), audio)?;

        let request = RecognizerRequest {
            kind: kind.clone(),
            audio: binding.native(),
            credential,
            region,
            language: language.clone(),
            endpoint: endpoint.clone(),
        };
        let handle = self.engine.create_recognizer(self.handle, &request)?;
        Recognizer::new(handle, self.engine.clone(), kind, binding, language, endpoint)
    }

    fn ensure_alive(&self) -> Result {
        if self.handle == INVALID_HANDLE {
            Err(UseAfterDispose("SpeechFactory"))
        } else {
            Ok(())
        }
    }

    pub fn is_released(&self) -> bool {
        self.handle == INVALID_HANDLE
    }

    /// Close the parameter store, then release the native factory.
    /// Calling it again is a no-op.
    pub fn release(&mut self) -> Result {
        if self.handle == INVALID_HANDLE {
            return Ok(());
        }
        let handle = std::mem::replace(&mut self.handle, INVALID_HANDLE);
        let props = self.props.close();
        let factory = self.engine.factory_release(handle);
        log::trace!("SpeechFactory({}) is released", handle);
        props.and(factory)
    }
}

FlattenProps!(SpeechFactory);
