//! Effective service endpoint.
//!
//! Query parameters already present in an explicit endpoint are never
//! overwritten. Values coming from discrete settings (language, targets,
//! voice, output format) are only added when the endpoint lacks them.

use super::recognizer::RecognizerKind;
use crate::Result;
use rustc_hash::FxHashSet;
use url::Url;

const DEFAULT_FORMAT: &str = "simple";

#[derive(Debug, Clone, Default)]
pub struct EndpointResolver {
    explicit: Option<Url>,
    region: String,
}

impl EndpointResolver {
    pub fn new<T: ToString>(explicit: Option<Url>, region: T) -> Self {
        EndpointResolver {
            explicit,
            region: region.to_string(),
        }
    }

    /// Recognition language carried by the explicit endpoint: `language`
    /// for speech and intent, `from` for translation. When present it
    /// overrides the language the recognizer was asked for.
    pub fn explicit_language(&self, kind: &RecognizerKind) -> Option<String> {
        let name = match kind {
            RecognizerKind::Translation(_) => "from",
            RecognizerKind::Speech | RecognizerKind::Intent => "language",
        };
        self.explicit
            .as_ref()?
            .query_pairs()
            .find(|(k, v)| k == name && !v.is_empty())
            .map(|(_, v)| v.into_owned())
    }

    /// `None` when neither an endpoint nor a region is known; the engine
    /// then picks its own default.
    pub fn resolve(
        &self,
        kind: &RecognizerKind,
        language: Option<&str>,
    ) -> Result<Option<Url>> {
        let mut url = match &self.explicit {
            Some(url) => url.clone(),
            None if self.region.is_empty() => return Ok(None),
            None => Url::parse(&default_endpoint(kind, &self.region))?,
        };
        merge_query(&mut url, &discrete_params(kind, language));
        Ok(Some(url))
    }
}

/// Default endpoint of the service in `region`.
pub fn default_endpoint(kind: &RecognizerKind, region: &str) -> String {
    match kind {
        RecognizerKind::Translation(_) => format!(
            "wss://{}.s2s.speech.microsoft.com/speech/translation/cognitiveservices/v1",
            region
        ),
        RecognizerKind::Speech | RecognizerKind::Intent => format!(
            "wss://{}.stt.speech.microsoft.com/speech/recognition/interactive/cognitiveservices/v1",
            region
        ),
    }
}

fn discrete_params(
    kind: &RecognizerKind,
    language: Option<&str>,
) -> Vec<(&'static str, String)> {
    let mut params = Vec::new();
    match kind {
        RecognizerKind::Translation(tr) => {
            params.push(("from", tr.source_language.clone()));
            for target in &tr.target_languages {
                params.push(("to", target.clone()));
            }
            if let Some(voice) = &tr.voice {
                params.push(("voice", voice.clone()));
            }
        }
        RecognizerKind::Speech | RecognizerKind::Intent => {
            if let Some(language) = language.filter(|l| !l.is_empty()) {
                params.push(("language", language.to_string()));
            }
        }
    }
    params.push(("format", String::from(DEFAULT_FORMAT)));
    params
}

/// Append every pair whose name the URL does not carry yet.
/// Repeated names (`to`) are appended together, in order.
pub fn merge_query(url: &mut Url, params: &[(&str, String)]) {
    let present: FxHashSet<String> =
        url.query_pairs().map(|(k, _)| k.into_owned()).collect();
    let missing: Vec<_> = params
        .iter()
        .filter(|(k, _)| !present.contains(*k))
        .collect();
    if missing.is_empty() {
        return;
    }
    let mut pairs = url.query_pairs_mut();
    for (k, v) in missing {
        pairs.append_pair(k, v);
    }
}
