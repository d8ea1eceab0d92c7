//! Events and results.

#![allow(non_upper_case_globals)]

use crate::{
    engine::{NativeCancellationDetails, NativeEvent, NativeResult},
    error::*,
    Result,
};
use serde::{Serialize, Serializer};
use serde_json::{self, json, Value};
use std::{fmt, time::Duration};

/// Bitmask for event kinds and recognizer kinds.
bitflags! {
    #[derive(Default)]
    pub struct Flags: u64 {
        const SessionStarted = 0b0001;
        const SessionStopped = 0b0010;
        const Session = 0b0011;
        const Recognizing = 0b0100;
        const Recognized = 0b1000;
        const Recognition = 0b1100;
        const Speech = 0b0001_0000;
        const Intent = 0b0010_0000;
        const Translation = 0b0100_0000;
        const Kind = 0b0111_0000;
        const Canceled = 0b0001_0000_0000;
    }
}

/// Make output more readable.
impl Serialize for Flags {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let display = format!("{:?}", self);
        serializer.serialize_str(&display)
    }
}

/// For stringify output.
pub trait ToJson
where
    Self: Serialize + Sized,
{
    fn to_json(self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Why a recognition session was canceled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CancellationReason {
    Error,
    EndOfStream,
}

impl CancellationReason {
    const NATIVE_ORDER: [CancellationReason; 2] =
        [CancellationReason::Error, CancellationReason::EndOfStream];

    /// Native reason codes start at 1, so the code is shifted down by one
    /// before indexing. Anything outside `1..=2` is rejected.
    pub fn from_native(code: i32) -> Result<Self> {
        code.checked_sub(1)
            .filter(|index| *index >= 0)
            .and_then(|index| Self::NATIVE_ORDER.get(index as usize).copied())
            .ok_or_else(|| {
                log::error!("Native cancellation reason {} is out of range", code);
                InvariantViolation(format!(
                    "native cancellation reason {} is out of range",
                    code
                ))
            })
    }
}

impl fmt::Display for CancellationReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CancellationReason::Error => f.write_str("Error"),
            CancellationReason::EndOfStream => f.write_str("EndOfStream"),
        }
    }
}

/// Reason and error text of a canceled session, fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CancellationEvent {
    reason: CancellationReason,
    error_details: String,
}

impl CancellationEvent {
    /// Read the native snapshot once.
    pub fn from_native(details: &dyn NativeCancellationDetails) -> Result<Self> {
        let reason = CancellationReason::from_native(details.reason())?;
        Ok(CancellationEvent {
            reason,
            error_details: details.error_details(),
        })
    }

    pub fn reason(&self) -> CancellationReason {
        self.reason
    }

    /// Only filled out when the reason is `Error`.
    pub fn error_details(&self) -> &str {
        &self.error_details
    }
}

impl ToJson for CancellationEvent {}

/// Payload of a recognition-canceled notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecognitionCanceledEvent {
    session_id: String,
    result_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    intent_id: Option<String>,
    cancellation: CancellationEvent,
}

impl RecognitionCanceledEvent {
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn result_id(&self) -> &str {
        &self.result_id
    }

    /// Set for intent recognizers only.
    pub fn intent_id(&self) -> Option<&str> {
        self.intent_id.as_deref()
    }

    pub fn cancellation(&self) -> &CancellationEvent {
        &self.cancellation
    }

    pub fn reason(&self) -> CancellationReason {
        self.cancellation.reason()
    }

    pub fn error_details(&self) -> &str {
        self.cancellation.error_details()
    }
}

impl fmt::Display for RecognitionCanceledEvent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "SessionId:{} ResultId:{}", self.session_id, self.result_id)?;
        if let Some(intent_id) = &self.intent_id {
            write!(f, " IntentId:{}", intent_id)?;
        }
        write!(
            f,
            " CancellationReason:{} ErrorDetails:<{}>.",
            self.cancellation.reason, self.cancellation.error_details
        )
    }
}

impl ToJson for RecognitionCanceledEvent {}

/// Output of recognition
#[derive(Debug, Default, Clone, Serialize)]
pub struct Recognition {
    pub flag: Flags,
    pub session: String,
    pub id: String,
    pub text: String,
    pub offset: Duration,
    pub duration: Duration,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translations: Option<Value>,
}

impl Recognition {
    fn from_native(flag: Flags, result: NativeResult) -> Self {
        let intent = if flag.contains(Flags::Intent) {
            result.intent_id.filter(|id| !id.is_empty())
        } else {
            None
        };
        let translations = if result.translations.is_empty() {
            None
        } else {
            let mut tbl = json!({});
            for (lang, text) in result.translations {
                tbl[lang] = json!(text);
            }
            Some(tbl)
        };
        Recognition {
            flag,
            session: result.session_id,
            id: result.result_id,
            text: result.text,
            offset: from_ticks(result.offset),
            duration: from_ticks(result.duration),
            intent,
            translations,
        }
    }

    /// Get only the speech recognition text.
    pub fn text_only(self) -> String {
        self.text
    }
}

impl ToJson for Recognition {}

/// Session boundary notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionEvent {
    pub session_id: String,
}

/// Event unwrapped from the engine.
#[derive(Debug, Clone, Serialize)]
pub enum Event {
    SessionStarted(SessionEvent),
    SessionStopped(SessionEvent),
    Recognizing(Recognition),
    Recognized(Recognition),
    Canceled(RecognitionCanceledEvent),
}

impl Event {
    /// Translate a native event for a recognizer of the given kind.
    /// Runs on the engine's callback thread; it does no I/O.
    pub fn from_native(kind: Flags, native: NativeEvent) -> Result<Self> {
        let kind = kind & Flags::Kind;
        let evt = match native {
            NativeEvent::SessionStarted { session_id } => {
                Event::SessionStarted(SessionEvent { session_id })
            }
            NativeEvent::SessionStopped { session_id } => {
                Event::SessionStopped(SessionEvent { session_id })
            }
            NativeEvent::Recognizing(result) => Event::Recognizing(
                Recognition::from_native(kind | Flags::Recognizing, result),
            ),
            NativeEvent::Recognized(result) => Event::Recognized(
                Recognition::from_native(kind | Flags::Recognized, result),
            ),
            NativeEvent::Canceled {
                session_id,
                result_id,
                intent_id,
                details,
            } => {
                let cancellation = CancellationEvent::from_native(details.as_ref())?;
                let intent_id = if kind.contains(Flags::Intent) {
                    Some(intent_id.unwrap_or_default())
                } else {
                    None
                };
                Event::Canceled(RecognitionCanceledEvent {
                    session_id,
                    result_id,
                    intent_id,
                    cancellation,
                })
            }
        };
        Ok(evt)
    }

    /// One bit flag of the event kind.
    pub fn flag(&self) -> Flags {
        match self {
            Event::SessionStarted(_) => Flags::SessionStarted,
            Event::SessionStopped(_) => Flags::SessionStopped,
            Event::Recognizing(_) => Flags::Recognizing,
            Event::Recognized(_) => Flags::Recognized,
            Event::Canceled(_) => Flags::Canceled,
        }
    }

    pub fn session_id(&self) -> &str {
        match self {
            Event::SessionStarted(e) | Event::SessionStopped(e) => &e.session_id,
            Event::Recognizing(r) | Event::Recognized(r) => &r.session,
            Event::Canceled(c) => c.session_id(),
        }
    }
}

impl ToJson for Event {}

/// A single tick represents one hundred nanoseconds.
fn from_ticks(ticks: u64) -> Duration {
    Duration::from_nanos(ticks.saturating_mul(100))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::CancellationDetails;

    fn details(reason: i32, text: &str) -> CancellationDetails {
        CancellationDetails {
            reason,
            error_details: text.to_string(),
        }
    }

    #[test]
    fn native_codes_shift_down_by_one() {
        assert_eq!(
            CancellationReason::from_native(1).unwrap(),
            CancellationReason::Error
        );
        assert_eq!(
            CancellationReason::from_native(2).unwrap(),
            CancellationReason::EndOfStream
        );
    }

    #[test]
    fn out_of_range_codes_fail_fast() {
        for code in &[0, 3, -1, 42, i32::MIN, i32::MAX] {
            match CancellationReason::from_native(*code) {
                Err(InvariantViolation(msg)) => {
                    assert!(msg.contains(&code.to_string()))
                }
                other => panic!("code {} gave {:?}", code, other),
            }
        }
    }

    #[test]
    fn event_copies_details_verbatim() {
        let evt =
            CancellationEvent::from_native(&details(1, "  WebSocket 1006 ")).unwrap();
        assert_eq!(evt.reason(), CancellationReason::Error);
        assert_eq!(evt.error_details(), "  WebSocket 1006 ");

        let evt = CancellationEvent::from_native(&details(2, "")).unwrap();
        assert_eq!(evt.reason(), CancellationReason::EndOfStream);
        assert_eq!(evt.error_details(), "");
    }

    #[test]
    fn no_event_for_bad_code() {
        assert!(CancellationEvent::from_native(&details(0, "boom")).is_err());
    }

    #[test]
    fn canceled_carries_intent_id_for_intent_only() {
        let native = || NativeEvent::Canceled {
            session_id: "s1".into(),
            result_id: "r1".into(),
            intent_id: Some("play".into()),
            details: Box::new(details(1, "timeout")),
        };

        match Event::from_native(Flags::Intent, native()).unwrap() {
            Event::Canceled(c) => {
                assert_eq!(c.intent_id(), Some("play"));
                assert_eq!(
                    c.to_string(),
                    "SessionId:s1 ResultId:r1 IntentId:play CancellationReason:Error ErrorDetails:<timeout>."
                );
            }
            other => panic!("unexpected {:?}", other),
        }

        match Event::from_native(Flags::Speech, native()).unwrap() {
            Event::Canceled(c) => {
                assert_eq!(c.intent_id(), None);
                assert_eq!(c.reason(), CancellationReason::Error);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn recognized_result_keeps_translations_and_ticks() {
        let native = NativeEvent::Recognized(NativeResult {
            session_id: "s".into(),
            result_id: "r".into(),
            text: "hello".into(),
            translations: vec![
                ("de-DE".into(), "hallo".into()),
                ("fr-FR".into(), "bonjour".into()),
            ],
            offset: 10_000_000,
            duration: 5,
            ..Default::default()
        });
        let evt = Event::from_native(Flags::Translation | Flags::Canceled, native)
            .unwrap();
        assert_eq!(evt.flag(), Flags::Recognized);
        assert_eq!(evt.session_id(), "s");
        match evt {
            Event::Recognized(r) => {
                assert_eq!(r.flag, Flags::Translation | Flags::Recognized);
                assert_eq!(r.offset, Duration::from_secs(1));
                assert_eq!(r.duration, Duration::from_nanos(500));
                let tr = r.translations.unwrap();
                assert_eq!(tr["de-DE"], "hallo");
                assert_eq!(tr["fr-FR"], "bonjour");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn huge_ticks_saturate() {
        assert_eq!(from_ticks(u64::MAX), Duration::from_nanos(u64::MAX));
        assert_eq!(from_ticks(3), Duration::from_nanos(300));
    }

    #[test]
    fn cancellation_serializes() {
        let evt = CancellationEvent::from_native(&details(2, "")).unwrap();
        let js = evt.to_json().unwrap();
        assert_eq!(js["reason"], "EndOfStream");
        assert_eq!(js["error_details"], "");
    }
}
