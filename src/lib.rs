//! Recognizer factory and session lifecycle over a native speech engine.
//!
//! A [`SpeechFactory`](speech::SpeechFactory) resolves credentials, region
//! and endpoint into configured recognizers; each
//! [`Recognizer`](speech::Recognizer) owns its native handle, its parameter
//! store and, for file input, its audio source. Native events are unwrapped
//! into owned types in [`speech::events`].

#[macro_use]
extern crate bitflags;

mod macros;

pub mod engine;
pub mod error;
pub mod properties;
pub mod speech;

pub use engine::{
    initialize_engine, Credential, Handle, RecognitionEngine, SpxHandle,
    INVALID_HANDLE,
};
pub use error::SpxError;
pub type Result<T = (), E = SpxError> = std::result::Result<T, E>;

/// Map a native status code to `Result`, zero being success.
pub fn hr(code: usize) -> Result {
    if code == 0 {
        Ok(())
    } else {
        Err(SpxError::from(code))
    }
}
