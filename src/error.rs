use failure::Fail;
use serde_json::Error as JsonError;
use url::ParseError as UrlError;

#[derive(Fail, Debug)]
pub enum SpxError {
    #[fail(display = "invalid argument: {}", _0)]
    InvalidArgument(String),
    #[fail(display = "{} is used after it was released", _0)]
    UseAfterDispose(&'static str),
    #[fail(display = "invariant violated: {}", _0)]
    InvariantViolation(String),
    #[fail(display = "speech engine error: {}", _0)]
    EngineError(String),
    #[fail(display = "speech API return error code: {}", _0)]
    ApiError(usize),
    #[fail(display = "failed to parse as JSON format: {}", _0)]
    ParseJson(JsonError),
    #[fail(display = "an entity already exists")]
    AlreadyExists,
    #[fail(display = "mutex lock is poisoned")]
    Poisoned,
    #[fail(display = "nothing is there")]
    IsNothing,
    #[fail(display = "method is unimplemented")]
    Unimplemented,
}

pub use SpxError::*;

impl From<usize> for SpxError {
    fn from(code: usize) -> Self {
        assert!(code != 0);
        SpxError::ApiError(code)
    }
}

impl From<JsonError> for SpxError {
    fn from(err: JsonError) -> Self {
        SpxError::ParseJson(err)
    }
}

impl From<UrlError> for SpxError {
    fn from(err: UrlError) -> Self {
        SpxError::InvalidArgument(format!("malformed endpoint: {}", err))
    }
}

impl<T> From<std::sync::PoisonError<T>> for SpxError {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        SpxError::Poisoned
    }
}
