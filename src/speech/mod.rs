//! Recognition, intent analysis, translation of speech.

pub mod audio;
pub mod endpoint;
pub mod events;
pub mod factory;
pub mod recognizer;

pub use audio::*;
pub use endpoint::*;
pub use events::*;
pub use factory::*;
pub use recognizer::*;
