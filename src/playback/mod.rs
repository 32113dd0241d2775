//! Playback schedulers and the speech boundary they drive.
//!
//! Both schedulers are plain state machines over an injected clock: the host
//! passes `Instant`s in, so a scheduler can never own more than one timer and
//! a repeated `start()` is a no-op.

pub mod flash;
pub mod scroll;
pub mod speech;

pub use flash::FlashScheduler;
pub use scroll::ScrollScheduler;
pub use speech::{CommandSpeech, SilentSpeech, Speech, Utterance, Voice};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayState {
    Stopped,
    Playing,
}
