//! Decoder collaborators.
//!
//! The actual matrix and linear decoding algorithms live outside this
//! crate. The scanner only sees two seams:
//!
//! - [`MatrixDecoder`] runs synchronously on the grayscale frame.
//! - [`LinearDecoder`] is asynchronous. Each request carries a
//!   [`LinearReply`]; the decoder answers whenever it is done, possibly
//!   several ticks later, possibly never. Answers land in a
//!   [`LinearInbox`] that the session drains at the start of a later tick.

mod reply;
mod scripted;

pub use reply::{LinearInbox, LinearReply, LinearResult};
pub use scripted::{DeferredLinear, ForwardingLinear, LinearRequest, ScriptedMatrix};

use crate::capture::Frame;

/// Synchronous 2-D matrix code decoder.
pub trait MatrixDecoder {
    /// Decodes the grayscale frame. `None` means no code this frame.
    fn decode(&mut self, frame: &Frame) -> Option<String>;
}

/// Asynchronous 1-D barcode decoder.
pub trait LinearDecoder {
    /// Starts decoding the lower-half sub-frame.
    ///
    /// The result must be sent through `reply`, never returned inline.
    fn request(&mut self, subframe: Frame, reply: LinearReply);

    /// Releases reader resources. Outstanding requests may still answer;
    /// the session discards those answers.
    fn reset(&mut self) {}
}
