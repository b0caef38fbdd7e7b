//! Decoders driven by scripts or by an outside worker.
//!
//! These stand in for real image decoders in the demo binary and in
//! tests. They ignore pixel content.

use super::{LinearDecoder, LinearReply, MatrixDecoder};
use crate::capture::Frame;
use std::collections::VecDeque;
use std::sync::mpsc::Sender;

/// Matrix decoder that returns one scripted entry per frame.
///
/// Once the script runs out every frame decodes to nothing.
#[derive(Debug, Default, Clone)]
pub struct ScriptedMatrix {
    script: VecDeque<Option<String>>,
}

impl ScriptedMatrix {
    /// Creates a decoder that answers frame `n` with entry `n`.
    pub fn new(script: impl IntoIterator<Item = Option<String>>) -> Self {
        Self {
            script: script.into_iter().collect(),
        }
    }

    /// Entries not yet consumed.
    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl MatrixDecoder for ScriptedMatrix {
    fn decode(&mut self, _frame: &Frame) -> Option<String> {
        self.script.pop_front().flatten()
    }
}

struct InFlight {
    due: u64,
    reply: LinearReply,
    value: Option<String>,
}

/// Linear decoder that answers each scripted entry `latency` requests
/// after it was asked.
///
/// With a latency of zero the answer is sent during the request itself,
/// which the session still only sees on its next tick.
pub struct DeferredLinear {
    script: VecDeque<Option<String>>,
    latency: u64,
    requests: u64,
    in_flight: VecDeque<InFlight>,
}

impl DeferredLinear {
    /// Creates a decoder that answers request `n` with entry `n`,
    /// `latency` requests later.
    pub fn new(script: impl IntoIterator<Item = Option<String>>, latency: u64) -> Self {
        Self {
            script: script.into_iter().collect(),
            latency,
            requests: 0,
            in_flight: VecDeque::new(),
        }
    }

    /// Requests still waiting for their answer.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }
}

impl LinearDecoder for DeferredLinear {
    fn request(&mut self, _subframe: Frame, reply: LinearReply) {
        let value = self.script.pop_front().flatten();
        self.in_flight.push_back(InFlight {
            due: self.requests + self.latency,
            reply,
            value,
        });

        while self
            .in_flight
            .front()
            .is_some_and(|job| job.due <= self.requests)
        {
            if let Some(job) = self.in_flight.pop_front() {
                job.reply.deliver(job.value);
            }
        }

        self.requests += 1;
    }

    fn reset(&mut self) {
        if !self.in_flight.is_empty() {
            tracing::debug!(abandoned = self.in_flight.len(), "Linear decoder reset");
        }
        self.in_flight.clear();
    }
}

/// A linear decode job handed to an outside worker.
#[derive(Debug)]
pub struct LinearRequest {
    /// Lower half of the frame, full colour.
    pub subframe: Frame,
    /// Where the answer goes.
    pub reply: LinearReply,
}

/// Linear decoder that forwards every request over a channel.
///
/// The receiving side (a worker thread, or a test) answers through
/// [`LinearRequest::reply`] in its own time. Resetting does not recall
/// requests already sent.
#[derive(Debug, Clone)]
pub struct ForwardingLinear {
    tx: Sender<LinearRequest>,
}

impl ForwardingLinear {
    /// Forwards requests into `tx`.
    pub fn new(tx: Sender<LinearRequest>) -> Self {
        Self { tx }
    }
}

impl LinearDecoder for ForwardingLinear {
    fn request(&mut self, subframe: Frame, reply: LinearReply) {
        if self.tx.send(LinearRequest { subframe, reply }).is_err() {
            tracing::trace!("Linear worker gone; request dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::LinearInbox;

    fn frame() -> Frame {
        Frame::new(vec![0u8; 4], 1, 1, 1)
    }

    #[test]
    fn test_scripted_matrix_runs_out() {
        let mut decoder = ScriptedMatrix::new([Some("a".to_string()), None]);

        assert_eq!(decoder.decode(&frame()).as_deref(), Some("a"));
        assert_eq!(decoder.decode(&frame()), None);
        assert_eq!(decoder.decode(&frame()), None);
        assert_eq!(decoder.remaining(), 0);
    }

    #[test]
    fn test_deferred_latency() {
        let inbox = LinearInbox::new();
        let mut decoder =
            DeferredLinear::new([Some("x".to_string()), Some("y".to_string())], 2);

        decoder.request(frame(), inbox.reply());
        decoder.request(frame(), inbox.reply());
        assert!(inbox.next().is_none());
        assert_eq!(decoder.in_flight(), 2);

        decoder.request(frame(), inbox.reply());
        assert_eq!(inbox.next().unwrap().value.as_deref(), Some("x"));
        assert!(inbox.next().is_none());
    }

    #[test]
    fn test_zero_latency_delivers_during_request() {
        let inbox = LinearInbox::new();
        let mut decoder = DeferredLinear::new([Some("x".to_string())], 0);

        decoder.request(frame(), inbox.reply());
        assert_eq!(inbox.next().unwrap().value.as_deref(), Some("x"));
    }

    #[test]
    fn test_reset_abandons_in_flight() {
        let inbox = LinearInbox::new();
        let mut decoder = DeferredLinear::new([Some("x".to_string())], 5);

        decoder.request(frame(), inbox.reply());
        decoder.reset();
        assert_eq!(decoder.in_flight(), 0);
        assert!(inbox.next().is_none());
    }
}
