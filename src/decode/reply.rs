//! Result channel for asynchronous linear decodes.

use std::sync::mpsc::{self, Receiver, Sender};

/// A finished linear decode, tagged with the session epoch it was
/// requested in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinearResult {
    /// Epoch of the request this answers.
    pub epoch: u64,
    /// Decoded payload, `None` when nothing was read.
    pub value: Option<String>,
}

/// Return address for one linear decode request.
#[derive(Debug, Clone)]
pub struct LinearReply {
    epoch: u64,
    tx: Sender<LinearResult>,
}

impl LinearReply {
    /// Sends the decode outcome. `None` is a failed or empty decode.
    pub fn deliver(self, value: Option<String>) {
        let _ = self.tx.send(LinearResult {
            epoch: self.epoch,
            value,
        });
    }

    /// Returns the epoch the request was made in.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}

/// Session-side end of the linear result channel.
///
/// The epoch advances every time the session stops, so results requested
/// in an earlier session can be told apart from current ones.
#[derive(Debug)]
pub struct LinearInbox {
    tx: Sender<LinearResult>,
    rx: Receiver<LinearResult>,
    epoch: u64,
}

impl LinearInbox {
    /// Creates an empty inbox at epoch 0.
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self { tx, rx, epoch: 0 }
    }

    /// A reply handle for a request made now.
    pub fn reply(&self) -> LinearReply {
        LinearReply {
            epoch: self.epoch,
            tx: self.tx.clone(),
        }
    }

    /// Returns the current epoch.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Invalidates every outstanding reply.
    pub fn advance_epoch(&mut self) {
        self.epoch += 1;
    }

    /// Next delivered result of any epoch, without blocking.
    pub fn next(&self) -> Option<LinearResult> {
        self.rx.try_recv().ok()
    }
}

impl Default for LinearInbox {
    fn default() -> Self {
        Self::new()
    }
}
