//! Per-channel readings.

/// Which optical code a reading came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// 2-D matrix code decoded from the whole frame.
    Matrix,
    /// 1-D linear barcode decoded from the lower half of the frame.
    Linear,
}

/// A stored value from one channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelReading {
    /// Source channel.
    pub channel: Channel,
    /// Decoded payload text.
    pub value: String,
    /// Fusion tick at which the value was stored.
    pub observed_at: u64,
}

/// Both channels' values, combined for one decrypt attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FusedPair {
    /// Matrix payload: salt and ciphertext part A.
    pub matrix: String,
    /// Linear payload: ciphertext part B.
    pub linear: String,
}

impl FusedPair {
    /// Returns the pair of `matrix` and `linear`.
    pub fn new(matrix: impl Into<String>, linear: impl Into<String>) -> Self {
        Self {
            matrix: matrix.into(),
            linear: linear.into(),
        }
    }

    /// `matrix|linear`, the identity used for duplicate suppression.
    pub fn key(&self) -> String {
        pair_key(&self.matrix, &self.linear)
    }

    /// Short BLAKE3 fingerprint of [`key`](Self::key), safe to log.
    pub fn fingerprint(&self) -> String {
        hex::encode(&blake3::hash(self.key().as_bytes()).as_bytes()[..6])
    }
}

pub(crate) fn pair_key(matrix: &str, linear: &str) -> String {
    let mut key = String::with_capacity(matrix.len() + linear.len() + 1);
    key.push_str(matrix);
    key.push('|');
    key.push_str(linear);
    key
}
