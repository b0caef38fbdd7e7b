//! Pairing of asynchronous channel readings.
//!
//! The two decoders resolve at different, unpredictable times. Each
//! channel's latest value is stored independently; a pair exists once both
//! slots are filled. The key of the last pair handed out is remembered the
//! moment it is handed out, before anyone tries to decrypt it, so the same
//! literal pair is never submitted twice in a row whatever the decrypt
//! outcome.

use super::reading::{pair_key, Channel, ChannelReading, FusedPair};

/// Tracks the pending pair and the last submitted pair key.
#[derive(Debug, Default)]
pub struct PairFusion {
    matrix: Option<ChannelReading>,
    linear: Option<ChannelReading>,
    last_processed: Option<String>,
    ticks: u64,
}

impl PairFusion {
    /// Creates fusion state with both slots empty.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one tick's worth of decoder output.
    ///
    /// Returns the pair when both channels hold a value and that pair
    /// differs from the last one returned. Empty strings count as no
    /// reading. Linear values are trimmed before storage.
    pub fn tick(&mut self, matrix: Option<&str>, linear: Option<&str>) -> Option<FusedPair> {
        self.ticks += 1;

        if let Some(value) = matrix {
            self.observe(Channel::Matrix, value);
        }
        if let Some(value) = linear {
            self.observe(Channel::Linear, value);
        }

        let matrix = self.matrix.as_ref()?;
        let linear = self.linear.as_ref()?;

        let key = pair_key(&matrix.value, &linear.value);
        if self.last_processed.as_deref() == Some(key.as_str()) {
            return None;
        }

        let pair = FusedPair::new(matrix.value.clone(), linear.value.clone());
        self.last_processed = Some(key);
        Some(pair)
    }

    /// Stores `value` for `channel` if it is new. Returns true when stored.
    pub fn observe(&mut self, channel: Channel, value: &str) -> bool {
        let value = match channel {
            Channel::Matrix => value,
            Channel::Linear => value.trim(),
        };
        if value.is_empty() {
            return false;
        }

        let slot = match channel {
            Channel::Matrix => &mut self.matrix,
            Channel::Linear => &mut self.linear,
        };
        if slot.as_ref().is_some_and(|r| r.value == value) {
            return false;
        }

        *slot = Some(ChannelReading {
            channel,
            value: value.to_string(),
            observed_at: self.ticks,
        });
        true
    }

    /// Drops both stored values and the last submitted key.
    pub fn clear(&mut self) {
        self.matrix = None;
        self.linear = None;
        self.last_processed = None;
    }

    /// The stored reading for `channel`, if any.
    pub fn pending(&self, channel: Channel) -> Option<&ChannelReading> {
        match channel {
            Channel::Matrix => self.matrix.as_ref(),
            Channel::Linear => self.linear.as_ref(),
        }
    }

    /// Key of the last pair returned by [`tick`](Self::tick).
    pub fn last_processed(&self) -> Option<&str> {
        self.last_processed.as_deref()
    }

    /// Number of ticks fed so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}
