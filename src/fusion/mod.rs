//! Fusion of the matrix and linear channels into decryptable pairs.

mod pair;
mod reading;

pub use pair::PairFusion;
pub use reading::{Channel, ChannelReading, FusedPair};
