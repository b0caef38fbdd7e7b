//! Payload cipher.
//!
//! Turns a fused matrix/linear pair back into the secret it carries, and
//! provides the matching sealing operation used to produce payloads.

mod codec;
mod payload;

pub use codec::{
    decrypt, decrypt_payload, derive_key, seal, DecryptError, SealError, KEY_LEN,
    MIN_SECRET_LEN, PBKDF2_ROUNDS,
};
pub use payload::{
    HybridPayload, PayloadPair, Salt, SealedPayload, BLOCK_LEN, PAYLOAD_SEPARATOR, SALT_LEN,
};
