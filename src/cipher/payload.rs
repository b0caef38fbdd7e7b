//! Wire format of the two optical payloads.
//!
//! ```text
//! matrix code:  <hex-salt>|<base64 ciphertext, part A>
//! linear code:  <base64 ciphertext, part B>
//! ```
//!
//! The full ciphertext is part A immediately followed by part B. Neither
//! channel alone carries a decryptable ciphertext.

use super::DecryptError;
use base64::{
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine as _,
};
use rand_core::{CryptoRng, RngCore};

/// Salt length in bytes. Equal to the AES block size because the salt
/// doubles as the CBC initialization vector.
pub const SALT_LEN: usize = 16;

/// AES block size in bytes.
pub const BLOCK_LEN: usize = 16;

/// Separator between salt and ciphertext part A in the matrix payload.
pub const PAYLOAD_SEPARATOR: char = '|';

/// Standard alphabet; accepts input with or without `=` padding.
pub(crate) const BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Per-payload salt, reused as the CBC IV.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Salt([u8; SALT_LEN]);

impl Salt {
    /// Returns a salt holding `bytes`.
    pub fn from_bytes(bytes: [u8; SALT_LEN]) -> Self {
        Self(bytes)
    }

    /// Draws a fresh salt from the given generator.
    pub fn random<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let mut bytes = [0u8; SALT_LEN];
        rng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Parses the hex text carried in the matrix payload.
    pub fn from_hex(text: &str) -> Result<Self, DecryptError> {
        let bytes = hex::decode(text)
            .map_err(|e| DecryptError::MalformedPayload(format!("salt is not hex: {}", e)))?;
        let bytes: [u8; SALT_LEN] = bytes.try_into().map_err(|b: Vec<u8>| {
            DecryptError::MalformedPayload(format!(
                "salt is {} bytes, expected {}",
                b.len(),
                SALT_LEN
            ))
        })?;
        Ok(Self(bytes))
    }

    /// Returns the raw salt, which is also the IV.
    #[inline]
    pub fn as_bytes(&self) -> &[u8; SALT_LEN] {
        &self.0
    }

    /// Lowercase hex, as written into the matrix payload.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl std::fmt::Debug for Salt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Salt({})", self.to_hex())
    }
}

/// A parsed matrix/linear pair, ready for decryption.
#[derive(Debug, Clone)]
pub struct HybridPayload {
    salt: Salt,
    ciphertext: Vec<u8>,
}

impl HybridPayload {
    /// Reassembles the ciphertext from both channels.
    pub fn parse(matrix: &str, linear: &str) -> Result<Self, DecryptError> {
        let mut parts = matrix.split(PAYLOAD_SEPARATOR);
        let (salt_hex, part_a) = match (parts.next(), parts.next(), parts.next()) {
            (Some(salt), Some(part_a), None) => (salt, part_a),
            _ => {
                return Err(DecryptError::MalformedPayload(format!(
                    "matrix payload must contain exactly one '{}'",
                    PAYLOAD_SEPARATOR
                )))
            }
        };

        let salt = Salt::from_hex(salt_hex)?;

        let mut encoded = String::with_capacity(part_a.len() + linear.len());
        encoded.push_str(part_a);
        encoded.push_str(linear);

        let ciphertext = BASE64.decode(encoded.as_bytes()).map_err(|e| {
            DecryptError::MalformedPayload(format!("ciphertext is not base64: {}", e))
        })?;

        if ciphertext.is_empty() || ciphertext.len() % BLOCK_LEN != 0 {
            return Err(DecryptError::MalformedPayload(format!(
                "ciphertext length {} is not a positive multiple of {}",
                ciphertext.len(),
                BLOCK_LEN
            )));
        }

        Ok(Self { salt, ciphertext })
    }

    /// Returns the parsed salt.
    #[inline]
    pub fn salt(&self) -> &Salt {
        &self.salt
    }

    /// Returns the reassembled ciphertext bytes.
    #[inline]
    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }
}

/// Producer-side output of [`super::seal`]: salt plus the whole
/// base64 ciphertext, before it is split across the two codes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedPayload {
    salt: Salt,
    ciphertext_b64: String,
}

impl SealedPayload {
    pub(crate) fn new(salt: Salt, ciphertext_b64: String) -> Self {
        Self {
            salt,
            ciphertext_b64,
        }
    }

    /// Returns the salt the payload was sealed with.
    #[inline]
    pub fn salt(&self) -> &Salt {
        &self.salt
    }

    /// The complete base64 ciphertext.
    #[inline]
    pub fn ciphertext_b64(&self) -> &str {
        &self.ciphertext_b64
    }

    /// Splits into the matrix and linear payloads at byte offset `at` of
    /// the base64 ciphertext.
    ///
    /// Both halves must be non-empty, so `at` must lie in
    /// `1..ciphertext_b64().len()`.
    pub fn split(&self, at: usize) -> Option<PayloadPair> {
        if at == 0 || at >= self.ciphertext_b64.len() {
            return None;
        }
        let (part_a, part_b) = self.ciphertext_b64.split_at(at);
        Some(PayloadPair {
            matrix: format!("{}{}{}", self.salt.to_hex(), PAYLOAD_SEPARATOR, part_a),
            linear: part_b.to_string(),
        })
    }

    /// Splits at the midpoint of the ciphertext.
    pub fn split_even(&self) -> Option<PayloadPair> {
        self.split(self.ciphertext_b64.len() / 2)
    }
}

/// The two strings printed into the matrix code and the linear code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadPair {
    /// `<hex-salt>|<part A>`.
    pub matrix: String,
    /// `<part B>`.
    pub linear: String,
}
