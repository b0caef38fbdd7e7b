//! Key derivation and AES-128-CBC decryption of fused payloads.
//!
//! # Scheme
//!
//! ```text
//! key        = PBKDF2-HMAC-SHA1(password = master key, salt, 1000 rounds, 16 bytes)
//! plaintext  = AES-128-CBC-Decrypt(key, iv = salt, ciphertext), PKCS#7 unpadded
//! ```
//!
//! The salt doubling as the IV is a wire compatibility constraint. It is a
//! known weakness (the IV should be independent of the derivation salt) and
//! is kept so existing printed codes still decrypt.
//!
//! There is no MAC. The only acceptance check is that the plaintext is
//! valid UTF-8 of at least [`MIN_SECRET_LEN`] UTF-16 code units, a heuristic
//! that filters most wrong-key and wrong-order attempts.

use super::payload::{HybridPayload, Salt, SealedPayload, BASE64, BLOCK_LEN};
use crate::keys::MasterKey;
use aes::Aes128;
use base64::Engine as _;
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use sha1::Sha1;
use thiserror::Error;
use zeroize::Zeroizing;

type Aes128CbcDec = cbc::Decryptor<Aes128>;
type Aes128CbcEnc = cbc::Encryptor<Aes128>;

/// PBKDF2 iteration count.
pub const PBKDF2_ROUNDS: u32 = 1000;

/// Derived key length in bytes (four 32-bit words).
pub const KEY_LEN: usize = 16;

/// Shortest plaintext accepted as a secret, in UTF-16 code units.
pub const MIN_SECRET_LEN: usize = 4;

/// Why a fused pair did not yield a secret.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecryptError {
    /// The master key was never assembled.
    #[error("master key unavailable")]
    KeyUnavailable,
    /// The pair does not parse into salt and ciphertext.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
    /// Decryption ran but the result is not an acceptable secret.
    #[error("invalid plaintext: {0}")]
    InvalidPlaintext(String),
}

/// Errors on the sealing side.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SealError {
    /// Shorter than [`MIN_SECRET_LEN`] UTF-16 code units.
    #[error("secret must be at least {} characters", MIN_SECRET_LEN)]
    SecretTooShort,
    /// The block cipher refused the key, IV or buffer.
    #[error("cipher failure: {0}")]
    Cipher(String),
}

/// Derives the AES key for one payload.
pub fn derive_key(master: &MasterKey, salt: &Salt) -> Zeroizing<[u8; KEY_LEN]> {
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    pbkdf2::pbkdf2_hmac::<Sha1>(master.as_bytes(), salt.as_bytes(), PBKDF2_ROUNDS, &mut key[..]);
    key
}

/// Decrypts a matrix payload and linear payload into the sealed secret.
///
/// Pure function of its inputs. Every parse, padding or encoding failure
/// comes back as a [`DecryptError`].
pub fn decrypt(matrix: &str, linear: &str, master: &MasterKey) -> Result<String, DecryptError> {
    let payload = HybridPayload::parse(matrix, linear)?;
    decrypt_payload(&payload, master)
}

/// Decrypts an already parsed payload.
pub fn decrypt_payload(payload: &HybridPayload, master: &MasterKey) -> Result<String, DecryptError> {
    let key = derive_key(master, payload.salt());

    let mut buffer = Zeroizing::new(payload.ciphertext().to_vec());
    let cipher = Aes128CbcDec::new_from_slices(&key[..], payload.salt().as_bytes())
        .map_err(|e| DecryptError::MalformedPayload(e.to_string()))?;
    let plain = cipher
        .decrypt_padded_mut::<Pkcs7>(&mut buffer[..])
        .map_err(|_| DecryptError::InvalidPlaintext("bad padding".into()))?;

    let text = std::str::from_utf8(plain)
        .map_err(|_| DecryptError::InvalidPlaintext("not utf-8".into()))?;

    let units = text.encode_utf16().count();
    if units < MIN_SECRET_LEN {
        return Err(DecryptError::InvalidPlaintext(format!(
            "{} characters, need at least {}",
            units, MIN_SECRET_LEN
        )));
    }

    Ok(text.to_string())
}

/// Encrypts a secret under the same scheme `decrypt` reverses.
///
/// The result still has to be split across the two codes with
/// [`SealedPayload::split`].
pub fn seal(master: &MasterKey, salt: Salt, secret: &str) -> Result<SealedPayload, SealError> {
    if secret.encode_utf16().count() < MIN_SECRET_LEN {
        return Err(SealError::SecretTooShort);
    }

    let key = derive_key(master, &salt);
    let message = secret.as_bytes();

    // PKCS#7 always adds between 1 and BLOCK_LEN bytes.
    let mut buffer = Zeroizing::new(vec![0u8; message.len() + BLOCK_LEN]);
    buffer[..message.len()].copy_from_slice(message);

    let cipher = Aes128CbcEnc::new_from_slices(&key[..], salt.as_bytes())
        .map_err(|e| SealError::Cipher(e.to_string()))?;
    let ciphertext = cipher
        .encrypt_padded_mut::<Pkcs7>(&mut buffer[..], message.len())
        .map_err(|_| SealError::Cipher("padding buffer too small".into()))?;

    Ok(SealedPayload::new(salt, BASE64.encode(ciphertext)))
}
