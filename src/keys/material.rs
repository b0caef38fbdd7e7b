//! Master key assembly from fragment providers.
//!
//! The master key is the PBKDF2 password for every decrypt attempt. It is
//! stitched together from four fragments, always in slot order 1, 2, 3, 4.
//! The order is part of the key derivation contract: reordering the
//! fragments produces a different key and every payload stops decrypting.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Number of fragments that make up the master key.
pub const FRAGMENT_COUNT: usize = 4;

/// Failure reported by a single fragment provider.
#[derive(Debug, Clone, Error)]
pub enum FragmentError {
    /// The named environment variable is unset or not unicode.
    #[error("environment variable {0} is not set")]
    MissingEnv(String),
    /// The fragment file could not be read.
    #[error("failed to read fragment file {path}: {reason}")]
    FileRead {
        /// Path as configured.
        path: String,
        /// I/O error text.
        reason: String,
    },
    /// Any other provider failure.
    #[error("{0}")]
    Other(String),
}

/// Master key assembly failure.
///
/// Fatal to the crypto capability: a session holding this error never
/// attempts a decryption.
#[derive(Debug, Clone, Error)]
pub enum AssemblyError {
    /// A provider failed; assembly stopped there.
    #[error("fragment provider {slot} failed: {source}")]
    Provider {
        /// 1-based slot of the failing provider.
        slot: usize,
        /// The provider's own error.
        #[source]
        source: FragmentError,
    },
    /// Every provider succeeded but the fragments joined to nothing.
    #[error("assembled master key is empty")]
    Empty,
}

/// Supplies one fragment of the master key.
pub trait FragmentProvider {
    /// Produces the fragment. Called exactly once per assembly.
    fn fragment(&self) -> Result<String, FragmentError>;
}

/// Adapts a closure into a [`FragmentProvider`].
pub struct FnFragment<F>(pub F);

impl<F> FragmentProvider for FnFragment<F>
where
    F: Fn() -> Result<String, FragmentError>,
{
    fn fragment(&self) -> Result<String, FragmentError> {
        (self.0)()
    }
}

/// Declarative fragment source, as written in the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FragmentSource {
    /// Read from an environment variable.
    Env(String),
    /// Read from a file; one trailing newline is stripped.
    File(PathBuf),
    /// Inline value. Only sensible for tests and demos.
    Literal(String),
}

impl FragmentProvider for FragmentSource {
    fn fragment(&self) -> Result<String, FragmentError> {
        match self {
            FragmentSource::Env(var) => {
                std::env::var(var).map_err(|_| FragmentError::MissingEnv(var.clone()))
            }
            FragmentSource::File(path) => {
                let mut text =
                    std::fs::read_to_string(path).map_err(|e| FragmentError::FileRead {
                        path: path.display().to_string(),
                        reason: e.to_string(),
                    })?;
                if text.ends_with('\n') {
                    text.pop();
                    if text.ends_with('\r') {
                        text.pop();
                    }
                }
                Ok(text)
            }
            FragmentSource::Literal(value) => Ok(value.clone()),
        }
    }
}

/// The assembled master secret. Immutable, wiped on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct MasterKey {
    bytes: Vec<u8>,
}

impl MasterKey {
    /// Wraps raw key material.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Key bytes as fed to PBKDF2.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Length in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns true when the key has no bytes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Short BLAKE3 fingerprint, safe to log.
    pub fn fingerprint(&self) -> String {
        hex::encode(&blake3::hash(&self.bytes).as_bytes()[..4])
    }
}

impl std::fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MasterKey")
            .field("len", &self.bytes.len())
            .finish_non_exhaustive()
    }
}

/// Assembles the master key from exactly four providers.
pub struct KeyMaterial;

impl KeyMaterial {
    /// Invokes each provider once, in slot order, and concatenates the
    /// results.
    ///
    /// The first failing provider aborts assembly; fragments already read
    /// are wiped and no partial key escapes.
    pub fn assemble(
        providers: [&dyn FragmentProvider; FRAGMENT_COUNT],
    ) -> Result<MasterKey, AssemblyError> {
        let mut joined = String::new();

        for (index, provider) in providers.iter().enumerate() {
            match provider.fragment() {
                Ok(mut fragment) => {
                    joined.push_str(&fragment);
                    fragment.zeroize();
                }
                Err(source) => {
                    joined.zeroize();
                    let slot = index + 1;
                    tracing::warn!(slot, error = %source, "Master key fragment unavailable");
                    return Err(AssemblyError::Provider { slot, source });
                }
            }
        }

        if joined.is_empty() {
            tracing::warn!("Master key assembled empty; decryption disabled");
            return Err(AssemblyError::Empty);
        }

        let key = MasterKey::from_bytes(joined.into_bytes());
        tracing::info!(fingerprint = %key.fingerprint(), "Master key assembled");
        Ok(key)
    }

    /// Assembles from declarative sources, as loaded from configuration.
    pub fn from_sources(sources: &[FragmentSource; FRAGMENT_COUNT]) -> Result<MasterKey, AssemblyError> {
        let [a, b, c, d] = sources;
        Self::assemble([a, b, c, d])
    }
}
