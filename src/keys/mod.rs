//! Master key material.
//!
//! The master key is assembled once at startup and handed to the session
//! context, which owns it for the lifetime of the process. Assembly is
//! fail-closed: any provider failure leaves the scanner without a key and
//! decryption permanently disabled.

mod material;

pub use material::{
    AssemblyError, FnFragment, FragmentError, FragmentProvider, FragmentSource, KeyMaterial,
    MasterKey, FRAGMENT_COUNT,
};
