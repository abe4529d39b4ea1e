//! # crypto-utils
//!
//! Hashing, Base58Check, entropy, and zeroizing secret buffers shared by the
//! wallet crates.

pub mod entropy;
pub mod error;
pub mod hash;
pub mod secret;

pub use error::CryptoError;
pub use secret::{SecretKeyBytes, SecretPhrase};
