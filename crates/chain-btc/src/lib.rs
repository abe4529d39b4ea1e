//! Bitcoin chain support for the wallet core.
//!
//! Provides P2PKH (Base58Check) address encoding, address-format recognition,
//! largest-first UTXO selection, and legacy P2PKH transaction assembly and
//! signing.

pub mod address;
pub mod error;
pub mod network;
pub mod transaction;
pub mod utxo;
