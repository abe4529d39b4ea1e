use bitcoin::address::{Address, NetworkUnchecked};
use bitcoin::hashes::Hash;
use bitcoin::{PubkeyHash, ScriptBuf};
use crypto_utils::hash::{base58check_decode, base58check_encode, hash160};

use crate::error::BtcError;
use crate::network::BtcNetwork;

/// Script template an address commits to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressKind {
    P2pkh,
    P2sh,
    /// Native SegWit (bech32/bech32m). Recognized only; never signed for.
    Segwit,
}

/// Result of decoding an address string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressInfo {
    pub network: BtcNetwork,
    pub kind: AddressKind,
}

/// Derive a P2PKH (legacy Base58Check) address from a compressed public key.
///
/// Steps:
/// 1. HASH160(pubkey) -> 20-byte pubkey hash
/// 2. Prepend the network's P2PKH version byte (0x00 / 0x6f)
/// 3. Base58Check encode (4-byte double-SHA256 checksum)
pub fn pubkey_to_p2pkh_address(
    pubkey_bytes: &[u8; 33],
    network: BtcNetwork,
) -> Result<String, BtcError> {
    if pubkey_bytes[0] != 0x02 && pubkey_bytes[0] != 0x03 {
        return Err(BtcError::InvalidPublicKey(
            "compressed key must start with 0x02 or 0x03".into(),
        ));
    }

    let mut payload = Vec::with_capacity(21);
    payload.push(network.p2pkh_version());
    payload.extend_from_slice(&hash160(pubkey_bytes));

    Ok(base58check_encode(&payload))
}

/// Identify the network and script kind of an address.
///
/// Base58Check addresses are identified by version byte; SegWit addresses
/// by their human-readable prefix after checksum validation.
pub fn decode_address(address: &str) -> Result<AddressInfo, BtcError> {
    let lower = address.to_ascii_lowercase();
    for network in [BtcNetwork::Mainnet, BtcNetwork::Testnet] {
        if lower.starts_with(&format!("{}1", network.bech32_hrp())) {
            address
                .parse::<Address<NetworkUnchecked>>()
                .map_err(|e| BtcError::InvalidAddress(format!("invalid bech32 address: {e}")))?;
            return Ok(AddressInfo {
                network,
                kind: AddressKind::Segwit,
            });
        }
    }

    let payload = base58check_decode(address)
        .map_err(|e| BtcError::InvalidAddress(e.to_string()))?;
    if payload.len() != 21 {
        return Err(BtcError::InvalidAddress(format!(
            "expected 21-byte payload, got {}",
            payload.len()
        )));
    }

    let version = payload[0];
    for network in [BtcNetwork::Mainnet, BtcNetwork::Testnet] {
        if version == network.p2pkh_version() {
            return Ok(AddressInfo { network, kind: AddressKind::P2pkh });
        }
        if version == network.p2sh_version() {
            return Ok(AddressInfo { network, kind: AddressKind::P2sh });
        }
    }
    Err(BtcError::InvalidAddress(format!("unknown version byte 0x{version:02x}")))
}

/// Network of an address, or `None` if it cannot be decoded.
pub fn address_network(address: &str) -> Option<BtcNetwork> {
    decode_address(address).ok().map(|info| info.network)
}

/// Validate a Bitcoin address string for the given network.
///
/// Returns `true` if the address is valid for the specified network,
/// `false` if it is valid but for a different network.
pub fn validate_address(address: &str, network: BtcNetwork) -> Result<bool, BtcError> {
    Ok(decode_address(address)?.network == network)
}

/// Fail with `NetworkMismatch` unless `address` belongs to `network`.
pub fn require_network(address: &str, network: BtcNetwork) -> Result<AddressInfo, BtcError> {
    let info = decode_address(address)?;
    if info.network != network {
        return Err(BtcError::NetworkMismatch {
            expected: network,
            found: info.network,
        });
    }
    Ok(info)
}

/// Extract the 20-byte pubkey hash from a P2PKH address.
pub fn address_to_pubkey_hash(address: &str) -> Result<[u8; 20], BtcError> {
    let info = decode_address(address)?;
    if info.kind != AddressKind::P2pkh {
        return Err(BtcError::InvalidAddress(format!(
            "{address} is not a P2PKH address"
        )));
    }
    let payload = base58check_decode(address)
        .map_err(|e| BtcError::InvalidAddress(e.to_string()))?;
    let mut hash = [0u8; 20];
    hash.copy_from_slice(&payload[1..21]);
    Ok(hash)
}

/// P2PKH scriptPubKey: OP_DUP OP_HASH160 <hash> OP_EQUALVERIFY OP_CHECKSIG
pub fn p2pkh_script(pubkey_hash: &[u8; 20]) -> ScriptBuf {
    ScriptBuf::new_p2pkh(&PubkeyHash::from_byte_array(*pubkey_hash))
}

/// Locking script for any standard destination address on `network`.
///
/// Destinations may be any recognized template; only P2PKH is ever spent.
pub fn destination_script(address: &str, network: BtcNetwork) -> Result<ScriptBuf, BtcError> {
    require_network(address, network)?;
    let parsed = address
        .parse::<Address<NetworkUnchecked>>()
        .map_err(|e| BtcError::InvalidAddress(format!("failed to parse address: {e}")))?
        .require_network(network.to_bitcoin_network())
        .map_err(|e| BtcError::InvalidAddress(format!("address wrong network: {e}")))?;
    Ok(parsed.script_pubkey())
}
