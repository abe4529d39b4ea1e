//! Building, signing and broadcasting a spend from a single P2PKH address.

use std::fmt;

use chain_btc::address::{pubkey_to_p2pkh_address, require_network};
use chain_btc::network::BtcNetwork;
use chain_btc::transaction::{build_p2pkh_transaction, sign_transaction, DUST_THRESHOLD_SAT};
use chain_btc::utxo::{select_utxos, Utxo};
use chain_data::{ChainDataSource, Freshness, GatewayError};
use crypto_utils::secret::SecretPhrase;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::WalletError;
use crate::hd_derivation::{derive_key_pair, KeyPair};

pub const SATS_PER_BTC: u64 = 100_000_000;

/// Total supply cap.
pub const MAX_BTC: f64 = 21_000_000.0;

/// Convert a BTC amount to satoshis, rounding to the nearest satoshi.
pub fn btc_to_sat(amount_btc: f64) -> Result<u64, WalletError> {
    if !amount_btc.is_finite() || amount_btc <= 0.0 {
        return Err(WalletError::InvalidAmount(format!("{amount_btc} BTC must be positive")));
    }
    if amount_btc > MAX_BTC {
        return Err(WalletError::InvalidAmount(format!("{amount_btc} BTC exceeds supply")));
    }
    Ok((amount_btc * SATS_PER_BTC as f64).round() as u64)
}

pub fn sat_to_btc(sat: u64) -> f64 {
    sat as f64 / SATS_PER_BTC as f64
}

/// Progress of a send, logged at every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SendStage {
    Validated,
    UtxosSelected,
    FeeComputed,
    Assembled,
    Signed,
    Broadcast,
    Pending,
}

impl fmt::Display for SendStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SendStage::Validated => "validated",
            SendStage::UtxosSelected => "utxos_selected",
            SendStage::FeeComputed => "fee_computed",
            SendStage::Assembled => "assembled",
            SendStage::Signed => "signed",
            SendStage::Broadcast => "broadcast",
            SendStage::Pending => "pending",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
pub struct SendRequest {
    pub mnemonic: SecretString,
    pub derivation_path: String,
    /// Address the funds are spent from; change returns here.
    pub source_address: String,
    pub destination: String,
    pub amount_btc: f64,
    /// sat/vB
    pub fee_rate: f64,
}

/// A signed transaction that has not been broadcast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignedSend {
    pub tx_hex: String,
    pub txid: String,
    pub amount_sat: u64,
    pub fee_sat: u64,
    /// 0 when the remainder was dust and went to the fee.
    pub change_sat: u64,
    pub inputs: Vec<Utxo>,
    pub size: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendReceipt {
    pub txid: String,
    pub stage: SendStage,
    pub amount_sat: u64,
    pub fee_sat: u64,
    pub change_sat: u64,
    /// The broadcast outcome was unclear and a status lookup found the
    /// transaction.
    pub resolved_by_lookup: bool,
}

fn enter(stage: SendStage) {
    info!(%stage, "send stage");
}

/// Validate `request`, derive its key and fetch UTXOs from `source`, then
/// assemble and sign. Nothing is broadcast.
///
/// Change goes back to `source_address`. This reuses the address and links
/// the change output to the sender.
pub async fn build_and_sign<S>(source: &S, request: &SendRequest) -> Result<SignedSend, WalletError>
where
    S: ChainDataSource + ?Sized,
{
    let network = source.network();
    let (amount_sat, key) = validate(request, network)?;

    let utxos = source.utxos(&request.source_address).await;
    if utxos.freshness == Freshness::Fallback {
        return Err(WalletError::ChainDataUnavailable(
            "no provider returned UTXOs for the source address".into(),
        ));
    }
    if utxos.freshness == Freshness::Stale {
        warn!(address = %request.source_address, "signing against stale UTXO set");
    }

    assemble_and_sign(request, network, amount_sat, &key, &utxos.value)
}

/// [`build_and_sign`] against a UTXO set the caller already holds.
pub fn build_and_sign_with_utxos(
    request: &SendRequest,
    network: BtcNetwork,
    utxos: &[Utxo],
) -> Result<SignedSend, WalletError> {
    let (amount_sat, key) = validate(request, network)?;
    assemble_and_sign(request, network, amount_sat, &key, utxos)
}

/// Build, sign and broadcast.
///
/// A rejected broadcast is returned as [`WalletError::BroadcastFailed`] with
/// the provider's message, as is a broadcast no provider could be reached
/// for. When the outcome is unknown (timeout or a failure
/// after the request went out) the transaction's status is looked up once:
/// if a provider knows the txid the send counts as pending, otherwise
/// [`WalletError::BroadcastUnknown`] is returned and the caller must not
/// resend blindly.
pub async fn send<S>(source: &S, request: &SendRequest) -> Result<SendReceipt, WalletError>
where
    S: ChainDataSource + ?Sized,
{
    let signed = build_and_sign(source, request).await?;

    let resolved_by_lookup = match source.broadcast(&signed.tx_hex).await {
        Ok(txid) => {
            if txid != signed.txid {
                warn!(expected = %signed.txid, reported = %txid, "provider reported a different txid");
            }
            false
        }
        Err(GatewayError::BroadcastUnknown(reason)) => {
            warn!(txid = %signed.txid, %reason, "broadcast outcome unknown, checking status");
            match source.tx_status(&signed.txid).await {
                Ok(Some(_)) => true,
                Ok(None) => {
                    return Err(WalletError::BroadcastUnknown {
                        txid: signed.txid,
                        reason,
                    })
                }
                Err(lookup) => {
                    return Err(WalletError::BroadcastUnknown {
                        txid: signed.txid,
                        reason: format!("{reason}; status lookup failed: {lookup}"),
                    })
                }
            }
        }
        Err(GatewayError::BroadcastRejected { message, .. }) => {
            return Err(WalletError::BroadcastFailed(message))
        }
        // Nothing was delivered (every provider refused the connection, or
        // the hex was refused before sending).
        Err(e) => return Err(WalletError::BroadcastFailed(e.to_string())),
    };
    enter(SendStage::Broadcast);
    enter(SendStage::Pending);

    Ok(SendReceipt {
        txid: signed.txid,
        stage: SendStage::Pending,
        amount_sat: signed.amount_sat,
        fee_sat: signed.fee_sat,
        change_sat: signed.change_sat,
        resolved_by_lookup,
    })
}

fn validate(request: &SendRequest, network: BtcNetwork) -> Result<(u64, KeyPair), WalletError> {
    let amount_sat = btc_to_sat(request.amount_btc)?;
    if amount_sat <= DUST_THRESHOLD_SAT {
        return Err(WalletError::InvalidAmount(format!(
            "{amount_sat} sat is at or below the {DUST_THRESHOLD_SAT} sat dust threshold"
        )));
    }
    if !request.fee_rate.is_finite() || request.fee_rate <= 0.0 {
        return Err(WalletError::InvalidAmount(format!(
            "fee rate {} sat/vB must be positive",
            request.fee_rate
        )));
    }
    require_network(&request.destination, network)?;
    require_network(&request.source_address, network)?;

    let phrase = SecretPhrase::new(request.mnemonic.expose_secret());
    let key = derive_key_pair(&phrase, &request.derivation_path)?;
    let derived = pubkey_to_p2pkh_address(&key.public_key, network)?;
    if derived != request.source_address {
        return Err(WalletError::AddressMismatch {
            expected: request.source_address.clone(),
            derived,
        });
    }

    enter(SendStage::Validated);
    Ok((amount_sat, key))
}

fn assemble_and_sign(
    request: &SendRequest,
    network: BtcNetwork,
    amount_sat: u64,
    key: &KeyPair,
    utxos: &[Utxo],
) -> Result<SignedSend, WalletError> {
    let selection = select_utxos(utxos, amount_sat, request.fee_rate)?;
    enter(SendStage::UtxosSelected);
    info!(
        inputs = selection.selected.len(),
        estimated_fee_sat = selection.fee_sat,
        "fee computed"
    );
    enter(SendStage::FeeComputed);

    let unsigned = build_p2pkh_transaction(
        &selection,
        &request.destination,
        amount_sat,
        &request.source_address,
        network,
    )?;
    enter(SendStage::Assembled);

    let signed = sign_transaction(&unsigned, key.private_key.expose())
        .map_err(|e| WalletError::SigningFailed(e.to_string()))?;
    enter(SendStage::Signed);

    Ok(SignedSend {
        tx_hex: signed.tx_hex,
        txid: signed.txid,
        amount_sat,
        fee_sat: unsigned.fee_sat,
        change_sat: unsigned.change_sat,
        inputs: selection.selected,
        size: signed.size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::derive_address;

    const TEST_MNEMONIC: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";
    const PATH: &str = "m/44'/1'/0'/0/0";

    fn source_address() -> String {
        derive_address(TEST_MNEMONIC, PATH, BtcNetwork::Testnet).unwrap()
    }

    fn destination() -> String {
        derive_address(TEST_MNEMONIC, "m/44'/1'/0'/0/1", BtcNetwork::Testnet).unwrap()
    }

    fn request(amount_btc: f64) -> SendRequest {
        SendRequest {
            mnemonic: SecretString::from(TEST_MNEMONIC.to_string()),
            derivation_path: PATH.into(),
            source_address: source_address(),
            destination: destination(),
            amount_btc,
            fee_rate: 10.0,
        }
    }

    fn utxos() -> Vec<Utxo> {
        vec![
            Utxo { txid: "11".repeat(32), vout: 0, value: 100_000, confirmed: true },
            Utxo { txid: "22".repeat(32), vout: 1, value: 50_000, confirmed: true },
        ]
    }

    #[test]
    fn btc_to_sat_conversion() {
        assert_eq!(btc_to_sat(0.0012).unwrap(), 120_000);
        assert_eq!(btc_to_sat(1.0).unwrap(), 100_000_000);
        assert_eq!(btc_to_sat(0.1 + 0.2).unwrap(), 30_000_000);
        assert!(btc_to_sat(0.0).is_err());
        assert!(btc_to_sat(-1.0).is_err());
        assert!(btc_to_sat(f64::NAN).is_err());
        assert!(btc_to_sat(f64::INFINITY).is_err());
        assert!(btc_to_sat(21_000_001.0).is_err());
    }

    #[test]
    fn signs_worked_example() {
        let signed = build_and_sign_with_utxos(&request(0.0012), BtcNetwork::Testnet, &utxos()).unwrap();
        assert_eq!(signed.amount_sat, 120_000);
        assert_eq!(signed.fee_sat, 3_740);
        assert_eq!(signed.change_sat, 26_260);
        assert_eq!(signed.inputs.len(), 2);
        assert_eq!(signed.txid.len(), 64);
        assert!(hex::decode(&signed.tx_hex).is_ok());
    }

    #[test]
    fn deterministic_signature() {
        let a = build_and_sign_with_utxos(&request(0.0012), BtcNetwork::Testnet, &utxos()).unwrap();
        let b = build_and_sign_with_utxos(&request(0.0012), BtcNetwork::Testnet, &utxos()).unwrap();
        assert_eq!(a.tx_hex, b.tx_hex);
    }

    #[test]
    fn dust_amount_rejected() {
        let err = build_and_sign_with_utxos(&request(0.00000546), BtcNetwork::Testnet, &utxos());
        assert!(matches!(err, Err(WalletError::InvalidAmount(_))));
    }

    #[test]
    fn bad_fee_rate_rejected() {
        let mut req = request(0.001);
        req.fee_rate = 0.0;
        assert!(matches!(
            build_and_sign_with_utxos(&req, BtcNetwork::Testnet, &utxos()),
            Err(WalletError::InvalidAmount(_))
        ));
    }

    #[test]
    fn wrong_path_is_address_mismatch() {
        let mut req = request(0.001);
        req.derivation_path = "m/44'/1'/0'/0/5".into();
        match build_and_sign_with_utxos(&req, BtcNetwork::Testnet, &utxos()) {
            Err(WalletError::AddressMismatch { expected, .. }) => assert_eq!(expected, source_address()),
            other => panic!("expected AddressMismatch, got {other:?}"),
        }
    }

    #[test]
    fn mainnet_destination_rejected() {
        let mut req = request(0.001);
        req.destination = "1LqBGSKuX5yYUonjxT5qGfpUsXKYYWeabA".into();
        assert!(matches!(
            build_and_sign_with_utxos(&req, BtcNetwork::Testnet, &utxos()),
            Err(WalletError::NetworkMismatch { .. })
        ));
    }

    #[test]
    fn invalid_destination_rejected() {
        let mut req = request(0.001);
        req.destination = "not-an-address".into();
        assert!(matches!(
            build_and_sign_with_utxos(&req, BtcNetwork::Testnet, &utxos()),
            Err(WalletError::InvalidAddress(_))
        ));
    }

    #[test]
    fn invalid_mnemonic_rejected() {
        let mut req = request(0.001);
        req.mnemonic = SecretString::from("abandon abandon abandon".to_string());
        assert!(matches!(
            build_and_sign_with_utxos(&req, BtcNetwork::Testnet, &utxos()),
            Err(WalletError::InvalidMnemonic(_))
        ));
    }

    #[test]
    fn no_utxos() {
        assert!(matches!(
            build_and_sign_with_utxos(&request(0.001), BtcNetwork::Testnet, &[]),
            Err(WalletError::NoUtxos)
        ));
    }

    #[test]
    fn insufficient_funds() {
        assert!(matches!(
            build_and_sign_with_utxos(&request(0.0015), BtcNetwork::Testnet, &utxos()),
            Err(WalletError::InsufficientFunds { available: 150_000, .. })
        ));
    }

    #[test]
    fn stage_display() {
        assert_eq!(SendStage::UtxosSelected.to_string(), "utxos_selected");
        assert_eq!(serde_json::to_string(&SendStage::FeeComputed).unwrap(), "\"fee_computed\"");
    }
}
