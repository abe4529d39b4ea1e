use bitcoin::absolute::LockTime;
use bitcoin::hashes::Hash;
use bitcoin::script::ScriptBuf;
use bitcoin::secp256k1::{Message, PublicKey, Secp256k1, SecretKey};
use bitcoin::sighash::{EcdsaSighashType, SighashCache};
use bitcoin::transaction::Version;
use bitcoin::{Amount, OutPoint, Sequence, Transaction, TxIn, TxOut, Txid, Witness};
use crypto_utils::hash::hash160;

use crate::address::{address_to_pubkey_hash, destination_script, p2pkh_script, require_network};
use crate::error::BtcError;
use crate::network::BtcNetwork;
use crate::utxo::UtxoSelection;

/// Outputs at or below this value are uneconomical to spend and are folded
/// into the fee instead of being created.
pub const DUST_THRESHOLD_SAT: u64 = 546;

/// An unsigned legacy P2PKH transaction ready for signing.
#[derive(Debug, Clone)]
pub struct UnsignedP2pkhTx {
    /// The transaction with empty scriptSigs.
    pub tx: Transaction,
    /// Fee actually paid: inputs minus outputs (includes dropped dust change).
    pub fee_sat: u64,
    /// Value of the change output, or 0 when no change output was added.
    pub change_sat: u64,
}

/// A fully signed transaction.
#[derive(Debug, Clone)]
pub struct SignedTransaction {
    pub tx_hex: String,
    pub txid: String,
    pub size: usize,
}

/// Assemble a transaction spending `selection` to `destination`.
///
/// A change output back to `change_address` is added only when
/// `total - amount - fee > 546` sat; otherwise the remainder goes to the fee.
/// All inputs are assumed to be locked to `change_address` (single-address
/// wallet), which must be P2PKH.
pub fn build_p2pkh_transaction(
    selection: &UtxoSelection,
    destination: &str,
    amount_sat: u64,
    change_address: &str,
    network: BtcNetwork,
) -> Result<UnsignedP2pkhTx, BtcError> {
    if amount_sat == 0 {
        return Err(BtcError::InvalidAmount("amount must be positive".into()));
    }
    if selection.target_sat != amount_sat {
        return Err(BtcError::TransactionBuildError(format!(
            "selection covers {} sat, transaction sends {} sat",
            selection.target_sat, amount_sat
        )));
    }

    let destination_spk = destination_script(destination, network)?;
    require_network(change_address, network)?;
    let change_hash = address_to_pubkey_hash(change_address)?;

    let mut inputs = Vec::with_capacity(selection.selected.len());
    for utxo in &selection.selected {
        let txid: Txid = utxo
            .txid
            .parse()
            .map_err(|e| BtcError::TransactionBuildError(format!("invalid txid: {e}")))?;

        inputs.push(TxIn {
            previous_output: OutPoint::new(txid, utxo.vout),
            script_sig: ScriptBuf::new(),
            sequence: Sequence::ENABLE_LOCKTIME_NO_RBF,
            witness: Witness::default(),
        });
    }

    let change_sat = selection
        .total_sat
        .checked_sub(amount_sat + selection.fee_sat)
        .ok_or(BtcError::InsufficientFunds {
            available: selection.total_sat,
            required: amount_sat + selection.fee_sat,
        })?;

    let mut outputs = vec![TxOut {
        value: Amount::from_sat(amount_sat),
        script_pubkey: destination_spk,
    }];

    let change_sat = if change_sat > DUST_THRESHOLD_SAT {
        outputs.push(TxOut {
            value: Amount::from_sat(change_sat),
            script_pubkey: p2pkh_script(&change_hash),
        });
        change_sat
    } else {
        0
    };

    let tx = Transaction {
        version: Version::TWO,
        lock_time: LockTime::ZERO,
        input: inputs,
        output: outputs,
    };

    Ok(UnsignedP2pkhTx {
        tx,
        fee_sat: selection.total_sat - amount_sat - change_sat,
        change_sat,
    })
}

/// Sign every input of `unsigned_tx` with one private key.
///
/// Legacy sighash with `SIGHASH_ALL`; each scriptSig is
/// `<DER signature + 0x01> <33-byte compressed pubkey>`.
pub fn sign_transaction(
    unsigned_tx: &UnsignedP2pkhTx,
    private_key: &[u8; 32],
) -> Result<SignedTransaction, BtcError> {
    let secp = Secp256k1::new();
    let secret_key = SecretKey::from_slice(private_key)
        .map_err(|e| BtcError::InvalidPrivateKey(format!("invalid secret key: {e}")))?;
    let public_key = PublicKey::from_secret_key(&secp, &secret_key);
    let pubkey_bytes = public_key.serialize();
    let script_code = p2pkh_script(&hash160(&pubkey_bytes));

    let sighash_cache = SighashCache::new(&unsigned_tx.tx);
    let mut signed_tx = unsigned_tx.tx.clone();

    for input_index in 0..signed_tx.input.len() {
        let sighash = sighash_cache
            .legacy_signature_hash(input_index, &script_code, EcdsaSighashType::All.to_u32())
            .map_err(|e| BtcError::SigningError(format!("sighash computation failed: {e}")))?;

        let msg = Message::from_digest(sighash.to_byte_array());
        let signature = secp.sign_ecdsa(&msg, &secret_key);
        secp.verify_ecdsa(&msg, &signature, &public_key)
            .map_err(|e| BtcError::SigningError(format!("signature self-check failed: {e}")))?;

        let mut sig_bytes = signature.serialize_der().to_vec();
        sig_bytes.push(EcdsaSighashType::All as u8);

        let mut script_sig = Vec::with_capacity(sig_bytes.len() + pubkey_bytes.len() + 2);
        script_sig.push(sig_bytes.len() as u8);
        script_sig.extend_from_slice(&sig_bytes);
        script_sig.push(pubkey_bytes.len() as u8);
        script_sig.extend_from_slice(&pubkey_bytes);

        signed_tx.input[input_index].script_sig = ScriptBuf::from(script_sig);
    }

    let raw = bitcoin::consensus::serialize(&signed_tx);
    Ok(SignedTransaction {
        tx_hex: hex::encode(&raw),
        txid: signed_tx.compute_txid().to_string(),
        size: raw.len(),
    })
}
