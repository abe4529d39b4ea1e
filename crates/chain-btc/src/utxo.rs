use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::BtcError;

/// Estimated size of a signed P2PKH input (bytes).
pub const P2PKH_INPUT_BYTES: u64 = 148;

/// Estimated size of a P2PKH output (bytes).
pub const P2PKH_OUTPUT_BYTES: u64 = 34;

/// Fixed transaction overhead: version, locktime, input/output counts.
pub const TX_OVERHEAD_BYTES: u64 = 10;

/// Outputs assumed while selecting: destination plus a possible change output.
pub const ASSUMED_OUTPUTS: usize = 2;

/// A single unspent transaction output (UTXO).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utxo {
    /// Transaction ID as a hex string (display order).
    pub txid: String,
    /// Output index within the transaction.
    pub vout: u32,
    /// Value in satoshis.
    pub value: u64,
    /// Whether the funding transaction is confirmed.
    pub confirmed: bool,
}

/// Result of UTXO selection.
#[derive(Debug, Clone)]
pub struct UtxoSelection {
    /// The selected UTXOs, largest first.
    pub selected: Vec<Utxo>,
    /// Total value of the selected UTXOs in satoshis.
    pub total_sat: u64,
    /// Amount the selection has to cover, excluding fee.
    pub target_sat: u64,
    /// Fee estimated for `selected.len()` inputs and two outputs.
    pub fee_sat: u64,
}

impl UtxoSelection {
    /// Value left after paying `target_sat + fee_sat`.
    pub fn excess_sat(&self) -> u64 {
        self.total_sat - self.target_sat - self.fee_sat
    }
}

/// Estimate the fee for a legacy P2PKH transaction.
///
/// `ceil((inputs*148 + outputs*34 + 10) * fee_rate)`, with `fee_rate` in
/// sat/vByte (equal to sat/byte for non-witness transactions).
pub fn estimate_fee(num_inputs: usize, num_outputs: usize, fee_rate_sat_vbyte: f64) -> u64 {
    let size = TX_OVERHEAD_BYTES
        + (num_inputs as u64 * P2PKH_INPUT_BYTES)
        + (num_outputs as u64 * P2PKH_OUTPUT_BYTES);
    (size as f64 * fee_rate_sat_vbyte).ceil() as u64
}

/// Select UTXOs to cover `target_sat` plus estimated fees.
///
/// Largest-first: UTXOs are sorted by value descending and accumulated until
/// `total >= target + fee(n)`. Fails with `NoUtxos` on an empty set and with
/// `InsufficientFunds` when every UTXO is used without reaching the threshold.
pub fn select_utxos(
    utxos: &[Utxo],
    target_sat: u64,
    fee_rate_sat_vbyte: f64,
) -> Result<UtxoSelection, BtcError> {
    if !fee_rate_sat_vbyte.is_finite() || fee_rate_sat_vbyte < 0.0 {
        return Err(BtcError::InvalidFeeRate(fee_rate_sat_vbyte));
    }
    if utxos.is_empty() {
        return Err(BtcError::NoUtxos);
    }

    let mut sorted: Vec<&Utxo> = utxos.iter().collect();
    sorted.sort_by(|a, b| b.value.cmp(&a.value));

    let mut selected: Vec<Utxo> = Vec::new();
    let mut total_sat: u64 = 0;
    let mut fee_sat: u64 = 0;

    for utxo in sorted {
        selected.push(utxo.clone());
        total_sat = total_sat.saturating_add(utxo.value);

        fee_sat = estimate_fee(selected.len(), ASSUMED_OUTPUTS, fee_rate_sat_vbyte);
        if total_sat >= target_sat.saturating_add(fee_sat) {
            debug!(
                inputs = selected.len(),
                total_sat, target_sat, fee_sat, "UTXO selection satisfied"
            );
            return Ok(UtxoSelection {
                selected,
                total_sat,
                target_sat,
                fee_sat,
            });
        }
    }

    Err(BtcError::InsufficientFunds {
        available: total_sat,
        required: target_sat.saturating_add(fee_sat),
    })
}
